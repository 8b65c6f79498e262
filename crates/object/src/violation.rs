use crate::ContractViolation;

/// Escalates a contract violation. Continuing would corrupt shared state.
#[cold]
#[track_caller]
pub(crate) fn violation(violation: ContractViolation) -> ! {
	tracing::error!(%violation, "object.contract_violation");
	panic!("object contract violation: {violation}");
}
