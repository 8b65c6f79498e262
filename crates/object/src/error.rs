use thiserror::Error;

/// Recoverable object runtime failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ObjectError {
	#[error("failed to allocate object of {size} bytes")]
	AllocationFailed { size: usize },

	#[error("object type `{type_name}` holds `{expected}`, not `{found}`")]
	TypeMismatch {
		type_name: String,
		expected: &'static str,
		found: &'static str,
	},
}

/// Misuse of the runtime. Always fatal.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractViolation {
	#[error("reference delta must not be negative (got {delta})")]
	NegativeDelta { delta: isize },

	#[error("dereference delta must be at least one (got {delta})")]
	InvalidDelta { delta: isize },

	#[error("reference count dropped below zero ({count})")]
	CountBelowZero { count: isize },

	#[error("reference count overflow")]
	CountOverflow,

	#[error("autorelease called with no active pool on this thread")]
	NoActivePool,

	#[error("auto-release pool at depth {depth} freed while {active} pools are active")]
	PoolOrder { depth: usize, active: usize },
}
