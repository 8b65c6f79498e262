use thiserror::Error;
use vigil_hashtable::HashtableError;
use vigil_object::ObjectError;

/// Failure reported by an external enumeration source.
///
/// Always transient from the provider's point of view: the cycle is
/// skipped and retried on the next tick.
#[derive(Debug, Error)]
pub enum SourceError {
	#[error("enumeration failed: {0}")]
	Enumeration(String),

	#[error("unexpected source output: {0}")]
	Parse(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),
}

/// Reason a provider abandoned a cycle.
#[derive(Debug, Error)]
pub enum ProviderError {
	#[error("{provider} source failed: {source}")]
	Source {
		provider: &'static str,
		#[source]
		source: SourceError,
	},

	#[error("object allocation failed: {0}")]
	Object(#[from] ObjectError),

	#[error("live set update failed: {0}")]
	Hashtable(#[from] HashtableError),
}

impl ProviderError {
	/// Source failures are expected to clear up by themselves on a later tick.
	pub fn is_transient(&self) -> bool {
		matches!(self, Self::Source { .. })
	}
}
