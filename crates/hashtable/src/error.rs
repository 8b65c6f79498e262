use std::collections::TryReserveError;

use thiserror::Error;

/// Errors raised while growing a [`crate::Hashtable`].
#[derive(Debug, Error)]
pub enum HashtableError {
	/// The entry array would exceed the addressable index range.
	#[error("hashtable capacity overflow (requested {requested} entries)")]
	CapacityOverflow {
		/// Entry count that could not be represented.
		requested: usize,
	},

	/// Backing storage could not be allocated.
	#[error("hashtable allocation failed: {0}")]
	Allocation(#[from] TryReserveError),
}
