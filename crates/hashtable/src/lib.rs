//! Index-chained hashtable.
//!
//! Every entry lives in one contiguous array; bucket chains and the free
//! list are threaded through entry indices rather than pointers. Hashing and
//! equality are supplied by the caller as plain functions, which lets one
//! table type serve case-insensitive string keys, integer keys, or records
//! compared by any subset of their fields.

mod error;
mod table;

pub use error::HashtableError;
pub use table::{AddOutcome, DELETED_HASH, EqualsFn, HashFn, Hashtable, HashtableStats, Iter};
