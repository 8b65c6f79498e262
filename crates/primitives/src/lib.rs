//! Containers and hashing helpers shared by the monitor core.
//!
//! General growable storage uses `Vec`/`VecDeque` directly; this crate only
//! adds what the standard containers do not provide: a handle-addressed
//! pointer list with stable slots, and the hash functions the hashtable
//! and live sets are keyed with.

pub mod hash;
mod pointer_list;

pub use hash::{hash_bytes, hash_str_ignore_case, hash_u32, hash_u64, str_eq_ignore_case};
pub use pointer_list::{PointerHandle, PointerList};
