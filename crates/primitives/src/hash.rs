//! Hash functions for hashtable keys.
//!
//! Hashtable hash codes are 32 bits wide. Case-insensitive helpers lowercase
//! per `char` so that keys differing only by case always land in the same
//! bucket and compare equal.

use std::hash::Hasher;

use rustc_hash::FxHasher;

#[inline]
fn fold(value: u64) -> u32 {
	(value ^ (value >> 32)) as u32
}

/// Hashes an arbitrary byte string.
pub fn hash_bytes(bytes: &[u8]) -> u32 {
	let mut hasher = FxHasher::default();
	hasher.write(bytes);
	fold(hasher.finish())
}

/// Hashes a string ignoring case.
pub fn hash_str_ignore_case(s: &str) -> u32 {
	let mut hasher = FxHasher::default();
	for c in s.chars().flat_map(char::to_lowercase) {
		hasher.write_u32(c as u32);
	}
	fold(hasher.finish())
}

/// Compares two strings ignoring case, consistent with [`hash_str_ignore_case`].
pub fn str_eq_ignore_case(a: &str, b: &str) -> bool {
	if a.len() == b.len() && a.eq_ignore_ascii_case(b) {
		return true;
	}
	a.chars().flat_map(char::to_lowercase).eq(b.chars().flat_map(char::to_lowercase))
}

/// Spreads a 32-bit integer key (identifiers tend to be clustered).
#[inline]
pub fn hash_u32(mut value: u32) -> u32 {
	value ^= (value >> 20) ^ (value >> 12);
	value ^ (value >> 7) ^ (value >> 4)
}

/// Mixes a 64-bit integer key down to 32 bits.
#[inline]
pub fn hash_u64(mut value: u64) -> u32 {
	value = (!value).wrapping_add(value << 18);
	value ^= value >> 31;
	value = value.wrapping_mul(21);
	value ^= value >> 11;
	value = value.wrapping_add(value << 6);
	value ^= value >> 22;
	value as u32
}
