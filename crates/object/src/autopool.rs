//! Thread-local auto-release pools.
//!
//! Each thread keeps a stack of pool frames. A frame tracks references in a
//! fixed inline array and spills into a lazily allocated overflow vector.

use std::cell::RefCell;
use std::marker::PhantomData;

use crate::handle::ErasedRef;
use crate::violation::violation;
use crate::{ContractViolation, ObjectPtr, Ref};

const STATIC_SIZE: usize = 64;
const DYNAMIC_INITIAL_SIZE: usize = 64;
/// Overflow storage above this capacity is released on drain.
const DYNAMIC_BIG_SIZE: usize = 256;

struct PoolFrame {
	static_items: [Option<ErasedRef>; STATIC_SIZE],
	static_count: usize,
	dynamic_items: Vec<ErasedRef>,
}

impl PoolFrame {
	fn new() -> Self {
		Self {
			static_items: [const { None }; STATIC_SIZE],
			static_count: 0,
			dynamic_items: Vec::new(),
		}
	}

	fn len(&self) -> usize {
		self.static_count + self.dynamic_items.len()
	}

	fn push(&mut self, item: ErasedRef) {
		if self.static_count < STATIC_SIZE {
			self.static_items[self.static_count] = Some(item);
			self.static_count += 1;
			return;
		}
		if self.dynamic_items.capacity() == 0 {
			self.dynamic_items.reserve_exact(DYNAMIC_INITIAL_SIZE);
		}
		self.dynamic_items.push(item);
	}

	fn pop(&mut self) -> Option<ErasedRef> {
		if let Some(item) = self.dynamic_items.pop() {
			return Some(item);
		}
		if self.static_count == 0 {
			return None;
		}
		self.static_count -= 1;
		self.static_items[self.static_count].take()
	}

	fn trim(&mut self) {
		if self.dynamic_items.capacity() > DYNAMIC_BIG_SIZE {
			self.dynamic_items = Vec::new();
		}
	}
}

thread_local! {
	static POOLS: RefCell<Vec<PoolFrame>> = const { RefCell::new(Vec::new()) };
}

/// Number of pools active on the calling thread.
pub fn pool_depth() -> usize {
	POOLS.with_borrow(Vec::len)
}

/// Scope guard for an auto-release pool.
///
/// Creating one pushes a pool onto the calling thread's stack; dropping it
/// drains the pool and pops it. Pools must be dropped in reverse creation
/// order and never leave their thread.
pub struct AutoPool {
	depth: usize,
	_not_send: PhantomData<*const ()>,
}

impl AutoPool {
	pub fn new() -> Self {
		let depth = POOLS.with_borrow_mut(|pools| {
			pools.push(PoolFrame::new());
			pools.len() - 1
		});
		tracing::trace!(depth, "object.autopool.push");
		Self {
			depth,
			_not_send: PhantomData,
		}
	}

	/// Moves `item` into this pool and borrows its body until the pool
	/// drains.
	pub fn track<T: Send + Sync + 'static>(&self, item: Ref<T>) -> &T {
		let ptr = item.as_ptr();
		let depth = self.depth;
		POOLS.with_borrow_mut(|pools| pools[depth].push(item.into_erased()));
		// SAFETY: the pool holds a reference until `drain` or drop, both of
		// which need this borrow to end.
		unsafe { ptr.as_ref() }
	}

	/// Number of references currently held.
	pub fn len(&self) -> usize {
		POOLS.with_borrow(|pools| pools[self.depth].len())
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Releases every tracked reference, keeping the pool active.
	pub fn drain(&mut self) {
		drain_frame(self.depth);
	}
}

impl Default for AutoPool {
	fn default() -> Self {
		Self::new()
	}
}

impl Drop for AutoPool {
	fn drop(&mut self) {
		drain_frame(self.depth);
		let active = pool_depth();
		if active != self.depth + 1 {
			if !std::thread::panicking() {
				violation(ContractViolation::PoolOrder {
					depth: self.depth,
					active,
				});
			}
			return;
		}
		drop(POOLS.with_borrow_mut(Vec::pop));
		tracing::trace!(depth = self.depth, "object.autopool.pop");
	}
}

fn drain_frame(depth: usize) {
	let mut released = 0usize;
	// Releases happen outside the borrow: a delete procedure may itself
	// autorelease into this pool.
	while let Some(item) = POOLS.with_borrow_mut(|pools| pools.get_mut(depth).and_then(PoolFrame::pop)) {
		drop(item);
		released += 1;
	}
	POOLS.with_borrow_mut(|pools| {
		if let Some(frame) = pools.get_mut(depth) {
			frame.trim();
		}
	});
	if released > 0 {
		tracing::trace!(depth, released, "object.autopool.drain");
	}
}

/// Hands `item` to the innermost pool of the calling thread.
///
/// The returned pointer stays valid until that pool drains. Calling this
/// with no active pool is a contract violation.
pub fn autorelease<T: Send + Sync + 'static>(item: Ref<T>) -> ObjectPtr<T> {
	let ptr = item.as_ptr();
	let rejected = POOLS.with_borrow_mut(|pools| match pools.last_mut() {
		Some(frame) => {
			frame.push(item.into_erased());
			None
		}
		None => Some(item),
	});
	if rejected.is_some() {
		violation(ContractViolation::NoActivePool);
	}
	ptr
}

#[cfg(test)]
mod tests;
