//! Process-wide deferred free list.
//!
//! Producers push headers with a CAS at the head. The push that finds the
//! list empty schedules one reclamation pass on the blocking pool; a pass
//! swaps the head with null and frees the detached chain, repeating until it
//! observes an empty list.

use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicPtr, Ordering};

use vigil_worker::TaskClass;

use crate::header::{ObjectHeader, free_object};

static NEXT_TO_FREE: AtomicPtr<ObjectHeader> = AtomicPtr::new(ptr::null_mut());

pub(crate) fn defer_free(header: NonNull<ObjectHeader>) {
	// SAFETY: the object reached zero; nothing else touches its header.
	let link = unsafe { &header.as_ref().next_to_free };
	let mut head = NEXT_TO_FREE.load(Ordering::Relaxed);
	loop {
		link.store(head, Ordering::Relaxed);
		match NEXT_TO_FREE.compare_exchange_weak(head, header.as_ptr(), Ordering::Release, Ordering::Relaxed) {
			Ok(_) => break,
			Err(actual) => head = actual,
		}
	}

	if head.is_null() {
		tracing::trace!("object.deferred.schedule");
		drop(vigil_worker::spawn_blocking(TaskClass::Reclaim, flush_deferred));
	}
}

/// Frees every queued object on the calling thread. Returns the number freed.
pub fn flush_deferred() -> usize {
	let mut freed = 0;
	loop {
		let mut node = NEXT_TO_FREE.swap(ptr::null_mut(), Ordering::Acquire);
		if node.is_null() {
			break;
		}
		while let Some(header) = NonNull::new(node) {
			// SAFETY: detached nodes are owned exclusively by this pass; the
			// successor is read before the node is freed.
			unsafe {
				node = header.as_ref().next_to_free.load(Ordering::Relaxed);
				free_object(header);
			}
			freed += 1;
		}
	}
	if freed > 0 {
		tracing::debug!(freed, "object.deferred.drain");
	}
	freed
}

/// Whether objects are waiting for a reclamation pass.
pub fn deferred_pending() -> bool {
	!NEXT_TO_FREE.load(Ordering::Acquire).is_null()
}
