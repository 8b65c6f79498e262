//! Callback bus.
//!
//! A [`Callback`] is an ordered list of subscriber functions sharing one
//! parameter type. Invocation snapshots the list and calls subscribers with
//! the lock released, so a subscriber may register or unregister (itself
//! included) while it runs.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

type CallbackFn<P> = Box<dyn Fn(&P) + Send + Sync>;

struct Registration<P> {
	id: u64,
	function: CallbackFn<P>,
	unregistering: AtomicBool,
}

/// Handle returned by [`Callback::register`].
///
/// Dropping the handle does not unregister; pass it to
/// [`Callback::unregister`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackRegistration {
	id: u64,
}

impl CallbackRegistration {
	pub fn id(&self) -> u64 {
		self.id
	}
}

/// Thread-safe list of subscribers for parameter type `P`.
pub struct Callback<P> {
	registrations: Mutex<Vec<Arc<Registration<P>>>>,
	next_id: AtomicU64,
}

impl<P> Default for Callback<P> {
	fn default() -> Self {
		Self::new()
	}
}

impl<P> fmt::Debug for Callback<P> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Callback").field("registrations", &self.len()).finish()
	}
}

impl<P> Callback<P> {
	pub fn new() -> Self {
		Self {
			registrations: Mutex::new(Vec::new()),
			next_id: AtomicU64::new(1),
		}
	}

	/// Appends a subscriber. It is called from the next invocation onwards.
	pub fn register<F>(&self, function: F) -> CallbackRegistration
	where
		F: Fn(&P) + Send + Sync + 'static,
	{
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		self.registrations.lock().push(Arc::new(Registration {
			id,
			function: Box::new(function),
			unregistering: AtomicBool::new(false),
		}));
		tracing::trace!(registration = id, "callback.register");
		CallbackRegistration { id }
	}

	/// Removes a subscriber. Safe to call from inside any subscriber.
	///
	/// A pass already in progress skips the registration from this point
	/// on. Returns `false` if the handle was not registered here.
	pub fn unregister(&self, registration: &CallbackRegistration) -> bool {
		let mut registrations = self.registrations.lock();
		let Some(index) = registrations.iter().position(|r| r.id == registration.id) else {
			return false;
		};
		let removed = registrations.remove(index);
		removed.unregistering.store(true, Ordering::Release);
		tracing::trace!(registration = registration.id, "callback.unregister");
		true
	}

	/// Calls every registered subscriber with `parameter`, in registration
	/// order.
	pub fn invoke(&self, parameter: &P) {
		let snapshot: Vec<_> = self.registrations.lock().clone();
		for registration in snapshot {
			if registration.unregistering.load(Ordering::Acquire) {
				continue;
			}
			(registration.function)(parameter);
		}
	}

	pub fn len(&self) -> usize {
		self.registrations.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}
