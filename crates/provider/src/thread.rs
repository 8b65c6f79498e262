use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};
use vigil_object::AutoPool;
use vigil_worker::{TaskClass, WorkerRegistry};

use crate::Provider;

/// Handle returned by [`ProviderThread::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadRegistration {
	id: u64,
}

struct Registered {
	id: u64,
	provider: Arc<dyn Provider>,
	enabled: AtomicBool,
}

struct Shared {
	name: String,
	interval: Mutex<Duration>,
	registrations: Mutex<Vec<Arc<Registered>>>,
	stop: Mutex<bool>,
	wake: Condvar,
	rounds: AtomicU64,
	registry: WorkerRegistry,
}

impl Shared {
	fn run_round(&self, pool: &mut AutoPool) {
		let registrations = self.registrations.lock().clone();
		for registration in registrations {
			if !registration.enabled.load(Ordering::Acquire) {
				continue;
			}
			let provider = registration.provider.name();
			match registration.provider.update() {
				Ok(_) => self.registry.update(provider, TaskClass::Provider, |record| record.rounds += 1),
				Err(err) => {
					if err.is_transient() {
						tracing::debug!(thread = %self.name, provider, error = %err, "provider.thread.cycle_skipped");
					} else {
						tracing::warn!(thread = %self.name, provider, error = %err, "provider.thread.cycle_failed");
					}
					self.registry.update(provider, TaskClass::Provider, |record| {
						record.rounds += 1;
						record.failures += 1;
						record.last_error = Some(err.to_string());
					});
				}
			}
		}
		pool.drain();
		self.rounds.fetch_add(1, Ordering::AcqRel);
	}
}

/// Named OS thread running registered providers on a fixed interval.
///
/// Each round runs every enabled provider in registration order, then
/// drains the thread's auto-release pool. A provider error costs only that
/// provider's cycle.
pub struct ProviderThread {
	shared: Arc<Shared>,
	handle: Mutex<Option<JoinHandle<()>>>,
	next_id: AtomicU64,
}

impl ProviderThread {
	pub fn new(name: impl Into<String>, interval: Duration) -> Self {
		Self::with_registry(name, interval, WorkerRegistry::new())
	}

	/// Creates a thread reporting per-provider status into `registry`.
	pub fn with_registry(name: impl Into<String>, interval: Duration, registry: WorkerRegistry) -> Self {
		Self {
			shared: Arc::new(Shared {
				name: name.into(),
				interval: Mutex::new(interval),
				registrations: Mutex::new(Vec::new()),
				stop: Mutex::new(false),
				wake: Condvar::new(),
				rounds: AtomicU64::new(0),
				registry,
			}),
			handle: Mutex::new(None),
			next_id: AtomicU64::new(1),
		}
	}

	pub fn name(&self) -> &str {
		&self.shared.name
	}

	/// Adds `provider`, enabled, to the end of the round.
	pub fn register(&self, provider: Arc<dyn Provider>) -> ThreadRegistration {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		tracing::debug!(thread = %self.shared.name, provider = provider.name(), "provider.thread.register");
		self.shared.registrations.lock().push(Arc::new(Registered {
			id,
			provider,
			enabled: AtomicBool::new(true),
		}));
		ThreadRegistration { id }
	}

	pub fn unregister(&self, registration: &ThreadRegistration) -> bool {
		let mut registrations = self.shared.registrations.lock();
		let before = registrations.len();
		registrations.retain(|r| r.id != registration.id);
		registrations.len() != before
	}

	/// Enables or disables a registration without removing it.
	pub fn set_enabled(&self, registration: &ThreadRegistration, enabled: bool) -> bool {
		let registrations = self.shared.registrations.lock();
		let Some(found) = registrations.iter().find(|r| r.id == registration.id) else {
			return false;
		};
		found.enabled.store(enabled, Ordering::Release);
		true
	}

	pub fn interval(&self) -> Duration {
		*self.shared.interval.lock()
	}

	/// Changes the interval. A running thread picks it up immediately.
	pub fn set_interval(&self, interval: Duration) {
		*self.shared.interval.lock() = interval;
		// The loop reads the interval under the stop lock, so notifying under
		// it cannot slip in between that read and the wait.
		let _stop = self.shared.stop.lock();
		self.shared.wake.notify_all();
	}

	/// Number of completed rounds.
	pub fn rounds(&self) -> u64 {
		self.shared.rounds.load(Ordering::Acquire)
	}

	pub fn registry(&self) -> &WorkerRegistry {
		&self.shared.registry
	}

	pub fn is_running(&self) -> bool {
		self.handle.lock().is_some()
	}

	/// Runs one round on the calling thread.
	pub fn run_once(&self) {
		let mut pool = AutoPool::new();
		self.shared.run_round(&mut pool);
	}

	/// Starts the background thread. Does nothing if already running.
	pub fn start(&self) -> std::io::Result<()> {
		let mut handle = self.handle.lock();
		if handle.is_some() {
			return Ok(());
		}
		*self.shared.stop.lock() = false;

		let shared = Arc::clone(&self.shared);
		let thread_name = format!("vigil-{}", shared.name);
		*handle = Some(vigil_worker::spawn_named_thread(TaskClass::Provider, thread_name, move || {
			tracing::debug!(thread = %shared.name, "provider.thread.start");
			let mut pool = AutoPool::new();
			loop {
				shared.run_round(&mut pool);
				let mut stopped = shared.stop.lock();
				if !*stopped {
					let interval = *shared.interval.lock();
					shared.wake.wait_for(&mut stopped, interval);
				}
				if *stopped {
					break;
				}
			}
			tracing::debug!(thread = %shared.name, "provider.thread.exit");
		})?);
		Ok(())
	}

	/// Signals the thread to exit and joins it.
	pub fn stop(&self) {
		let Some(handle) = self.handle.lock().take() else {
			return;
		};
		*self.shared.stop.lock() = true;
		self.shared.wake.notify_all();
		if handle.join().is_err() {
			tracing::error!(thread = %self.shared.name, "provider.thread.panicked");
		}
	}
}

impl Drop for ProviderThread {
	fn drop(&mut self) {
		self.stop();
	}
}
