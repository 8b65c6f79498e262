use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};

use parking_lot::Mutex;
use vigil_object::AutoPool;

use crate::diff::{self, CycleContext, CycleReport, SyncPolicy};
use crate::{LiveSet, ProviderError, ProviderEvents};

/// Phase of a provider cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
#[repr(u8)]
pub enum ProviderState {
	Idle = 0,
	Enumerating = 1,
	Diffing = 2,
	Notifying = 3,
}

impl ProviderState {
	fn from_u8(value: u8) -> Self {
		match value {
			1 => Self::Enumerating,
			2 => Self::Diffing,
			3 => Self::Notifying,
			_ => Self::Idle,
		}
	}
}

/// Something a [`crate::ProviderThread`] can run periodically.
pub trait Provider: Send + Sync {
	fn name(&self) -> &'static str;

	/// Runs one enumerate-diff-notify cycle.
	fn update(&self) -> Result<CycleReport, ProviderError>;
}

/// Drives a [`SyncPolicy`] against its live set.
pub struct ProviderLoop<P: SyncPolicy> {
	name: &'static str,
	policy: P,
	set: Arc<LiveSet<P::Item>>,
	events: ProviderEvents<P::Item, P::Modified>,
	run_id: AtomicU64,
	state: AtomicU8,
	cycle: Mutex<()>,
}

impl<P: SyncPolicy> ProviderLoop<P> {
	pub fn new(name: &'static str, policy: P, set: Arc<LiveSet<P::Item>>) -> Self {
		Self {
			name,
			policy,
			set,
			events: ProviderEvents::default(),
			run_id: AtomicU64::new(1),
			state: AtomicU8::new(ProviderState::Idle as u8),
			cycle: Mutex::new(()),
		}
	}

	pub fn events(&self) -> &ProviderEvents<P::Item, P::Modified> {
		&self.events
	}

	pub fn live_set(&self) -> &Arc<LiveSet<P::Item>> {
		&self.set
	}

	pub fn policy(&self) -> &P {
		&self.policy
	}

	/// Run id the next cycle will use.
	pub fn run_id(&self) -> u64 {
		self.run_id.load(Ordering::Acquire)
	}

	pub fn state(&self) -> ProviderState {
		ProviderState::from_u8(self.state.load(Ordering::Acquire))
	}

	fn set_state(&self, state: ProviderState) {
		self.state.store(state as u8, Ordering::Release);
	}

	/// Runs one cycle. Concurrent callers are serialized.
	///
	/// A source failure skips the cycle without touching the live set or
	/// firing any event; the run id is not advanced.
	pub fn run_cycle(&self) -> Result<CycleReport, ProviderError> {
		let _cycle = self.cycle.lock();
		let pool = AutoPool::new();
		let run_id = self.run_id();
		let cx = CycleContext { pool: &pool, run_id };

		self.set_state(ProviderState::Enumerating);
		let records = match self.policy.enumerate() {
			Ok(records) => records,
			Err(source) => {
				self.set_state(ProviderState::Idle);
				tracing::debug!(provider = self.name, run_id, error = %source, "provider.enumerate.failed");
				return Err(ProviderError::Source {
					provider: self.name,
					source,
				});
			}
		};

		self.set_state(ProviderState::Diffing);
		let report = match diff::synchronize(&self.policy, &self.set, &self.events, &records, &cx) {
			Ok(report) => report,
			Err(err) => {
				self.set_state(ProviderState::Idle);
				tracing::warn!(provider = self.name, run_id, error = %err, "provider.cycle.abandoned");
				return Err(err);
			}
		};

		self.set_state(ProviderState::Notifying);
		self.events.updated.invoke(&());
		self.run_id.fetch_add(1, Ordering::AcqRel);
		self.set_state(ProviderState::Idle);

		tracing::debug!(
			provider = self.name,
			run_id,
			records = records.len(),
			added = report.added,
			modified = report.modified,
			removed = report.removed,
			"provider.cycle"
		);
		Ok(report)
	}
}

impl<P: SyncPolicy> Provider for ProviderLoop<P> {
	fn name(&self) -> &'static str {
		self.name
	}

	fn update(&self) -> Result<CycleReport, ProviderError> {
		self.run_cycle()
	}
}
