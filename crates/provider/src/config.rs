//! Monitor configuration.

use std::time::Duration;

use serde::Deserialize;

/// Settings for a [`crate::Monitor`].
///
/// Every field has a default, so an empty document is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MonitorConfig {
	/// Provider thread interval in milliseconds.
	pub interval_ms: u64,
	/// Track services.
	pub services: bool,
	/// Track processes.
	pub processes: bool,
	/// Upper bound on threads reclaiming deferred deletions.
	pub reclaim_threads: usize,
	/// `tracing` filter directive used when `RUST_LOG` is unset.
	pub log_filter: Option<String>,
}

/// Default provider interval in milliseconds.
fn default_interval_ms() -> u64 {
	1000
}

impl Default for MonitorConfig {
	fn default() -> Self {
		Self {
			interval_ms: default_interval_ms(),
			services: true,
			processes: true,
			reclaim_threads: 2,
			log_filter: None,
		}
	}
}

impl MonitorConfig {
	pub fn interval(&self) -> Duration {
		Duration::from_millis(self.interval_ms.max(1))
	}
}
