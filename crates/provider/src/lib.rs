//! Provider loops for the monitor core.
//!
//! A provider keeps a [`LiveSet`] of reference-counted items in step with an
//! external source. Each cycle enumerates the source once, diffs the batch
//! against the set (removals first, then additions and modifications) and
//! fans the results out through [`ProviderEvents`].
//!
//! Services and processes are the two tracked kinds. A service running in a
//! process is linked into that process's service list; when the process is
//! not tracked yet the link stays pending until the process provider
//! reports it.

pub mod config;
pub mod diff;
mod error;
mod events;
mod live_set;
mod monitor;
pub mod process;
mod provider;
pub mod service;
mod thread;

pub use config::MonitorConfig;
pub use diff::{CycleContext, CycleReport, SyncPolicy};
pub use error::{ProviderError, SourceError};
pub use events::ProviderEvents;
pub use live_set::{LiveSet, Tracked};
pub use monitor::{Monitor, MonitorStatus};
pub use provider::{Provider, ProviderLoop, ProviderState};
pub use thread::{ProviderThread, ThreadRegistration};

#[cfg(test)]
mod test_support;
