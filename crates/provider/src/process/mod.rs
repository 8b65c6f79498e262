//! Process tracking.

mod item;
mod provider;

pub use item::{ProcessItem, ProcessModified, ProcessRecord, ProcessStats, ProcessStatus};
pub use provider::{ProcessArrival, ProcessPolicy, ProcessProvider, ProcessSource};
