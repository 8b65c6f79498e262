//! Worker primitives shared by the monitor runtime.
//!
//! Provider loops run on dedicated named OS threads, while short background
//! jobs (deferred object reclamation, secondary metadata refresh) run on a
//! process-wide blocking pool whose size is fixed the first time it is used.

mod class;
mod registry;
mod spawn;

pub use class::TaskClass;
pub use registry::{WorkerRecord, WorkerRegistry};
pub use spawn::{blocking_pool_limit, set_blocking_pool_limit, spawn_blocking, spawn_named_thread, spawn_thread};
