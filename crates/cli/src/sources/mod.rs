//! Data sources backed by the host system.

mod processes;
mod services;

pub use processes::SysinfoProcessSource;
pub use services::SystemctlServiceSource;
