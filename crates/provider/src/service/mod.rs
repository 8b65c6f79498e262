//! Service tracking.

mod item;
mod provider;
mod types;

pub use item::{ServiceItem, ServiceModified};
pub use provider::{ServiceLinker, ServicePolicy, ServiceProvider, ServiceSource};
pub use types::{
	ServiceChange, ServiceConfig, ServiceControls, ServiceErrorControl, ServiceRecord, ServiceStartType,
	ServiceState, ServiceStatus, ServiceType,
};

#[cfg(test)]
mod tests;
