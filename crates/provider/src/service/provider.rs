use std::sync::Arc;

use vigil_object::Ref;

use super::item::{ServiceItem, ServiceModified};
use super::types::{ServiceConfig, ServiceRecord, ServiceStatus};
use crate::diff::{CycleContext, SyncPolicy};
use crate::process::{ProcessArrival, ProcessItem};
use crate::{LiveSet, ProviderError, ProviderLoop, SourceError};

/// External service manager.
pub trait ServiceSource: Send + Sync {
	fn enumerate(&self) -> Result<Vec<ServiceRecord>, SourceError>;

	/// Fetches configuration for one service. `None` when unavailable.
	fn query_config(&self, name: &str) -> Option<ServiceConfig>;
}

/// Service half of the provider loop.
///
/// Reads the process live set to link running services to their host.
pub struct ServicePolicy {
	source: Box<dyn ServiceSource>,
	processes: Arc<LiveSet<ProcessItem>>,
}

/// Provider loop tracking services by case-insensitive name.
pub type ServiceProvider = ProviderLoop<ServicePolicy>;

impl ServicePolicy {
	pub fn new(source: Box<dyn ServiceSource>, processes: Arc<LiveSet<ProcessItem>>) -> Self {
		Self { source, processes }
	}

	fn refresh_config(&self, item: &ServiceItem) {
		let config = self.source.query_config(item.name());
		if config.is_none() {
			tracing::debug!(service = item.name(), "service.config.unavailable");
		}
		item.set_config(config);
	}

	/// Links `item` to process `pid`, or marks it pending if the process is
	/// not tracked yet.
	fn link(&self, item: &Ref<ServiceItem>, pid: u32) {
		match self.processes.lookup(&pid) {
			Some(process) => {
				process.add_service(item);
				item.set_pending_process(false);
			}
			None => item.set_pending_process(true),
		}
	}

	fn unlink(&self, item: &Ref<ServiceItem>, pid: u32) {
		match self.processes.lookup(&pid) {
			Some(process) => {
				process.remove_service(item);
			}
			None => item.set_pending_process(false),
		}
	}

	fn retry_pending(&self, item: &Ref<ServiceItem>) {
		if !item.is_pending_process() {
			return;
		}
		let pid = item.process_id();
		if let Some(process) = self.processes.lookup(&pid)
			&& item.take_pending_process()
		{
			process.add_service(item);
			tracing::trace!(service = item.name(), pid, "service.pending.resolved");
		}
	}
}

impl SyncPolicy for ServicePolicy {
	type Item = ServiceItem;
	type Record = ServiceRecord;
	type Modified = ServiceModified;

	fn enumerate(&self) -> Result<Vec<ServiceRecord>, SourceError> {
		self.source.enumerate()
	}

	fn record_key(record: &ServiceRecord) -> &str {
		&record.name
	}

	fn create(&self, record: &ServiceRecord, cx: &CycleContext<'_>) -> Result<Ref<ServiceItem>, ProviderError> {
		let item = ServiceItem::create(record, cx.run_id)?;
		self.refresh_config(&item);
		Ok(item)
	}

	fn attach(&self, item: &Ref<ServiceItem>, _cx: &CycleContext<'_>) {
		let pid = host_pid(&item.status());
		if pid != 0 {
			self.link(item, pid);
		}
	}

	fn detach(&self, item: &Ref<ServiceItem>, _cx: &CycleContext<'_>) {
		let pid = item.process_id();
		if pid != 0
			&& let Some(process) = self.processes.lookup(&pid)
		{
			process.remove_service(item);
		}
		item.set_pending_process(false);
	}

	fn update(&self, item: &Ref<ServiceItem>, record: &ServiceRecord, _cx: &CycleContext<'_>) -> Option<ServiceModified> {
		self.retry_pending(item);

		let new = record.status();
		if item.status() == new && !item.needs_config_update() {
			return None;
		}

		let old = item.replace_status(new);
		let modified = ServiceModified {
			service: item.clone(),
			old,
			new,
		};

		let (old_host, new_host) = (host_pid(&old), host_pid(&new));
		if old_host != new_host {
			if old_host != 0 {
				self.unlink(item, old_host);
			}
			item.set_pending_process(false);
			if new_host != 0 {
				self.link(item, new_host);
			}
		}

		if item.take_needs_config_update() {
			self.refresh_config(item);
		}

		Some(modified)
	}
}

/// Process a service in `status` should be linked to, zero for none.
fn host_pid(status: &ServiceStatus) -> u32 {
	if status.state.is_hosted() { status.process_id } else { 0 }
}

/// Completes pending service links when a process appears.
pub struct ServiceLinker {
	services: Arc<LiveSet<ServiceItem>>,
}

impl ServiceLinker {
	pub fn new(services: Arc<LiveSet<ServiceItem>>) -> Self {
		Self { services }
	}
}

impl ProcessArrival for ServiceLinker {
	fn process_added(&self, process: &Ref<ProcessItem>) {
		let pid = process.pid();
		let pending = self
			.services
			.select(|service| service.is_pending_process() && service.process_id() == pid);
		for service in pending {
			if service.take_pending_process() {
				process.add_service(&service);
				tracing::trace!(service = service.name(), pid, "service.pending.resolved");
			}
		}
	}
}
