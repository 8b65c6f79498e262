use std::sync::Arc;

use vigil_object::Ref;

use super::item::{ProcessItem, ProcessModified, ProcessRecord};
use crate::diff::{CycleContext, SyncPolicy};
use crate::{ProviderError, ProviderLoop, SourceError};

/// External process table.
pub trait ProcessSource: Send + Sync {
	fn enumerate(&self) -> Result<Vec<ProcessRecord>, SourceError>;
}

/// Notified when the process provider starts tracking a process, so a
/// related provider can complete relationships it left pending.
pub trait ProcessArrival: Send + Sync {
	fn process_added(&self, process: &Ref<ProcessItem>);
}

/// Process half of the provider loop.
pub struct ProcessPolicy {
	source: Box<dyn ProcessSource>,
	arrival: Option<Arc<dyn ProcessArrival>>,
}

impl ProcessPolicy {
	pub fn new(source: Box<dyn ProcessSource>) -> Self {
		Self { source, arrival: None }
	}

	pub fn with_arrival(mut self, arrival: Arc<dyn ProcessArrival>) -> Self {
		self.arrival = Some(arrival);
		self
	}
}

/// Provider loop tracking processes by pid.
pub type ProcessProvider = ProviderLoop<ProcessPolicy>;

impl SyncPolicy for ProcessPolicy {
	type Item = ProcessItem;
	type Record = ProcessRecord;
	type Modified = ProcessModified;

	fn enumerate(&self) -> Result<Vec<ProcessRecord>, SourceError> {
		self.source.enumerate()
	}

	fn record_key(record: &ProcessRecord) -> &u32 {
		&record.pid
	}

	fn create(&self, record: &ProcessRecord, cx: &CycleContext<'_>) -> Result<Ref<ProcessItem>, ProviderError> {
		Ok(ProcessItem::create(record, cx.run_id)?)
	}

	fn added(&self, item: &Ref<ProcessItem>, _cx: &CycleContext<'_>) {
		if let Some(arrival) = &self.arrival {
			arrival.process_added(item);
		}
	}

	fn detach(&self, item: &Ref<ProcessItem>, _cx: &CycleContext<'_>) {
		let services = item.take_services();
		if !services.is_empty() {
			tracing::trace!(pid = item.pid(), services = services.len(), "process.services.unlink");
		}
	}

	fn update(&self, item: &Ref<ProcessItem>, record: &ProcessRecord, _cx: &CycleContext<'_>) -> Option<ProcessModified> {
		let new = record.stats();
		if item.stats() == new {
			return None;
		}
		let old = item.replace_stats(new);
		Some(ProcessModified {
			process: item.clone(),
			old,
			new,
		})
	}
}
