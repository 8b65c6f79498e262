use std::sync::Arc;

use vigil_object::Ref;
use vigil_worker::WorkerRecord;

use crate::process::{ProcessItem, ProcessPolicy, ProcessProvider, ProcessSource};
use crate::service::{ServiceItem, ServiceLinker, ServicePolicy, ServiceProvider, ServiceSource};
use crate::{LiveSet, MonitorConfig, ProviderThread};

/// Point-in-time summary of a [`Monitor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorStatus {
	pub rounds: u64,
	pub services: usize,
	pub processes: usize,
	pub workers: Vec<WorkerRecord>,
}

/// Application context owning the providers and their thread.
///
/// The process provider is registered ahead of the service provider so a
/// round sees new processes before services try to link to them.
pub struct Monitor {
	config: MonitorConfig,
	service_set: Arc<LiveSet<ServiceItem>>,
	process_set: Arc<LiveSet<ProcessItem>>,
	services: Option<Arc<ServiceProvider>>,
	processes: Option<Arc<ProcessProvider>>,
	thread: ProviderThread,
}

impl Monitor {
	/// Wires providers for the enabled kinds that have a source.
	pub fn new(
		config: MonitorConfig,
		service_source: Option<Box<dyn ServiceSource>>,
		process_source: Option<Box<dyn ProcessSource>>,
	) -> Self {
		let service_set = Arc::new(LiveSet::new("services"));
		let process_set = Arc::new(LiveSet::new("processes"));
		let service_source = service_source.filter(|_| config.services);
		let process_source = process_source.filter(|_| config.processes);

		let processes = process_source.map(|source| {
			let mut policy = ProcessPolicy::new(source);
			if service_source.is_some() {
				policy = policy.with_arrival(Arc::new(ServiceLinker::new(Arc::clone(&service_set))));
			}
			Arc::new(ProcessProvider::new("processes", policy, Arc::clone(&process_set)))
		});
		let services = service_source.map(|source| {
			let policy = ServicePolicy::new(source, Arc::clone(&process_set));
			Arc::new(ServiceProvider::new("services", policy, Arc::clone(&service_set)))
		});

		let thread = ProviderThread::new("primary", config.interval());
		if let Some(provider) = &processes {
			thread.register(provider.clone());
		}
		if let Some(provider) = &services {
			thread.register(provider.clone());
		}
		tracing::info!(
			services = services.is_some(),
			processes = processes.is_some(),
			interval_ms = config.interval_ms,
			"monitor.init"
		);

		Self {
			config,
			service_set,
			process_set,
			services,
			processes,
			thread,
		}
	}

	pub fn config(&self) -> &MonitorConfig {
		&self.config
	}

	pub fn services(&self) -> Option<&Arc<ServiceProvider>> {
		self.services.as_ref()
	}

	pub fn processes(&self) -> Option<&Arc<ProcessProvider>> {
		self.processes.as_ref()
	}

	pub fn thread(&self) -> &ProviderThread {
		&self.thread
	}

	pub fn lookup_service(&self, name: &str) -> Option<Ref<ServiceItem>> {
		self.service_set.lookup(name)
	}

	pub fn lookup_process(&self, pid: u32) -> Option<Ref<ProcessItem>> {
		self.process_set.lookup(&pid)
	}

	/// Flags a service for a configuration refresh on the next cycle.
	pub fn mark_needs_config_update(&self, name: &str) -> bool {
		match self.lookup_service(name) {
			Some(service) => {
				service.mark_needs_config_update();
				true
			}
			None => false,
		}
	}

	/// Starts the provider thread.
	pub fn start(&self) -> std::io::Result<()> {
		self.thread.start()
	}

	/// Runs one round of every provider on the calling thread.
	pub fn run_once(&self) {
		self.thread.run_once();
	}

	pub fn stop(&self) {
		self.thread.stop();
	}

	pub fn status(&self) -> MonitorStatus {
		MonitorStatus {
			rounds: self.thread.rounds(),
			services: self.service_set.len(),
			processes: self.process_set.len(),
			workers: self.thread.registry().snapshots(),
		}
	}
}

impl Drop for Monitor {
	fn drop(&mut self) {
		self.thread.stop();
		// Item drops below queue on the deferred list.
		drop(self.service_set.clear());
		drop(self.process_set.clear());
		vigil_object::flush_deferred();
	}
}
