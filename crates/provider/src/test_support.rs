//! Scripted sources and event recorders shared by provider tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;

use crate::SourceError;
use crate::process::{ProcessProvider, ProcessRecord, ProcessSource, ProcessStatus};
use crate::service::{
	ServiceConfig, ServiceControls, ServiceErrorControl, ServiceProvider, ServiceRecord, ServiceSource,
	ServiceStartType, ServiceState, ServiceType,
};

/// Queue of batches; once drained, the last successful batch repeats.
struct Script<R> {
	batches: Mutex<VecDeque<Result<Vec<R>, String>>>,
	last: Mutex<Vec<R>>,
	calls: AtomicUsize,
}

impl<R: Clone> Script<R> {
	fn new() -> Self {
		Self {
			batches: Mutex::new(VecDeque::new()),
			last: Mutex::new(Vec::new()),
			calls: AtomicUsize::new(0),
		}
	}

	fn next(&self) -> Result<Vec<R>, SourceError> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		match self.batches.lock().pop_front() {
			Some(Ok(batch)) => {
				*self.last.lock() = batch.clone();
				Ok(batch)
			}
			Some(Err(message)) => Err(SourceError::Enumeration(message)),
			None => Ok(self.last.lock().clone()),
		}
	}
}

#[derive(Clone)]
pub(crate) struct ScriptedServices {
	script: Arc<Script<ServiceRecord>>,
	configs: Arc<Mutex<HashMap<String, ServiceConfig>>>,
	config_queries: Arc<AtomicUsize>,
}

impl ScriptedServices {
	pub(crate) fn new() -> Self {
		Self {
			script: Arc::new(Script::new()),
			configs: Arc::new(Mutex::new(HashMap::new())),
			config_queries: Arc::new(AtomicUsize::new(0)),
		}
	}

	pub(crate) fn push(&self, batch: Vec<ServiceRecord>) {
		self.script.batches.lock().push_back(Ok(batch));
	}

	pub(crate) fn push_failure(&self, message: &str) {
		self.script.batches.lock().push_back(Err(message.to_string()));
	}

	pub(crate) fn set_config(&self, name: &str, config: ServiceConfig) {
		self.configs.lock().insert(name.to_ascii_lowercase(), config);
	}

	pub(crate) fn config_queries(&self) -> usize {
		self.config_queries.load(Ordering::SeqCst)
	}
}

impl ServiceSource for ScriptedServices {
	fn enumerate(&self) -> Result<Vec<ServiceRecord>, SourceError> {
		self.script.next()
	}

	fn query_config(&self, name: &str) -> Option<ServiceConfig> {
		self.config_queries.fetch_add(1, Ordering::SeqCst);
		self.configs.lock().get(&name.to_ascii_lowercase()).copied()
	}
}

#[derive(Clone)]
pub(crate) struct ScriptedProcesses {
	script: Arc<Script<ProcessRecord>>,
}

impl ScriptedProcesses {
	pub(crate) fn new() -> Self {
		Self {
			script: Arc::new(Script::new()),
		}
	}

	pub(crate) fn push(&self, batch: Vec<ProcessRecord>) {
		self.script.batches.lock().push_back(Ok(batch));
	}

	pub(crate) fn push_failure(&self, message: &str) {
		self.script.batches.lock().push_back(Err(message.to_string()));
	}

	pub(crate) fn calls(&self) -> usize {
		self.script.calls.load(Ordering::SeqCst)
	}
}

impl ProcessSource for ScriptedProcesses {
	fn enumerate(&self) -> Result<Vec<ProcessRecord>, SourceError> {
		self.script.next()
	}
}

pub(crate) fn service(name: &str, state: ServiceState, process_id: u32) -> ServiceRecord {
	ServiceRecord {
		name: name.to_string(),
		display_name: format!("{name} service"),
		service_type: ServiceType::OWN_PROCESS,
		state,
		controls_accepted: ServiceControls::STOP,
		process_id,
	}
}

pub(crate) fn process(pid: u32, name: &str) -> ProcessRecord {
	ProcessRecord {
		pid,
		parent_pid: Some(1),
		name: name.to_string(),
		status: ProcessStatus::Running,
		memory_bytes: 4096,
		cpu_usage: 0.0,
	}
}

pub(crate) fn auto_start() -> ServiceConfig {
	ServiceConfig {
		start_type: ServiceStartType::Auto,
		error_control: ServiceErrorControl::Normal,
	}
}

pub(crate) type EventLog = Arc<Mutex<Vec<String>>>;

pub(crate) fn record_service_events(provider: &ServiceProvider) -> EventLog {
	let log: EventLog = Arc::default();
	let events = provider.events();

	let sink = Arc::clone(&log);
	events.added.register(move |item| sink.lock().push(format!("added:{}", item.name())));
	let sink = Arc::clone(&log);
	events.modified.register(move |m| {
		sink.lock().push(format!("modified:{}:{}->{}", m.service.name(), m.old.state, m.new.state));
	});
	let sink = Arc::clone(&log);
	events.removed.register(move |item| sink.lock().push(format!("removed:{}", item.name())));
	let sink = Arc::clone(&log);
	events.updated.register(move |_| sink.lock().push("updated".to_string()));
	log
}

pub(crate) fn record_process_events(provider: &ProcessProvider) -> EventLog {
	let log: EventLog = Arc::default();
	let events = provider.events();

	let sink = Arc::clone(&log);
	events.added.register(move |item| sink.lock().push(format!("added:{}", item.pid())));
	let sink = Arc::clone(&log);
	events
		.modified
		.register(move |m| sink.lock().push(format!("modified:{}", m.process.pid())));
	let sink = Arc::clone(&log);
	events.removed.register(move |item| sink.lock().push(format!("removed:{}", item.pid())));
	let sink = Arc::clone(&log);
	events.updated.register(move |_| sink.lock().push("updated".to_string()));
	log
}

pub(crate) fn take(log: &EventLog) -> Vec<String> {
	std::mem::take(&mut *log.lock())
}
