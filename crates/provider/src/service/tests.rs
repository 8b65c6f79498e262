use std::sync::Arc;

use super::{
	ServiceChange, ServiceErrorControl, ServiceItem, ServicePolicy, ServiceProvider, ServiceStartType, ServiceState,
	ServiceType,
};
use crate::process::{ProcessItem, ProcessPolicy, ProcessProvider};
use crate::service::ServiceLinker;
use crate::test_support::{
	ScriptedProcesses, ScriptedServices, auto_start, process, record_service_events, service, take,
};
use crate::{LiveSet, ProviderError, ProviderState};

struct Fixture {
	services: ScriptedServices,
	processes: ScriptedProcesses,
	service_set: Arc<LiveSet<ServiceItem>>,
	process_set: Arc<LiveSet<ProcessItem>>,
	service_provider: ServiceProvider,
	process_provider: ProcessProvider,
}

fn fixture() -> Fixture {
	let services = ScriptedServices::new();
	let processes = ScriptedProcesses::new();
	let service_set = Arc::new(LiveSet::new("services"));
	let process_set = Arc::new(LiveSet::new("processes"));
	let service_provider = ServiceProvider::new(
		"services",
		ServicePolicy::new(Box::new(services.clone()), Arc::clone(&process_set)),
		Arc::clone(&service_set),
	);
	let process_provider = ProcessProvider::new(
		"processes",
		ProcessPolicy::new(Box::new(processes.clone()))
			.with_arrival(Arc::new(ServiceLinker::new(Arc::clone(&service_set)))),
		Arc::clone(&process_set),
	);
	Fixture {
		services,
		processes,
		service_set,
		process_set,
		service_provider,
		process_provider,
	}
}

#[test]
fn test_added_then_modified_and_removed() {
	let f = fixture();
	let log = record_service_events(&f.service_provider);

	f.services.push(vec![
		service("A", ServiceState::Running, 0),
		service("B", ServiceState::Stopped, 0),
	]);
	let report = f.service_provider.run_cycle().unwrap();
	assert_eq!((report.added, report.modified, report.removed), (2, 0, 0));
	assert_eq!(take(&log), ["added:A", "added:B", "updated"]);
	assert_eq!(f.service_set.len(), 2);

	f.services.push(vec![service("A", ServiceState::Stopped, 0)]);
	let report = f.service_provider.run_cycle().unwrap();
	assert_eq!((report.added, report.modified, report.removed), (0, 1, 1));
	assert_eq!(take(&log), ["removed:B", "modified:A:Running->Stopped", "updated"]);
	assert_eq!(f.service_set.len(), 1);
	assert!(f.service_provider.live_set().lookup("B").is_none());
}

#[test]
fn test_unchanged_batch_fires_only_updated() {
	let f = fixture();
	let log = record_service_events(&f.service_provider);
	f.services.push(vec![service("A", ServiceState::Running, 0)]);
	f.service_provider.run_cycle().unwrap();
	take(&log);

	let report = f.service_provider.run_cycle().unwrap();
	assert!(report.is_quiet());
	assert_eq!(take(&log), ["updated"]);
}

#[test]
fn test_failed_enumeration_changes_nothing() {
	let f = fixture();
	let log = record_service_events(&f.service_provider);
	f.services.push(vec![service("A", ServiceState::Running, 0)]);
	f.service_provider.run_cycle().unwrap();
	take(&log);
	let run_id = f.service_provider.run_id();

	f.services.push_failure("service manager unavailable");
	let err = f.service_provider.run_cycle().unwrap_err();
	assert!(matches!(err, ProviderError::Source { provider: "services", .. }));
	assert!(take(&log).is_empty());
	assert_eq!(f.service_provider.run_id(), run_id);
	assert_eq!(f.service_provider.state(), ProviderState::Idle);
	assert_eq!(f.service_set.len(), 1);

	f.services.push(vec![]);
	f.service_provider.run_cycle().unwrap();
	assert_eq!(take(&log), ["removed:A", "updated"]);
}

#[test]
fn test_keys_are_case_insensitive() {
	let f = fixture();
	let log = record_service_events(&f.service_provider);
	f.services.push(vec![service("Spooler", ServiceState::Running, 0)]);
	f.service_provider.run_cycle().unwrap();
	take(&log);

	f.services.push(vec![service("SPOOLER", ServiceState::Running, 0)]);
	f.service_provider.run_cycle().unwrap();
	assert_eq!(take(&log), ["updated"]);

	let item = f.service_set.lookup("spooler").unwrap();
	assert_eq!(item.name(), "Spooler");
}

#[test]
fn test_run_id_stamps_new_items() {
	let f = fixture();
	f.services.push(vec![service("first", ServiceState::Stopped, 0)]);
	f.service_provider.run_cycle().unwrap();
	f.services.push(vec![
		service("first", ServiceState::Stopped, 0),
		service("second", ServiceState::Stopped, 0),
	]);
	f.service_provider.run_cycle().unwrap();

	assert_eq!(f.service_set.lookup("first").unwrap().run_id(), 1);
	assert_eq!(f.service_set.lookup("second").unwrap().run_id(), 2);
	assert_eq!(f.service_provider.run_id(), 3);
}

#[test]
fn test_pending_link_resolves_when_process_arrives() {
	let f = fixture();
	f.services.push(vec![service("C", ServiceState::Running, 42)]);
	f.service_provider.run_cycle().unwrap();

	let c = f.service_set.lookup("C").unwrap();
	assert!(c.is_pending_process());
	assert!(f.process_set.lookup(&42).is_none());

	f.processes.push(vec![process(42, "host")]);
	f.process_provider.run_cycle().unwrap();

	assert!(!c.is_pending_process());
	let host = f.process_set.lookup(&42).unwrap();
	let linked = host.services();
	assert_eq!(linked.len(), 1);
	assert!(vigil_object::Ref::ptr_eq(&linked[0], &c));
}

#[test]
fn test_pending_link_retried_by_service_cycle() {
	let f = fixture();
	let unlinked_processes = ProcessProvider::new(
		"processes",
		ProcessPolicy::new(Box::new(f.processes.clone())),
		Arc::clone(&f.process_set),
	);

	f.services.push(vec![service("C", ServiceState::Running, 42)]);
	f.service_provider.run_cycle().unwrap();
	f.processes.push(vec![process(42, "host")]);
	unlinked_processes.run_cycle().unwrap();

	let c = f.service_set.lookup("C").unwrap();
	assert!(c.is_pending_process());
	f.service_provider.run_cycle().unwrap();
	assert!(!c.is_pending_process());
	assert_eq!(f.process_set.lookup(&42).unwrap().service_count(), 1);
}

#[test]
fn test_link_on_add_when_process_already_tracked() {
	let f = fixture();
	f.processes.push(vec![process(7, "host")]);
	f.process_provider.run_cycle().unwrap();

	f.services.push(vec![
		service("paused", ServiceState::Paused, 7),
		service("pending", ServiceState::StartPending, 7),
	]);
	f.service_provider.run_cycle().unwrap();

	let host = f.process_set.lookup(&7).unwrap();
	let names: Vec<_> = host.services().iter().map(|s| s.name().to_string()).collect();
	assert_eq!(names, ["paused"]);
	assert!(!f.service_set.lookup("pending").unwrap().is_pending_process());
}

#[test]
fn test_start_and_stop_maintain_process_link() {
	let f = fixture();
	f.processes.push(vec![process(7, "host")]);
	f.process_provider.run_cycle().unwrap();
	let host = f.process_set.lookup(&7).unwrap();

	let changes = Arc::new(parking_lot::Mutex::new(Vec::new()));
	let sink = Arc::clone(&changes);
	f.service_provider
		.events()
		.modified
		.register(move |m| sink.lock().push(m.change()));

	f.services.push(vec![service("svc", ServiceState::Stopped, 0)]);
	f.service_provider.run_cycle().unwrap();
	assert_eq!(host.service_count(), 0);

	f.services.push(vec![service("svc", ServiceState::Running, 7)]);
	f.service_provider.run_cycle().unwrap();
	assert_eq!(host.service_count(), 1);

	f.services.push(vec![service("svc", ServiceState::Stopped, 0)]);
	f.service_provider.run_cycle().unwrap();
	assert_eq!(host.service_count(), 0);
	assert_eq!(*changes.lock(), [Some(ServiceChange::Started), Some(ServiceChange::Stopped)]);
}

#[test]
fn test_stop_while_pending_clears_pending() {
	let f = fixture();
	f.services.push(vec![service("svc", ServiceState::Running, 99)]);
	f.service_provider.run_cycle().unwrap();
	let svc = f.service_set.lookup("svc").unwrap();
	assert!(svc.is_pending_process());

	f.services.push(vec![service("svc", ServiceState::Stopped, 0)]);
	f.service_provider.run_cycle().unwrap();
	assert!(!svc.is_pending_process());
}

#[test]
fn test_restart_under_new_pid_moves_link() {
	let f = fixture();
	f.processes.push(vec![process(7, "old"), process(8, "new")]);
	f.process_provider.run_cycle().unwrap();
	let (old, new) = (f.process_set.lookup(&7).unwrap(), f.process_set.lookup(&8).unwrap());

	f.services.push(vec![service("svc", ServiceState::Running, 7)]);
	f.service_provider.run_cycle().unwrap();
	assert_eq!((old.service_count(), new.service_count()), (1, 0));

	f.services.push(vec![service("svc", ServiceState::Running, 8)]);
	f.service_provider.run_cycle().unwrap();
	assert_eq!((old.service_count(), new.service_count()), (0, 1));

	f.services.push(vec![service("svc", ServiceState::Running, 9)]);
	f.service_provider.run_cycle().unwrap();
	assert_eq!(new.service_count(), 0);
	assert!(f.service_set.lookup("svc").unwrap().is_pending_process());
}

#[test]
fn test_paused_to_stopped_unlinks() {
	let f = fixture();
	f.processes.push(vec![process(7, "host")]);
	f.process_provider.run_cycle().unwrap();
	let host = f.process_set.lookup(&7).unwrap();

	f.services.push(vec![service("svc", ServiceState::Paused, 7)]);
	f.service_provider.run_cycle().unwrap();
	assert_eq!(host.service_count(), 1);

	f.services.push(vec![service("svc", ServiceState::Stopped, 7)]);
	f.service_provider.run_cycle().unwrap();
	assert_eq!(host.service_count(), 0);
	assert!(!f.service_set.lookup("svc").unwrap().is_pending_process());
}

#[test]
fn test_removed_service_is_unlinked_from_process() {
	let f = fixture();
	let log = record_service_events(&f.service_provider);
	f.processes.push(vec![process(7, "host")]);
	f.process_provider.run_cycle().unwrap();
	f.services.push(vec![service("svc", ServiceState::Running, 7)]);
	f.service_provider.run_cycle().unwrap();
	let host = f.process_set.lookup(&7).unwrap();
	assert_eq!(host.service_count(), 1);

	f.services.push(vec![]);
	f.service_provider.run_cycle().unwrap();
	assert_eq!(host.service_count(), 0);
	assert!(take(&log).contains(&"removed:svc".to_string()));
}

#[test]
fn test_removed_event_sees_live_item() {
	let f = fixture();
	f.services.push(vec![service("gone", ServiceState::Running, 0)]);
	f.service_provider.run_cycle().unwrap();

	let seen = Arc::new(parking_lot::Mutex::new(None));
	let sink = Arc::clone(&seen);
	f.service_provider.events().removed.register(move |item| {
		*sink.lock() = Some((item.name().to_string(), item.state(), item.ref_count() >= 2));
	});
	f.services.push(vec![]);
	f.service_provider.run_cycle().unwrap();
	assert_eq!(*seen.lock(), Some(("gone".to_string(), ServiceState::Running, true)));
}

#[test]
fn test_config_fetched_on_add_and_refreshed_on_demand() {
	let f = fixture();
	f.services.set_config("svc", auto_start());
	f.services.push(vec![service("svc", ServiceState::Running, 0)]);
	f.service_provider.run_cycle().unwrap();

	let svc = f.service_set.lookup("svc").unwrap();
	assert_eq!(svc.config(), Some(auto_start()));
	assert_eq!(f.services.config_queries(), 1);

	f.service_provider.run_cycle().unwrap();
	assert_eq!(f.services.config_queries(), 1);

	let mut disabled = auto_start();
	disabled.start_type = ServiceStartType::Disabled;
	f.services.set_config("svc", disabled);
	svc.mark_needs_config_update();

	let log = record_service_events(&f.service_provider);
	f.service_provider.run_cycle().unwrap();
	assert_eq!(take(&log), ["modified:svc:Running->Running", "updated"]);
	assert_eq!(svc.config().unwrap().start_type, ServiceStartType::Disabled);
	assert!(!svc.needs_config_update());
	assert_eq!(f.services.config_queries(), 2);
}

#[test]
fn test_state_strings_and_parsing() {
	assert_eq!(ServiceState::StartPending.to_string(), "Start Pending");
	assert_eq!("start pending".parse::<ServiceState>().unwrap(), ServiceState::StartPending);
	assert_eq!(ServiceState::name_of(4), "Running");
	assert_eq!(ServiceState::name_of(0), "Unknown");

	assert_eq!(ServiceType::OWN_PROCESS.name(), "Own Process");
	assert_eq!(
		(ServiceType::SHARE_PROCESS | ServiceType::INTERACTIVE_PROCESS).name(),
		"Share Interactive Process"
	);
	assert_eq!((ServiceType::KERNEL_DRIVER | ServiceType::OWN_PROCESS).name(), "Unknown");
	assert_eq!(ServiceType::from_display_name("fs driver"), Some(ServiceType::FILE_SYSTEM_DRIVER));

	assert_eq!(ServiceStartType::Demand.to_string(), "Demand Start");
	assert_eq!("auto start".parse::<ServiceStartType>().unwrap(), ServiceStartType::Auto);
	assert_eq!(ServiceStartType::name_of(9), "Unknown");
	assert_eq!(ServiceErrorControl::name_of(2), "Severe");
}

#[test]
fn test_service_change_classification() {
	use ServiceState as S;
	assert_eq!(ServiceChange::between(S::StartPending, S::Running), Some(ServiceChange::Started));
	assert_eq!(ServiceChange::between(S::ContinuePending, S::Running), Some(ServiceChange::Continued));
	assert_eq!(ServiceChange::between(S::PausePending, S::Paused), Some(ServiceChange::Paused));
	assert_eq!(ServiceChange::between(S::StopPending, S::Stopped), Some(ServiceChange::Stopped));
	assert_eq!(ServiceChange::between(S::Stopped, S::StartPending), None);
	assert_eq!(ServiceChange::between(S::Running, S::Running), None);
}
