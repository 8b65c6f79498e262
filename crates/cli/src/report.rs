//! Prints provider events to stdout.

use vigil_provider::Monitor;

/// Subscribes printers to every provider the monitor runs.
pub fn attach(monitor: &Monitor) {
	if let Some(services) = monitor.services() {
		let events = services.events();
		events.added.register(|service| {
			println!("+ service {} [{}] {}", service.name(), service.state(), service.display_name());
		});
		events.modified.register(|m| match m.change() {
			Some(change) => println!("~ service {} {} ({} -> {})", m.service.name(), change, m.old.state, m.new.state),
			None => println!("~ service {} {}", m.service.name(), m.new.state),
		});
		events.removed.register(|service| println!("- service {}", service.name()));
	}

	if let Some(processes) = monitor.processes() {
		let events = processes.events();
		events.added.register(|process| println!("+ process {} {}", process.pid(), process.name()));
		events.removed.register(|process| println!("- process {} {}", process.pid(), process.name()));
	}
}
