use parking_lot::Mutex;
use sysinfo::{ProcessesToUpdate, System};
use vigil_provider::SourceError;
use vigil_provider::process::{ProcessRecord, ProcessSource, ProcessStatus};

/// Process table read through `sysinfo`.
///
/// CPU usage is relative to the previous refresh, so the first batch
/// reports zero for every process.
pub struct SysinfoProcessSource {
	system: Mutex<System>,
}

impl SysinfoProcessSource {
	pub fn new() -> Self {
		Self {
			system: Mutex::new(System::new()),
		}
	}
}

impl Default for SysinfoProcessSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ProcessSource for SysinfoProcessSource {
	fn enumerate(&self) -> Result<Vec<ProcessRecord>, SourceError> {
		let mut system = self.system.lock();
		system.refresh_processes(ProcessesToUpdate::All, true);

		let records: Vec<_> = system
			.processes()
			.values()
			.filter(|process| process.thread_kind().is_none())
			.map(|process| ProcessRecord {
				pid: process.pid().as_u32(),
				parent_pid: process.parent().map(|pid| pid.as_u32()),
				name: process.name().to_string_lossy().into_owned(),
				status: map_status(process.status()),
				memory_bytes: process.memory(),
				cpu_usage: process.cpu_usage(),
			})
			.collect();

		if records.is_empty() {
			return Err(SourceError::Enumeration("process table is empty".into()));
		}
		Ok(records)
	}
}

fn map_status(status: sysinfo::ProcessStatus) -> ProcessStatus {
	use sysinfo::ProcessStatus as Os;
	match status {
		Os::Run => ProcessStatus::Running,
		Os::Sleep | Os::UninterruptibleDiskSleep | Os::LockBlocked | Os::Waking | Os::Wakekill | Os::Parked => {
			ProcessStatus::Sleeping
		}
		Os::Idle => ProcessStatus::Idle,
		Os::Stop | Os::Tracing => ProcessStatus::Stopped,
		Os::Zombie => ProcessStatus::Zombie,
		Os::Dead => ProcessStatus::Dead,
		_ => ProcessStatus::Unknown,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn status_mapping() {
		assert_eq!(map_status(sysinfo::ProcessStatus::Run), ProcessStatus::Running);
		assert_eq!(map_status(sysinfo::ProcessStatus::UninterruptibleDiskSleep), ProcessStatus::Sleeping);
		assert_eq!(map_status(sysinfo::ProcessStatus::Tracing), ProcessStatus::Stopped);
		assert_eq!(map_status(sysinfo::ProcessStatus::Unknown(99)), ProcessStatus::Unknown);
	}

	#[test]
	fn enumerates_current_process() {
		let source = SysinfoProcessSource::new();
		let records = source.enumerate().unwrap();
		let me = std::process::id();
		assert!(records.iter().any(|record| record.pid == me));
	}
}
