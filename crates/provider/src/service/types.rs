use bitflags::bitflags;
use strum::{Display, EnumString, FromRepr, IntoStaticStr};

/// Coarse run state of a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, FromRepr)]
#[strum(ascii_case_insensitive)]
#[repr(u32)]
pub enum ServiceState {
	Stopped = 1,
	#[strum(to_string = "Start Pending")]
	StartPending = 2,
	#[strum(to_string = "Stop Pending")]
	StopPending = 3,
	Running = 4,
	#[strum(to_string = "Continue Pending")]
	ContinuePending = 5,
	#[strum(to_string = "Pause Pending")]
	PausePending = 6,
	Paused = 7,
}

impl ServiceState {
	/// Display string for a raw state value, `"Unknown"` if unrecognized.
	pub fn name_of(value: u32) -> &'static str {
		Self::from_repr(value).map_or("Unknown", Into::into)
	}

	/// Running or paused: the service occupies a host process.
	pub fn is_hosted(self) -> bool {
		matches!(self, Self::Running | Self::Paused)
	}
}

bitflags! {
	/// Kind of service, as reported by the service manager.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct ServiceType: u32 {
		const KERNEL_DRIVER = 0x1;
		const FILE_SYSTEM_DRIVER = 0x2;
		const OWN_PROCESS = 0x10;
		const SHARE_PROCESS = 0x20;
		const INTERACTIVE_PROCESS = 0x100;
	}
}

const SERVICE_TYPE_NAMES: &[(&str, ServiceType)] = &[
	("Driver", ServiceType::KERNEL_DRIVER),
	("FS Driver", ServiceType::FILE_SYSTEM_DRIVER),
	("Own Process", ServiceType::OWN_PROCESS),
	("Share Process", ServiceType::SHARE_PROCESS),
	(
		"Own Interactive Process",
		ServiceType::OWN_PROCESS.union(ServiceType::INTERACTIVE_PROCESS),
	),
	(
		"Share Interactive Process",
		ServiceType::SHARE_PROCESS.union(ServiceType::INTERACTIVE_PROCESS),
	),
];

impl ServiceType {
	/// Display string for an exact type combination, `"Unknown"` otherwise.
	pub fn name(self) -> &'static str {
		SERVICE_TYPE_NAMES
			.iter()
			.find(|(_, ty)| *ty == self)
			.map_or("Unknown", |(name, _)| *name)
	}

	/// Parses a display string, ignoring ASCII case.
	pub fn from_display_name(name: &str) -> Option<Self> {
		SERVICE_TYPE_NAMES
			.iter()
			.find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
			.map(|(_, ty)| *ty)
	}
}

bitflags! {
	/// Control requests a service accepts.
	#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
	pub struct ServiceControls: u32 {
		const STOP = 0x1;
		const PAUSE_CONTINUE = 0x2;
		const SHUTDOWN = 0x4;
		const RELOAD = 0x8;
	}
}

/// When a service is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, FromRepr)]
#[strum(ascii_case_insensitive)]
#[repr(u32)]
pub enum ServiceStartType {
	#[strum(to_string = "Boot Start")]
	Boot = 0,
	#[strum(to_string = "System Start")]
	System = 1,
	#[strum(to_string = "Auto Start")]
	Auto = 2,
	#[strum(to_string = "Demand Start")]
	Demand = 3,
	Disabled = 4,
}

impl ServiceStartType {
	pub fn name_of(value: u32) -> &'static str {
		Self::from_repr(value).map_or("Unknown", Into::into)
	}
}

/// Severity of a service start failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr, FromRepr)]
#[strum(ascii_case_insensitive)]
#[repr(u32)]
pub enum ServiceErrorControl {
	Ignore = 0,
	Normal = 1,
	Severe = 2,
	Critical = 3,
}

impl ServiceErrorControl {
	pub fn name_of(value: u32) -> &'static str {
		Self::from_repr(value).map_or("Unknown", Into::into)
	}
}

/// Secondary configuration, fetched separately from enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceConfig {
	pub start_type: ServiceStartType,
	pub error_control: ServiceErrorControl,
}

/// Mutable part of a tracked service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ServiceStatus {
	pub service_type: ServiceType,
	pub state: ServiceState,
	pub controls_accepted: ServiceControls,
	/// Hosting process, zero when none.
	pub process_id: u32,
}

/// One raw service as enumerated by a [`super::ServiceSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecord {
	/// Case-insensitive primary key.
	pub name: String,
	pub display_name: String,
	pub service_type: ServiceType,
	pub state: ServiceState,
	pub controls_accepted: ServiceControls,
	pub process_id: u32,
}

impl ServiceRecord {
	pub fn status(&self) -> ServiceStatus {
		ServiceStatus {
			service_type: self.service_type,
			state: self.state,
			controls_accepted: self.controls_accepted,
			process_id: self.process_id,
		}
	}
}

/// State transition classified from an old and new status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum ServiceChange {
	Started,
	Continued,
	Paused,
	Stopped,
}

impl ServiceChange {
	pub fn between(old: ServiceState, new: ServiceState) -> Option<Self> {
		use ServiceState as S;
		match (old, new) {
			(S::Stopped | S::StartPending, S::Running) => Some(Self::Started),
			(S::Paused | S::ContinuePending, S::Running) => Some(Self::Continued),
			(S::Running | S::PausePending, S::Paused) => Some(Self::Paused),
			(S::Running | S::StopPending, S::Stopped) => Some(Self::Stopped),
			_ => None,
		}
	}
}
