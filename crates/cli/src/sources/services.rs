//! Service source backed by `systemctl`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::process::{Command, Output};

use vigil_provider::SourceError;
use vigil_provider::service::{
	ServiceConfig, ServiceControls, ServiceErrorControl, ServiceRecord, ServiceSource, ServiceStartType,
	ServiceState, ServiceType,
};

const UNIT_SUFFIX: &str = ".service";

/// Enumerates systemd service units.
///
/// One `list-units` call gives names and states, one batched `show` call
/// gives main PIDs. Start type comes from `is-enabled`.
pub struct SystemctlServiceSource {
	program: PathBuf,
}

impl SystemctlServiceSource {
	pub fn new() -> Self {
		Self::with_program("systemctl")
	}

	pub fn with_program(program: impl Into<PathBuf>) -> Self {
		Self { program: program.into() }
	}

	fn output(&self, args: &[&str]) -> Result<Output, SourceError> {
		Ok(Command::new(&self.program).args(args).output()?)
	}

	fn checked(&self, args: &[&str]) -> Result<String, SourceError> {
		let output = self.output(args)?;
		if !output.status.success() {
			let stderr = String::from_utf8_lossy(&output.stderr);
			return Err(SourceError::Enumeration(format!(
				"systemctl {} exited with {}: {}",
				args.first().copied().unwrap_or_default(),
				output.status,
				stderr.trim()
			)));
		}
		String::from_utf8(output.stdout).map_err(|err| SourceError::Parse(err.to_string()))
	}

	fn main_pids(&self, units: &[UnitLine]) -> Result<HashMap<String, u32>, SourceError> {
		if units.is_empty() {
			return Ok(HashMap::new());
		}
		let mut args = vec!["show", "--no-pager", "--property=Id,MainPID", "--"];
		args.extend(units.iter().map(|unit| unit.unit.as_str()));
		Ok(parse_main_pids(&self.checked(&args)?))
	}
}

impl Default for SystemctlServiceSource {
	fn default() -> Self {
		Self::new()
	}
}

impl ServiceSource for SystemctlServiceSource {
	fn enumerate(&self) -> Result<Vec<ServiceRecord>, SourceError> {
		let listing = self.checked(&[
			"list-units",
			"--type=service",
			"--all",
			"--no-legend",
			"--plain",
			"--no-pager",
		])?;
		let units = parse_unit_list(&listing);
		let pids = self.main_pids(&units)?;
		Ok(units.into_iter().map(|unit| unit.into_record(&pids)).collect())
	}

	fn query_config(&self, name: &str) -> Option<ServiceConfig> {
		let unit = format!("{name}{UNIT_SUFFIX}");
		// Non-zero exit is normal for disabled units; stdout still names the state.
		let output = match self.output(&["is-enabled", "--", unit.as_str()]) {
			Ok(output) => output,
			Err(err) => {
				tracing::debug!(service = name, error = %err, "systemctl.is_enabled.failed");
				return None;
			}
		};
		let stdout = String::from_utf8_lossy(&output.stdout);
		let start_type = start_type_for(stdout.lines().next()?.trim())?;
		Some(ServiceConfig {
			start_type,
			error_control: ServiceErrorControl::Normal,
		})
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct UnitLine {
	unit: String,
	active: String,
	description: String,
}

impl UnitLine {
	fn into_record(self, pids: &HashMap<String, u32>) -> ServiceRecord {
		let state = state_for(&self.active);
		let process_id = pids.get(&self.unit).copied().unwrap_or(0);
		let controls_accepted = match state {
			ServiceState::Running => ServiceControls::STOP | ServiceControls::RELOAD,
			ServiceState::StartPending => ServiceControls::STOP,
			_ => ServiceControls::empty(),
		};
		let name = self.unit.strip_suffix(UNIT_SUFFIX).unwrap_or(&self.unit).to_string();
		let display_name = if self.description.is_empty() {
			name.clone()
		} else {
			self.description
		};
		ServiceRecord {
			name,
			display_name,
			service_type: ServiceType::OWN_PROCESS,
			state,
			controls_accepted,
			process_id,
		}
	}
}

/// Parses `list-units --no-legend --plain` output.
fn parse_unit_list(text: &str) -> Vec<UnitLine> {
	text.lines()
		.filter_map(|line| {
			let mut fields = line.split_whitespace().skip_while(|field| matches!(*field, "●" | "*"));
			let unit = fields.next()?;
			if !unit.ends_with(UNIT_SUFFIX) {
				return None;
			}
			let _load = fields.next()?;
			let active = fields.next()?;
			let _sub = fields.next()?;
			Some(UnitLine {
				unit: unit.to_string(),
				active: active.to_string(),
				description: fields.collect::<Vec<_>>().join(" "),
			})
		})
		.collect()
}

/// Parses blank-line separated `show -p Id,MainPID` blocks.
fn parse_main_pids(text: &str) -> HashMap<String, u32> {
	let mut pids = HashMap::new();
	let mut id = None;
	let mut pid = None;
	for line in text.lines().chain(std::iter::once("")) {
		let line = line.trim();
		if line.is_empty() {
			if let (Some(id), Some(pid)) = (id.take(), pid.take()) {
				pids.insert(id, pid);
			}
			continue;
		}
		match line.split_once('=') {
			Some(("Id", value)) => id = Some(value.to_string()),
			Some(("MainPID", value)) => pid = value.parse::<u32>().ok(),
			_ => {}
		}
	}
	pids
}

fn state_for(active: &str) -> ServiceState {
	match active {
		"active" | "reloading" | "refreshing" => ServiceState::Running,
		"activating" => ServiceState::StartPending,
		"deactivating" | "maintenance" => ServiceState::StopPending,
		_ => ServiceState::Stopped,
	}
}

fn start_type_for(enabled: &str) -> Option<ServiceStartType> {
	Some(match enabled {
		"enabled" | "enabled-runtime" | "linked" | "linked-runtime" => ServiceStartType::Auto,
		"static" | "indirect" | "generated" | "alias" | "transient" => ServiceStartType::Demand,
		"disabled" | "masked" | "masked-runtime" => ServiceStartType::Disabled,
		_ => return None,
	})
}
