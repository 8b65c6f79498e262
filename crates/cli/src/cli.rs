use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use vigil_provider::MonitorConfig;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "vigil")]
#[command(about = "Watch services and processes and print what changes")]
#[command(version)]
pub struct Cli {
	/// TOML configuration file
	#[arg(short, long, value_name = "PATH")]
	pub config: Option<PathBuf>,

	/// Provider interval in milliseconds
	#[arg(long, value_name = "MS")]
	pub interval_ms: Option<u64>,

	/// Do not track services
	#[arg(long)]
	pub no_services: bool,

	/// Do not track processes
	#[arg(long)]
	pub no_processes: bool,

	/// Run this many rounds in the foreground, then exit
	#[arg(long, value_name = "N")]
	pub cycles: Option<u64>,

	/// Verbose logging
	#[arg(short, long)]
	pub verbose: bool,
}

impl Cli {
	/// Loads the config file, if any, and applies command-line overrides.
	pub fn resolve_config(&self) -> anyhow::Result<MonitorConfig> {
		let mut config = match &self.config {
			Some(path) => load_config(path)?,
			None => MonitorConfig::default(),
		};
		if let Some(interval_ms) = self.interval_ms {
			config.interval_ms = interval_ms;
		}
		if self.no_services {
			config.services = false;
		}
		if self.no_processes {
			config.processes = false;
		}
		Ok(config)
	}
}

pub fn load_config(path: &Path) -> anyhow::Result<MonitorConfig> {
	let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
	toml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}
