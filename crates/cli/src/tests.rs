use std::io::Write;

use clap::Parser;

use crate::cli::{Cli, load_config};

#[test]
fn test_config_file_then_flags() {
	let mut file = tempfile::NamedTempFile::new().unwrap();
	writeln!(file, "interval_ms = 250\nprocesses = false\nlog_filter = \"warn\"").unwrap();
	let path = file.path().to_str().unwrap().to_string();

	let cli = Cli::try_parse_from(["vigil", "--config", path.as_str()]).unwrap();
	let config = cli.resolve_config().unwrap();
	assert_eq!(config.interval_ms, 250);
	assert!(config.services);
	assert!(!config.processes);
	assert_eq!(config.log_filter.as_deref(), Some("warn"));

	let cli = Cli::try_parse_from(["vigil", "--config", path.as_str(), "--interval-ms", "50", "--no-services"]).unwrap();
	let config = cli.resolve_config().unwrap();
	assert_eq!(config.interval_ms, 50);
	assert!(!config.services);
}

#[test]
fn test_unknown_config_key_is_rejected() {
	let mut file = tempfile::NamedTempFile::new().unwrap();
	writeln!(file, "interval = 5").unwrap();
	let err = load_config(file.path()).unwrap_err();
	assert!(format!("{err:#}").contains("parsing"));
}

#[test]
fn test_missing_config_file() {
	let dir = tempfile::tempdir().unwrap();
	let err = load_config(&dir.path().join("absent.toml")).unwrap_err();
	assert!(err.to_string().starts_with("reading"));
}

#[test]
fn test_defaults_without_arguments() {
	let cli = Cli::try_parse_from(["vigil", "--cycles", "2", "-v"]).unwrap();
	assert_eq!(cli.cycles, Some(2));
	assert!(cli.verbose);
	let config = cli.resolve_config().unwrap();
	assert_eq!(config, vigil_provider::MonitorConfig::default());
}
