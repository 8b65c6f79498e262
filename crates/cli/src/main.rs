//! Vigil command-line frontend.
//!
//! Runs the service and process providers against the host and prints
//! every added, modified and removed item until interrupted.

mod cli;
mod logging;
mod report;
mod sources;
#[cfg(test)]
mod tests;

use clap::Parser;
use cli::Cli;
use sources::{SysinfoProcessSource, SystemctlServiceSource};
use tracing::info;
use vigil_provider::Monitor;
use vigil_provider::process::ProcessSource;
use vigil_provider::service::ServiceSource;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	let config = cli.resolve_config()?;
	logging::setup_tracing(cli.verbose, config.log_filter.as_deref());

	if !vigil_worker::set_blocking_pool_limit(config.reclaim_threads) {
		tracing::warn!(threads = config.reclaim_threads, "blocking pool already running, limit ignored");
	}
	vigil_object::initialize();

	let service_source: Option<Box<dyn ServiceSource>> = if cfg!(target_os = "linux") {
		Some(Box::new(SystemctlServiceSource::new()))
	} else {
		info!("no service source on this platform");
		None
	};
	let process_source: Box<dyn ProcessSource> = Box::new(SysinfoProcessSource::new());

	let monitor = Monitor::new(config, service_source, Some(process_source));
	report::attach(&monitor);

	match cli.cycles {
		Some(cycles) => {
			let interval = monitor.config().interval();
			for round in 0..cycles {
				if round > 0 {
					tokio::time::sleep(interval).await;
				}
				monitor.run_once();
			}
		}
		None => {
			monitor.start()?;
			info!(interval = ?monitor.config().interval(), "vigil started");
			tokio::signal::ctrl_c().await?;
			info!("shutting down");
			monitor.stop();
		}
	}

	let status = monitor.status();
	info!(
		rounds = status.rounds,
		services = status.services,
		processes = status.processes,
		"vigil.exit"
	);
	for worker in status.workers.iter().filter(|w| w.failures > 0) {
		tracing::warn!(
			provider = %worker.name,
			failures = worker.failures,
			last_error = worker.last_error.as_deref().unwrap_or_default(),
			"provider had failed rounds"
		);
	}

	Ok(())
}
