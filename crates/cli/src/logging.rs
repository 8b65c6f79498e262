use tracing_subscriber::EnvFilter;

/// Installs the stderr subscriber.
///
/// `RUST_LOG` wins; otherwise `--verbose`, then the config file's
/// `log_filter`, then `info`.
pub fn setup_tracing(verbose: bool, log_filter: Option<&str>) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, log_filter)));

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(true)
		.init();
}

fn default_directive(verbose: bool, log_filter: Option<&str>) -> String {
	match (verbose, log_filter) {
		(true, _) => "vigil=debug,vigil_provider=debug,vigil_object=debug,info".to_string(),
		(false, Some(filter)) => filter.to_string(),
		(false, None) => "info".to_string(),
	}
}

#[cfg(test)]
mod tests {
	use super::default_directive;

	#[test]
	fn verbose_overrides_config_filter() {
		assert!(default_directive(true, Some("warn")).contains("vigil_provider=debug"));
		assert_eq!(default_directive(false, Some("warn")), "warn");
		assert_eq!(default_directive(false, None), "info");
	}
}
