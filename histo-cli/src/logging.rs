use tracing_subscriber::{fmt, EnvFilter};

const LOG_ENV: &str = "HISTO_LOG";

/// Installs the stderr subscriber. `$HISTO_LOG` takes `EnvFilter` directives
/// (e.g. `debug`, `histo_core=trace`) and wins over the default level.
pub fn init_logging(quiet: bool) {
    let default_level = if quiet { "error" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
