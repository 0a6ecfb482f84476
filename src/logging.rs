use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "social=info";

/// Installs the global fmt subscriber. Safe to call more than once; the Spin
/// component calls it on every request.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
