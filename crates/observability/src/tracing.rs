//! JSON logging to stdout, filtered through `RUST_LOG`.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_DIRECTIVE: &str = "info";

/// Resolve the filter: `RUST_LOG` when it parses, otherwise `default`.
pub fn filter_from(env_value: Option<&str>, default: &str) -> EnvFilter {
    env_value
        .filter(|v| !v.trim().is_empty())
        .and_then(|v| EnvFilter::try_new(v).ok())
        .unwrap_or_else(|| EnvFilter::new(default))
}

/// Install the global subscriber. A subscriber that is already installed
/// wins.
pub fn init(default: &str) {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = filter_from(env.as_deref(), default);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
