//! Subscriber setup

use tracing_subscriber::EnvFilter;

/// Filter directive: `RUST_LOG`, else the configured filter, else `info`
///
/// `verbose` raises the fallback to `debug` but never overrides `RUST_LOG`.
pub fn filter_directive(env: Option<String>, configured: Option<&str>, verbose: bool) -> String {
    if let Some(env) = env.filter(|s| !s.trim().is_empty()) {
        return env;
    }
    if verbose {
        return "debug".to_string();
    }
    configured.unwrap_or("info").to_string()
}

/// Install the global fmt subscriber
pub fn init_logging(configured: Option<&str>, verbose: bool) {
    let directive = filter_directive(std::env::var("RUST_LOG").ok(), configured, verbose);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
