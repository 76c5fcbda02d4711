//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

/// Picks the log filter: `RUST_LOG` wins, then `--verbose`, then the
/// configured level.
pub fn filter_directive(rust_log: Option<&str>, verbose: bool, configured: &str) -> String {
    match rust_log.map(str::trim).filter(|s| !s.is_empty()) {
        Some(directive) => directive.to_string(),
        None if verbose => "debug".to_string(),
        None => configured.to_string(),
    }
}

/// Installs the global fmt subscriber.
///
/// Calling it twice is harmless; the second call leaves the first
/// subscriber in place.
pub fn init_logging(verbose: bool, configured: &str) {
    let directive = filter_directive(std::env::var("RUST_LOG").ok().as_deref(), verbose, configured);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_log_wins() {
        assert_eq!(filter_directive(Some("rollcall=trace"), true, "warn"), "rollcall=trace");
    }

    #[test]
    fn test_verbose_over_configured() {
        assert_eq!(filter_directive(None, true, "warn"), "debug");
        assert_eq!(filter_directive(Some("  "), true, "warn"), "debug");
    }

    #[test]
    fn test_configured_fallback() {
        assert_eq!(filter_directive(None, false, "warn"), "warn");
    }
}
