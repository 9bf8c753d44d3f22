// ABOUTME: Tracing subscriber setup for the CLI.
// ABOUTME: Maps LOG_LEVEL names onto tracing filter directives.

use tracing_subscriber::EnvFilter;

pub const LOG_LEVEL_VAR: &str = "LOG_LEVEL";

/// Translate a `LOG_LEVEL` value into a tracing level.
///
/// Accepts `critical`, `error`, `warning`, `info`, and `debug` in any case.
/// Anything else, including no value at all, means `debug`.
pub fn level_directive(level: Option<&str>) -> &'static str {
    match level.map(|l| l.trim().to_ascii_lowercase()).as_deref() {
        Some("critical" | "error") => "error",
        Some("warning" | "warn") => "warn",
        Some("info") => "info",
        _ => "debug",
    }
}

/// Install the global subscriber. Logs go to stderr so records on stdout stay parseable.
///
/// `verbose` wins over `configured`, which wins over `LOG_LEVEL`.
pub fn init(verbose: bool, configured: Option<&str>) {
    let level = if verbose {
        "debug"
    } else {
        let from_env = std::env::var(LOG_LEVEL_VAR).ok();
        level_directive(configured.or(from_env.as_deref()))
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(level))
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_log_level_names() {
        assert_eq!(level_directive(Some("CRITICAL")), "error");
        assert_eq!(level_directive(Some("error")), "error");
        assert_eq!(level_directive(Some("Warning")), "warn");
        assert_eq!(level_directive(Some("info")), "info");
        assert_eq!(level_directive(Some("debug")), "debug");
    }

    #[test]
    fn unknown_or_missing_level_means_debug() {
        assert_eq!(level_directive(None), "debug");
        assert_eq!(level_directive(Some("loud")), "debug");
    }
}
