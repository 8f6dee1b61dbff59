use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Map a user-supplied level name to a filter directive.
/// Unknown names fall back to the default level.
pub fn level_directive(level: &str) -> &'static str {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "info" => "info",
        "warn" | "warning" => "warn",
        "error" | "fatal" | "panic" => "error",
        _ => DEFAULT_LOG_LEVEL,
    }
}

/// Install the global subscriber, writing to stderr so stdout stays clean
/// for rendered output. RUST_LOG wins over `level` when set.
pub fn init(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_directive(level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    tracing::debug!(level, "Logger initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_directive() {
        assert_eq!(level_directive("debug"), "debug");
        assert_eq!(level_directive("WARNING"), "warn");
        assert_eq!(level_directive(" error "), "error");
        assert_eq!(level_directive("fatal"), "error");
        assert_eq!(level_directive("verbose"), "info");
        assert_eq!(level_directive(""), "info");
    }
}
