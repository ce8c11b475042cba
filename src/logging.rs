//! Tracing subscriber setup
//!
//! `RUST_LOG` wins over the configured level, e.g.
//! `RUST_LOG=typhoon_monitor::threat=debug`.

use tracing_subscriber::{EnvFilter, fmt};

use crate::config::LoggingConfig;

/// Install the global subscriber on stderr, leaving stdout to the report.
/// Calling it twice is a no-op.
pub fn init(config: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .with_writer(std::io::stderr);

    let result = if config.format == "json" {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if let Err(e) = result {
        tracing::debug!(error = %e, "tracing subscriber already installed");
    }
}

/// Verbose subscriber that writes through the test harness
pub fn init_test() {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init()
    {
        tracing::debug!(error = %e, "test subscriber already installed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_init_is_harmless() {
        init_test();
        init_test();
        init(&LoggingConfig {
            level: "info".to_string(),
            format: "json".to_string(),
        });
    }
}
