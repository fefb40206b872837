//! Tracing subscriber setup for the hosting binary.
//!
//! Filtering follows `RUST_LOG` (default `info`); output is compact text for
//! local runs or JSON lines for log aggregation.

use tracing_subscriber::EnvFilter;

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact text: timestamp LEVEL target message.
    #[default]
    Compact,
    /// JSON lines, including the current span's fields.
    Json,
}

const DEFAULT_FILTER: &str = "info";

fn build_env_filter() -> anyhow::Result<EnvFilter> {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(DEFAULT_FILTER))
        .map_err(|e| anyhow::anyhow!("invalid tracing filter: {e}"))
}

/// Installs the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if the filter is invalid or a subscriber is already set.
pub fn init_logging(format: LogFormat) -> anyhow::Result<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_env_filter()?)
        .with_target(true);

    let installed = match format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_init_fails_instead_of_panicking() {
        // Whichever call runs first may succeed; the second must report an error.
        let _ = init_logging(LogFormat::Compact);
        assert!(init_logging(LogFormat::Json).is_err());
    }
}
