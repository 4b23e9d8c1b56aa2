//! Global subscriber installation.

use tracing_subscriber::EnvFilter;

/// Error returned when a global subscriber is already installed.
pub type InitError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Installs the global `fmt` subscriber.
///
/// `filter` uses `EnvFilter` directive syntax, e.g. `podflow=debug`. The
/// `RUST_LOG` variable wins when set.
///
/// # Errors
///
/// Fails if the filter does not parse or a global subscriber already exists.
pub fn init_tracing(filter: &str, format: LogFormat) -> Result<(), InitError> {
    let env_filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.is_empty() => EnvFilter::try_new(directives)?,
        _ => EnvFilter::try_new(filter)?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(env_filter).with_target(true);
    match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_fails() {
        let _ = init_tracing("podflow=debug", LogFormat::Pretty);
        assert!(init_tracing("podflow=debug", LogFormat::Json).is_err());
    }
}
