//! Tracing subscriber setup for binaries embedding the dispatcher.

use tracing_subscriber::EnvFilter;

/// Error returned when the subscriber cannot be installed.
pub type InitError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Output format for [`init_tracing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable single-line output.
    #[default]
    Text,
    /// Newline-delimited JSON.
    Json,
}

/// Builds the filter from explicit directives, then `RUST_LOG`, then `info`.
pub fn env_filter(directives: Option<&str>) -> Result<EnvFilter, InitError> {
    match directives {
        Some(directives) => Ok(EnvFilter::try_new(directives)?),
        None => Ok(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))),
    }
}

/// Installs a global fmt subscriber.
///
/// Fails instead of panicking if a global subscriber is already set.
pub fn init_tracing(directives: Option<&str>, format: LogFormat) -> Result<(), InitError> {
    let filter = env_filter(directives)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
}
