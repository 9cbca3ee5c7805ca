//! Logging and tracing bootstrap.

use anyhow::Context;
use bookshelf_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::EnvFilter;

/// Build the event filter, preferring `RUST_LOG` over the configured directive.
pub fn filter(settings: &TelemetrySettings) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&settings.filter)
            .with_context(|| format!("invalid log filter '{}'", settings.filter)),
    }
}

/// Install the global tracing subscriber.
///
/// Installing twice is not an error; the first subscriber wins and later calls
/// return `false`.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<bool> {
    let filter = filter(settings)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match settings.log_format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };

    match installed {
        Ok(()) => {
            tracing::info!(
                target: "bookshelf-telemetry",
                format = ?settings.log_format,
                "telemetry initialized"
            );
            Ok(true)
        }
        Err(err) => {
            tracing::debug!(
                target: "bookshelf-telemetry",
                error = %err,
                "tracing subscriber already installed, keeping it"
            );
            Ok(false)
        }
    }
}
