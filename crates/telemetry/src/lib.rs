//! Tracing/logging pipeline for bookworm.

use bookworm_kernel::settings::{LogFormat, TelemetrySettings};
use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber according to telemetry settings.
///
/// Honors `RUST_LOG` when set, defaulting to `info`. Safe to call more than
/// once; subsequent calls are no-ops.
pub fn init(settings: &TelemetrySettings) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = match settings.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Pretty => builder.try_init(),
    };

    if result.is_ok() {
        tracing::debug!(target: "bookworm-telemetry", format = ?settings.log_format, "telemetry initialized");
    }
}
