//! Error reporting at the binary boundary.

use lqip_core::{AppError, LogLevel};

/// Log `err` at the level it asks for.
pub fn report_error(err: &AppError, context: &str) {
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(error = %err, recoverable = err.is_recoverable(), "{}", context),
        LogLevel::Warn => tracing::warn!(error = %err, recoverable = err.is_recoverable(), "{}", context),
        LogLevel::Error => tracing::error!(error = %err, recoverable = err.is_recoverable(), "{}", context),
    }
}
