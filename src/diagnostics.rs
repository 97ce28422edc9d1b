//! Severity-tagged diagnostic sink injected into the batch processor.

use log::{error, info, warn};

/// Receives human-readable run diagnostics.
pub trait Diagnostics {
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
    /// Fatal conditions that end the run.
    fn critical(&self, message: &str);
}

/// Forwards diagnostics to the `log` facade.
///
/// `log` has no critical level, so critical messages go out at error level
/// with a `CRITICAL:` prefix.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn info(&self, message: &str) {
        info!("{message}");
    }

    fn warn(&self, message: &str) {
        warn!("{message}");
    }

    fn error(&self, message: &str) {
        error!("{message}");
    }

    fn critical(&self, message: &str) {
        error!("CRITICAL: {message}");
    }
}
