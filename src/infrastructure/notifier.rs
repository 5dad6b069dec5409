//! Notifier writing delivered reports to the log.

use crate::application::error::NotifyError;
use crate::application::ports::Notifier;
use crate::domain::context::Context;
use crate::domain::identity::ReportableError;
use serde_json::Value;

/// Notifier that writes each delivered report as a `tracing` error event.
///
/// The enriched context is attached as a JSON string so that any subscriber
/// can render it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl LogNotifier {
    /// Create a log notifier.
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, error: &dyn ReportableError, context: &Context) -> Result<(), NotifyError> {
        let context = Value::Object(context.clone());
        tracing::error!(
            target: "report_throttle::notifier",
            kind = error.kind(),
            context = %context,
            "{}",
            error
        );
        Ok(())
    }
}
