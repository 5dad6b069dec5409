//! Recording notifier for testing.

use crate::application::error::NotifyError;
use crate::application::ports::Notifier;
use crate::domain::context::Context;
use crate::domain::identity::ReportableError;
use std::sync::{Arc, Mutex};

/// A report handed to the [`RecordingNotifier`].
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct DeliveredReport {
    pub error_kind: String,
    pub error_message: String,
    pub context: Context,
}

#[derive(Debug, Default)]
struct Inner {
    reports: Vec<DeliveredReport>,
    fail_next: Option<NotifyError>,
}

/// Notifier that records every delivery.
///
/// Clones share the same recording, so a test can keep one handle and give
/// another to the reporter.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    inner: Arc<Mutex<Inner>>,
}

impl RecordingNotifier {
    /// Create an empty recording notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next delivery fail with `error`; it is not recorded.
    pub fn fail_next(&self, error: NotifyError) {
        self.lock().fail_next = Some(error);
    }

    /// All recorded reports, oldest first.
    pub fn reports(&self) -> Vec<DeliveredReport> {
        self.lock().reports.clone()
    }

    /// The most recent report.
    pub fn last(&self) -> Option<DeliveredReport> {
        self.lock().reports.last().cloned()
    }

    /// Number of recorded reports.
    pub fn count(&self) -> usize {
        self.lock().reports.len()
    }

    /// Forget all recorded reports.
    pub fn clear(&self) {
        self.lock().reports.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .expect(
                "RecordingNotifier mutex poisoned - a test thread panicked while holding the lock",
            )
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, error: &dyn ReportableError, context: &Context) -> Result<(), NotifyError> {
        let mut inner = self.lock();
        if let Some(err) = inner.fail_next.take() {
            return Err(err);
        }

        inner.reports.push(DeliveredReport {
            error_kind: error.kind().to_string(),
            error_message: error.to_string(),
            context: context.clone(),
        });
        Ok(())
    }
}
