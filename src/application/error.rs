//! Errors surfaced by the reporter and its ports.

use std::fmt;

/// Error returned by an expiring store adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backend could not be reached or rejected the command
    Backend(String),
    /// A record could not be encoded or had an unexpected shape
    Codec(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Backend(msg) => write!(f, "store backend error: {}", msg),
            StoreError::Codec(msg) => write!(f, "store record error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// Error returned by a notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    /// The report could not be delivered
    Delivery(String),
}

impl NotifyError {
    /// Build a delivery error from any displayable cause.
    pub fn delivery(cause: impl fmt::Display) -> Self {
        NotifyError::Delivery(cause.to_string())
    }
}

impl fmt::Display for NotifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotifyError::Delivery(msg) => write!(f, "report delivery failed: {}", msg),
        }
    }
}

impl std::error::Error for NotifyError {}

/// Error returned by [`RateLimitedReporter::report`](crate::RateLimitedReporter::report).
///
/// Nothing is retried or swallowed: masking a failure here could hide the very
/// error the caller is trying to report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    /// The state store failed
    Store(StoreError),
    /// The notifier failed
    Notify(NotifyError),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::Store(e) => write!(f, "{}", e),
            ReportError::Notify(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ReportError::Store(e) => Some(e),
            ReportError::Notify(e) => Some(e),
        }
    }
}

impl From<StoreError> for ReportError {
    fn from(e: StoreError) -> Self {
        ReportError::Store(e)
    }
}

impl From<NotifyError> for ReportError {
    fn from(e: NotifyError) -> Self {
        ReportError::Notify(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display() {
        let err = ReportError::from(StoreError::Backend("connection refused".to_string()));
        assert_eq!(err.to_string(), "store backend error: connection refused");

        let err = ReportError::from(NotifyError::delivery("503 Service Unavailable"));
        assert_eq!(
            err.to_string(),
            "report delivery failed: 503 Service Unavailable"
        );
    }

    #[test]
    fn test_source_is_exposed() {
        let err = ReportError::from(StoreError::Codec("bad".to_string()));
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("store record error: bad"));
    }
}
