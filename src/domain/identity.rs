//! Error identity resolution for report deduplication.
//!
//! An error identity names a class of errors for throttling purposes. It is
//! resolved, in order of precedence, from:
//! - An explicit key supplied by the caller
//! - A group key the error reports about itself (see [`GroupableError`])
//! - A fingerprint of the error kind and message
//!
//! Occurrences with the same identity share one cooldown window.

use sha2::{Digest, Sha256};
use std::error::Error;
use std::fmt;

/// Number of digest bytes kept in a fingerprint (128 bits).
const FINGERPRINT_BYTES: usize = 16;

/// Optional capability for errors that define their own grouping.
///
/// Useful to collapse every failure of one external dependency under a single
/// identity regardless of the message text.
///
/// # Example
/// ```
/// use report_throttle::{GroupableError, ReportableError};
/// use std::fmt;
///
/// #[derive(Debug)]
/// struct StripeError(String);
///
/// impl fmt::Display for StripeError {
///     fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
///         write!(f, "stripe: {}", self.0)
///     }
/// }
///
/// impl std::error::Error for StripeError {}
///
/// impl GroupableError for StripeError {
///     fn error_group(&self) -> String {
///         "stripe-api:charges".to_string()
///     }
/// }
///
/// impl ReportableError for StripeError {
///     fn as_groupable(&self) -> Option<&dyn GroupableError> {
///         Some(self)
///     }
/// }
/// ```
pub trait GroupableError {
    /// The group identifier used verbatim as the error identity.
    fn error_group(&self) -> String;
}

/// An error value that can be passed to the reporter.
///
/// Both methods have defaults, so most error types only need an empty impl:
///
/// ```
/// use report_throttle::ReportableError;
///
/// #[derive(Debug)]
/// struct Timeout;
///
/// impl std::fmt::Display for Timeout {
///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
///         f.write_str("upstream timed out")
///     }
/// }
///
/// impl std::error::Error for Timeout {}
/// impl ReportableError for Timeout {}
///
/// assert_eq!(Timeout.kind(), "Timeout");
/// ```
pub trait ReportableError: Error + Send + Sync + 'static {
    /// Short name of the error kind, used in fingerprints.
    ///
    /// Defaults to the unqualified type name without generic arguments.
    fn kind(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Returns the grouping capability if this error implements it.
    fn as_groupable(&self) -> Option<&dyn GroupableError> {
        None
    }
}

/// Adapter making any error type reportable.
///
/// Orphan rules prevent implementing [`ReportableError`] for errors defined in
/// other crates; wrap them instead. The kind is the wrapped type's name.
///
/// ```
/// use report_throttle::{ReportableError, Reported};
///
/// let err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
/// let reported = Reported::new(err);
///
/// assert_eq!(reported.kind(), "Error");
/// assert_eq!(reported.to_string(), "disk on fire");
/// ```
#[derive(Debug)]
pub struct Reported<E>(E);

impl<E> Reported<E> {
    /// Wrap an error.
    pub fn new(error: E) -> Self {
        Reported(error)
    }

    /// Borrow the wrapped error.
    pub fn get_ref(&self) -> &E {
        &self.0
    }

    /// Unwrap the error.
    pub fn into_inner(self) -> E {
        self.0
    }
}

impl<E: fmt::Display> fmt::Display for Reported<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl<E: Error + 'static> Error for Reported<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.0.source()
    }
}

impl<E: Error + Send + Sync + 'static> ReportableError for Reported<E> {
    fn kind(&self) -> &str {
        short_type_name(std::any::type_name::<E>())
    }
}

/// Strip the module path and generic arguments from a type name.
fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// A stable key naming a class of errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ErrorIdentity(String);

impl ErrorIdentity {
    /// Resolve the identity of an error occurrence.
    ///
    /// # Arguments
    /// * `error` - The error being reported
    /// * `explicit_key` - Caller-supplied key; always wins when present
    pub fn resolve(error: &dyn ReportableError, explicit_key: Option<&str>) -> Self {
        if let Some(key) = explicit_key {
            return ErrorIdentity(key.to_string());
        }

        if let Some(groupable) = error.as_groupable() {
            return ErrorIdentity(groupable.error_group());
        }

        Self::fingerprint(error.kind(), &error.to_string())
    }

    /// Compute the automatic identity `auto:{kind}:{digest}`, lowercased.
    ///
    /// The digest is the first 128 bits of the SHA-256 of the message, so the
    /// result is stable across processes sharing one store.
    pub fn fingerprint(kind: &str, message: &str) -> Self {
        let digest = Sha256::digest(message.as_bytes());
        let hash = hex::encode(&digest[..FINGERPRINT_BYTES]);

        ErrorIdentity(format!("auto:{}:{}", kind, hash).to_lowercase())
    }

    /// Borrow the identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the identity and return the inner string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<&str> for ErrorIdentity {
    fn from(key: &str) -> Self {
        ErrorIdentity(key.to_string())
    }
}

impl From<String> for ErrorIdentity {
    fn from(key: String) -> Self {
        ErrorIdentity(key)
    }
}

impl AsRef<str> for ErrorIdentity {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ErrorIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
