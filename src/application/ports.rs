//! Ports (interfaces) for the application layer.
//!
//! In hexagonal architecture, ports define the interfaces that the application
//! layer needs. Infrastructure adapters implement these ports.

use crate::application::error::{NotifyError, StoreError};
use crate::domain::context::Context;
use crate::domain::identity::ReportableError;
use crate::domain::records::Record;
use chrono::{DateTime, Utc};
use std::fmt::Debug;
use std::time::Duration;

/// Port for obtaining current time.
///
/// Wall-clock time is needed because expiry timestamps are shared with other
/// processes through the store. Infrastructure provides concrete
/// implementations (SystemClock, MockClock).
pub trait Clock: Send + Sync + Debug {
    /// Get the current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Port for the expiring key-value store holding all throttling state.
///
/// TTLs are relative and set at write time. A key must read as absent at or
/// after its expiry; no other consistency guarantee is assumed.
/// Infrastructure provides concrete implementations (MemoryStore, RedisStore).
pub trait ExpiringStore: Send + Sync + Debug {
    /// Read the record stored under `key`.
    fn get(&self, key: &str) -> Result<Option<Record>, StoreError>;

    /// Write a record that expires after `ttl`.
    fn set(&self, key: &str, record: Record, ttl: Duration) -> Result<(), StoreError>;

    /// Check whether a live record exists under `key`.
    fn has(&self, key: &str) -> Result<bool, StoreError>;

    /// Remove the record under `key`, if any.
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Port for delivering a report to its destination.
///
/// Duplicate calls must be merely wasteful, never harmful.
pub trait Notifier: Send + Sync + Debug {
    /// Deliver an error together with its enriched context.
    ///
    /// # Errors
    /// A delivery failure is propagated unchanged to the caller of `report`.
    fn notify(&self, error: &dyn ReportableError, context: &Context) -> Result<(), NotifyError>;
}
