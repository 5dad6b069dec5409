//! # report-throttle
//!
//! Deduplication and cooldown-based throttling for error reports.
//!
//! Every reported error is resolved to an identity. The first occurrence of an
//! identity is delivered to a [`Notifier`] and opens a cooldown window; further
//! occurrences inside the window are counted and suppressed. The next delivery
//! after the window carries what was missed: how many occurrences happened,
//! how many were throttled and which users were affected.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use report_throttle::{Context, LogNotifier, RateLimitedReporter, ReportableError};
//! use std::time::Duration;
//!
//! #[derive(Debug)]
//! struct PaymentFailed;
//!
//! impl std::fmt::Display for PaymentFailed {
//!     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
//!         f.write_str("payment provider rejected the charge")
//!     }
//! }
//!
//! impl std::error::Error for PaymentFailed {}
//! impl ReportableError for PaymentFailed {}
//!
//! let reporter = RateLimitedReporter::builder()
//!     .with_cooldown(Duration::from_secs(30 * 60))
//!     .with_max_tracked_users(100)
//!     .build(LogNotifier::new())
//!     .unwrap();
//!
//! let mut context = Context::new();
//! context.insert("user_id".to_string(), 42.into());
//!
//! reporter.report(&PaymentFailed, context, None).unwrap();
//! ```
//!
//! ## Error Identity
//!
//! An identity is chosen in this order:
//! 1. The explicit key passed to [`RateLimitedReporter::report`]
//! 2. The group of an error implementing [`GroupableError`]
//! 3. A fingerprint of the error kind and message:
//!    `auto:{kind}:{first 32 hex chars of sha256(message)}`, lowercased
//!
//! ```rust
//! use report_throttle::ErrorIdentity;
//!
//! let id = ErrorIdentity::fingerprint("Kind", "hello");
//! assert!(id.as_str().starts_with("auto:kind:"));
//! ```
//!
//! Errors from other crates are reported through the [`Reported`] wrapper:
//!
//! ```rust,no_run
//! # use report_throttle::{Context, LogNotifier, RateLimitedReporter, Reported};
//! # let reporter = RateLimitedReporter::builder().build(LogNotifier::new()).unwrap();
//! if let Err(err) = std::fs::read("/etc/app.toml") {
//!     reporter.report(&Reported::new(err), Context::new(), None).unwrap();
//! }
//! ```
//!
//! ## Enriched Context
//!
//! Delivered reports carry the caller's context plus:
//! - `affected_users`, `affected_user_count`, `user_tracking_capped`
//! - `occurrences` and `throttled` since the previous delivery
//! - `key` and `reported_at`
//!
//! ## Capacity
//!
//! At most `max_tracked_errors` identities hold a cooldown window at once.
//! Once the cap is reached, occurrences of untracked identities are delivered
//! immediately with `tracking_limit_reached: true` and leave no state behind.
//! Identities already in a window keep being throttled.
//!
//! ## Shared State
//!
//! All state lives in an [`ExpiringStore`]. Reporters sharing a store share
//! their windows; with the `redis-storage` feature a [`RedisStore`] shares them
//! across processes.
//!
//! ## Observability
//!
//! ```rust,no_run
//! # use report_throttle::{LogNotifier, RateLimitedReporter};
//! # let reporter = RateLimitedReporter::builder().build(LogNotifier::new()).unwrap();
//! let snapshot = reporter.metrics().snapshot();
//! println!("delivered: {}", snapshot.reports_delivered);
//! println!("suppressed: {}", snapshot.reports_suppressed);
//! println!("bypassed: {}", snapshot.reports_bypassed);
//! ```
//!
//! With `debug` enabled every decision is also logged through `tracing`
//! under the `report_throttle` target.

// Domain layer - pure types
pub mod domain;

// Application layer - orchestration
pub mod application;

// Infrastructure layer - external adapters
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use domain::{
    context::Context,
    identity::{ErrorIdentity, GroupableError, ReportableError, Reported},
    records::{AffectedUsers, OccurrenceStats, Record, TrackedErrors, UserId},
};

pub use application::{
    config::{Config, ConfigError},
    error::{NotifyError, ReportError, StoreError},
    metrics::{Metrics, MetricsSnapshot},
    ports::{Clock, ExpiringStore, Notifier},
    reporter::{Outcome, RateLimitedReporter},
};

pub use infrastructure::{
    builder::ReporterBuilder, clock::SystemClock, memory_store::MemoryStore,
    notifier::LogNotifier,
};

#[cfg(feature = "redis-storage")]
pub use infrastructure::redis_store::{RedisStore, RedisStoreConfig};
