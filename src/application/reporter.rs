//! Report orchestration.
//!
//! The reporter is the single entry point: it resolves the identity, asks the
//! capacity guard for admission, updates the ledger and either hands the
//! report to the notifier or suppresses it.
//!
//! Per identity the states are: fresh (no marker) -> reporting (delivered,
//! marker set) -> suppressed (marker present) -> fresh once the marker expires.
//! Bypass is an orthogonal path taken only at capacity.

use crate::application::capacity::CapacityGuard;
use crate::application::config::Config;
use crate::application::error::ReportError;
use crate::application::ledger::TrackingLedger;
use crate::application::metrics::Metrics;
use crate::application::ports::{Clock, ExpiringStore, Notifier};
use crate::application::state::StateStore;
use crate::domain::context::{self, Context};
use crate::domain::identity::{ErrorIdentity, ReportableError};
use crate::domain::records::{AffectedUsers, OccurrenceStats};
use std::sync::Arc;

/// What happened to a reported occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Delivered to the notifier and a cooldown window started
    Delivered,
    /// Counted and suppressed inside an active cooldown window
    Suppressed,
    /// Delivered without throttling because tracking capacity is exhausted
    Bypassed,
}

impl Outcome {
    /// Whether the notifier was called.
    pub fn is_delivered(&self) -> bool {
        matches!(self, Outcome::Delivered | Outcome::Bypassed)
    }
}

/// Deduplicating, cooldown-based error reporter.
///
/// Holds no mutable state of its own besides metrics; everything lives in the
/// store, so several instances (even with different cooldowns) can share it.
#[derive(Debug, Clone)]
pub struct RateLimitedReporter {
    notifier: Arc<dyn Notifier>,
    ledger: TrackingLedger,
    capacity: CapacityGuard,
    clock: Arc<dyn Clock>,
    config: Config,
    metrics: Metrics,
}

impl RateLimitedReporter {
    /// Create a reporter from already validated parts.
    ///
    /// Prefer [`RateLimitedReporter::builder`], which validates the config.
    pub fn new(
        notifier: Arc<dyn Notifier>,
        store: Arc<dyn ExpiringStore>,
        clock: Arc<dyn Clock>,
        config: Config,
    ) -> Self {
        let state = StateStore::new(store);
        let ledger = TrackingLedger::new(state.clone(), config.cooldown, config.max_tracked_users);
        let capacity = CapacityGuard::new(
            state,
            Arc::clone(&clock),
            config.cooldown,
            config.max_tracked_errors,
        );

        Self {
            notifier,
            ledger,
            capacity,
            clock,
            config,
            metrics: Metrics::new(),
        }
    }

    /// Report an error occurrence.
    ///
    /// # Arguments
    /// * `error` - The error being reported
    /// * `context` - Caller context, forwarded (enriched) to the notifier
    /// * `key` - Explicit identity; overrides grouping and fingerprinting
    ///
    /// # Errors
    /// Store and notifier failures propagate unchanged. If the notifier
    /// fails, no cooldown window is started and the next occurrence reports
    /// again.
    pub fn report(
        &self,
        error: &dyn ReportableError,
        context: Context,
        key: Option<&str>,
    ) -> Result<Outcome, ReportError> {
        let identity = ErrorIdentity::resolve(error, key);

        if self.capacity.should_bypass(&identity)? {
            self.deliver_bypassed(error, context, &identity)?;
            self.metrics.record_bypassed();
            return Ok(Outcome::Bypassed);
        }

        self.ledger.track_user(&identity, context::user_id(&context))?;
        let stats = self.ledger.bump_occurrence(&identity)?;

        if self.ledger.is_throttled(&identity)? {
            let stats = self.ledger.record_throttled(&identity, stats)?;
            if self.config.debug {
                tracing::debug!(
                    target: "report_throttle",
                    key = %identity,
                    occurrences = stats.occurrences,
                    throttled = stats.throttled,
                    "error throttled"
                );
            }
            self.metrics.record_suppressed();
            return Ok(Outcome::Suppressed);
        }

        self.deliver(error, context, &identity, stats)?;
        self.metrics.record_delivered();
        Ok(Outcome::Delivered)
    }

    /// Deliver, then start the window: activate, admit, clear.
    fn deliver(
        &self,
        error: &dyn ReportableError,
        context: Context,
        identity: &ErrorIdentity,
        stats: OccurrenceStats,
    ) -> Result<(), ReportError> {
        let users = self.ledger.affected_users(identity)?;
        let enriched = context::enrich_for_delivery(
            context,
            identity,
            stats,
            &users,
            self.config.max_tracked_users,
            self.clock.now(),
        );

        self.notifier.notify(error, &enriched)?;

        if self.config.debug {
            log_delivered(identity, &users, stats);
        }

        self.ledger.activate(identity)?;
        self.capacity.admit(identity)?;
        self.ledger.clear(identity)?;
        Ok(())
    }

    /// Deliver without touching any per-identity record.
    fn deliver_bypassed(
        &self,
        error: &dyn ReportableError,
        context: Context,
        identity: &ErrorIdentity,
    ) -> Result<(), ReportError> {
        let enriched = context::enrich_for_bypass(context, identity, self.clock.now());
        self.notifier.notify(error, &enriched)?;

        if self.config.debug {
            let current = self.capacity.live_count()?;
            tracing::warn!(
                target: "report_throttle",
                key = %identity,
                current_tracked_errors = current,
                max_tracked_errors = self.capacity.max_tracked_errors(),
                "error reported immediately (tracking limit reached)"
            );
        }
        Ok(())
    }

    /// Get the active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get a reference to the metrics.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

fn log_delivered(identity: &ErrorIdentity, users: &AffectedUsers, stats: OccurrenceStats) {
    tracing::info!(
        target: "report_throttle",
        key = %identity,
        affected_users = %users.to_value(),
        count = users.len(),
        occurrences = stats.occurrences,
        throttled = stats.throttled,
        "error reported"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::error::{NotifyError, StoreError};
    use crate::application::state::IdentityKeys;
    use crate::domain::context::{KEY, OCCURRENCES, THROTTLED};
    use crate::domain::records::Record;
    use crate::infrastructure::memory_store::MemoryStore;
    use crate::infrastructure::mocks::{MockClock, RecordingNotifier};
    use serde_json::json;
    use std::fmt;
    use std::time::Duration;

    #[derive(Debug)]
    struct Boom;

    impl fmt::Display for Boom {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("boom")
        }
    }

    impl std::error::Error for Boom {}
    impl ReportableError for Boom {}

    #[derive(Debug, Default)]
    struct BrokenStore;

    impl ExpiringStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<Record>, StoreError> {
            Err(StoreError::Backend("down".to_string()))
        }

        fn set(&self, _key: &str, _record: Record, _ttl: Duration) -> Result<(), StoreError> {
            Err(StoreError::Backend("down".to_string()))
        }

        fn has(&self, _key: &str) -> Result<bool, StoreError> {
            Err(StoreError::Backend("down".to_string()))
        }

        fn delete(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::Backend("down".to_string()))
        }
    }

    fn reporter(notifier: RecordingNotifier) -> (RateLimitedReporter, MockClock, Arc<MemoryStore>) {
        let clock = MockClock::default();
        let store = Arc::new(MemoryStore::new(Arc::new(clock.clone())));
        let config = Config {
            cooldown: Duration::from_secs(3600),
            ..Config::default()
        };
        let reporter = RateLimitedReporter::new(
            Arc::new(notifier),
            store.clone(),
            Arc::new(clock.clone()),
            config,
        );
        (reporter, clock, store)
    }

    #[test]
    fn test_first_occurrence_delivers() {
        let notifier = RecordingNotifier::new();
        let (reporter, _, _) = reporter(notifier.clone());

        let outcome = reporter.report(&Boom, Context::new(), None).unwrap();

        assert_eq!(outcome, Outcome::Delivered);
        assert_eq!(notifier.count(), 1);
        let report = notifier.last().unwrap();
        assert_eq!(report.error_message, "boom");
        assert_eq!(report.context[OCCURRENCES], json!(1));
        assert_eq!(report.context[THROTTLED], json!(0));
    }

    #[test]
    fn test_second_occurrence_suppressed() {
        let notifier = RecordingNotifier::new();
        let (reporter, _, _) = reporter(notifier.clone());

        reporter.report(&Boom, Context::new(), None).unwrap();
        let outcome = reporter.report(&Boom, Context::new(), None).unwrap();

        assert_eq!(outcome, Outcome::Suppressed);
        assert!(!outcome.is_delivered());
        assert_eq!(notifier.count(), 1);
    }

    #[test]
    fn test_explicit_key_in_context() {
        let notifier = RecordingNotifier::new();
        let (reporter, _, _) = reporter(notifier.clone());

        reporter
            .report(&Boom, Context::new(), Some("custom:key"))
            .unwrap();

        assert_eq!(notifier.last().unwrap().context[KEY], json!("custom:key"));
    }

    #[test]
    fn test_delivery_clears_window_records() {
        let notifier = RecordingNotifier::new();
        let (reporter, _, store) = reporter(notifier);
        let mut ctx = Context::new();
        ctx.insert("user_id".to_string(), json!(1));

        reporter.report(&Boom, ctx, Some("k")).unwrap();

        let keys = IdentityKeys::for_identity(&ErrorIdentity::from("k"));
        assert!(store.has(&keys.throttle).unwrap());
        assert!(!store.has(&keys.users).unwrap());
        assert!(!store.has(&keys.stats).unwrap());
    }

    #[test]
    fn test_notifier_failure_does_not_start_window() {
        let notifier = RecordingNotifier::new();
        notifier.fail_next(NotifyError::delivery("upstream 502"));
        let (reporter, _, _) = reporter(notifier.clone());

        let err = reporter.report(&Boom, Context::new(), None).unwrap_err();
        assert_eq!(
            err,
            ReportError::Notify(NotifyError::Delivery("upstream 502".to_string()))
        );

        // Not throttled: the next occurrence reports again
        let outcome = reporter.report(&Boom, Context::new(), None).unwrap();
        assert_eq!(outcome, Outcome::Delivered);
        assert_eq!(notifier.count(), 1);
        assert_eq!(notifier.last().unwrap().context[OCCURRENCES], json!(1));
    }

    #[test]
    fn test_store_failure_propagates() {
        let notifier = RecordingNotifier::new();
        let clock: Arc<dyn Clock> = Arc::new(MockClock::default());
        let reporter = RateLimitedReporter::new(
            Arc::new(notifier.clone()),
            Arc::new(BrokenStore),
            clock,
            Config::default(),
        );

        let err = reporter.report(&Boom, Context::new(), None).unwrap_err();

        assert_eq!(err, ReportError::Store(StoreError::Backend("down".to_string())));
        assert_eq!(notifier.count(), 0);
    }

    #[test]
    fn test_metrics_follow_outcomes() {
        let notifier = RecordingNotifier::new();
        let (reporter, _, _) = reporter(notifier);

        for _ in 0..4 {
            reporter.report(&Boom, Context::new(), None).unwrap();
        }

        let snapshot = reporter.metrics().snapshot();
        assert_eq!(snapshot.reports_delivered, 1);
        assert_eq!(snapshot.reports_suppressed, 3);
        assert_eq!(snapshot.reports_bypassed, 0);
    }

    #[test]
    fn test_window_reopens_after_cooldown() {
        let notifier = RecordingNotifier::new();
        let (reporter, clock, _) = reporter(notifier.clone());

        reporter.report(&Boom, Context::new(), None).unwrap();
        clock.advance(Duration::from_secs(1800));
        reporter.report(&Boom, Context::new(), None).unwrap();
        clock.advance(Duration::from_secs(1860));

        let outcome = reporter.report(&Boom, Context::new(), None).unwrap();

        assert_eq!(outcome, Outcome::Delivered);
        let report = notifier.last().unwrap();
        assert_eq!(report.context[OCCURRENCES], json!(2));
        assert_eq!(report.context[THROTTLED], json!(1));
    }
}
