//! Reporter construction.
//!
//! Wires the reporter to its adapters. Anything left unset falls back to the
//! in-process defaults: a [`SystemClock`] and a [`MemoryStore`] sharing it.

use crate::application::config::{Config, ConfigError};
use crate::application::ports::{Clock, ExpiringStore, Notifier};
use crate::application::reporter::RateLimitedReporter;
use crate::infrastructure::clock::SystemClock;
use crate::infrastructure::memory_store::MemoryStore;
use std::sync::Arc;
use std::time::Duration;

/// Builder for [`RateLimitedReporter`].
#[derive(Debug, Default)]
pub struct ReporterBuilder {
    config: Config,
    clock: Option<Arc<dyn Clock>>,
    store: Option<Arc<dyn ExpiringStore>>,
}

impl ReporterBuilder {
    /// Create a builder with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole configuration, e.g. one loaded with [`Config::from_env`].
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Set how long further occurrences are suppressed after a report.
    ///
    /// The cooldown will be validated when `build()` is called.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.config.cooldown = cooldown;
        self
    }

    /// Emit diagnostic events for every decision.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Set the cap of the affected-user set per identity.
    ///
    /// Default: 1,000 users
    pub fn with_max_tracked_users(mut self, max: usize) -> Self {
        self.config.max_tracked_users = max;
        self
    }

    /// Set the cap of concurrently tracked identities.
    ///
    /// Once reached, occurrences of untracked identities are delivered
    /// immediately without throttling.
    ///
    /// Default: 1,000 identities
    pub fn with_max_tracked_errors(mut self, max: usize) -> Self {
        self.config.max_tracked_errors = max;
        self
    }

    /// Set a custom clock (mainly for testing).
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set the store holding throttling state.
    ///
    /// Share one store between reporters (or processes, with Redis) to
    /// share their cooldown windows.
    pub fn with_store(mut self, store: Arc<dyn ExpiringStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Build the reporter.
    ///
    /// # Errors
    /// Returns `ConfigError` if the configuration is invalid.
    pub fn build<N>(self, notifier: N) -> Result<RateLimitedReporter, ConfigError>
    where
        N: Notifier + 'static,
    {
        self.build_shared(Arc::new(notifier))
    }

    /// Build the reporter around an already shared notifier.
    ///
    /// # Errors
    /// Returns `ConfigError` if the configuration is invalid.
    pub fn build_shared(
        self,
        notifier: Arc<dyn Notifier>,
    ) -> Result<RateLimitedReporter, ConfigError> {
        self.config.validate()?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock::new()));
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryStore::new(Arc::clone(&clock))));

        Ok(RateLimitedReporter::new(notifier, store, clock, self.config))
    }
}

impl RateLimitedReporter {
    /// Create a builder for configuring the reporter.
    ///
    /// Defaults:
    /// - Cooldown: 30 minutes
    /// - Max tracked users: 1,000 per identity
    /// - Max tracked errors: 1,000
    /// - Debug diagnostics: disabled
    /// - Store: in-process [`MemoryStore`]
    pub fn builder() -> ReporterBuilder {
        ReporterBuilder::new()
    }
}
