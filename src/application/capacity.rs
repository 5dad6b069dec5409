//! Global cap on concurrently tracked error identities.
//!
//! When an incident produces more distinct identities than the cap allows,
//! new identities bypass throttling and are reported on every occurrence.
//! Failing open on novelty keeps unseen failure classes visible.

use crate::application::error::StoreError;
use crate::application::ports::Clock;
use crate::application::state::StateStore;
use crate::domain::identity::ErrorIdentity;
use std::sync::Arc;
use std::time::Duration;

/// Extra lifetime of global tracking beyond the cooldown.
pub const TRACKING_GRACE: Duration = Duration::from_secs(10 * 60);

/// Decides whether a new identity may be tracked.
#[derive(Debug, Clone)]
pub struct CapacityGuard {
    state: StateStore,
    clock: Arc<dyn Clock>,
    cooldown: Duration,
    max_tracked_errors: usize,
}

impl CapacityGuard {
    /// Create a guard.
    pub fn new(
        state: StateStore,
        clock: Arc<dyn Clock>,
        cooldown: Duration,
        max_tracked_errors: usize,
    ) -> Self {
        Self {
            state,
            clock,
            cooldown,
            max_tracked_errors,
        }
    }

    /// Check whether an occurrence must bypass throttling.
    ///
    /// Identities already under a throttle marker are never bypassed.
    pub fn should_bypass(&self, identity: &ErrorIdentity) -> Result<bool, StoreError> {
        if self.state.has_marker(identity)? {
            return Ok(false);
        }

        Ok(self.live_count()? >= self.max_tracked_errors)
    }

    /// Number of tracked identities whose expiry is still in the future.
    ///
    /// Stale entries are filtered from the view only; the stored map is not
    /// rewritten.
    pub fn live_count(&self) -> Result<usize, StoreError> {
        let now = self.clock.now().timestamp();
        Ok(self.state.tracked()?.live_count(now))
    }

    /// Record that throttling was activated for an identity.
    ///
    /// Inserts or refreshes the identity's expiry and persists the whole map.
    pub fn admit(&self, identity: &ErrorIdentity) -> Result<(), StoreError> {
        let lifetime = self.cooldown.saturating_add(TRACKING_GRACE);
        let expires_at = self
            .clock
            .now()
            .timestamp()
            .saturating_add(i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX));

        let mut tracked = self.state.tracked()?;
        tracked.insert(identity.as_str(), expires_at);
        self.state.put_tracked(tracked, lifetime)
    }

    /// Maximum number of concurrently tracked identities.
    pub fn max_tracked_errors(&self) -> usize {
        self.max_tracked_errors
    }
}
