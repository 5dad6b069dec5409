//! Per-identity tracking ledger.
//!
//! Keeps the throttle marker, the bounded affected-user set and the occurrence
//! counters of each identity. Every update is a plain read-then-write against
//! the store; concurrent occurrences of one identity may under-count.

use crate::application::error::StoreError;
use crate::application::state::StateStore;
use crate::domain::identity::ErrorIdentity;
use crate::domain::records::{AffectedUsers, OccurrenceStats, UserId};
use std::time::Duration;

/// Read-modify-write sequencing for the records of each identity.
#[derive(Debug, Clone)]
pub struct TrackingLedger {
    state: StateStore,
    cooldown: Duration,
    max_tracked_users: usize,
}

impl TrackingLedger {
    /// Create a ledger.
    ///
    /// # Arguments
    /// * `state` - Typed store accessor
    /// * `cooldown` - TTL of every per-identity record
    /// * `max_tracked_users` - Cap of the affected-user set
    pub fn new(state: StateStore, cooldown: Duration, max_tracked_users: usize) -> Self {
        Self {
            state,
            cooldown,
            max_tracked_users,
        }
    }

    /// Add a user to the identity's affected set.
    ///
    /// No-op when the user is absent, already tracked, or the set is full.
    /// Returns true if the set was written.
    pub fn track_user(
        &self,
        identity: &ErrorIdentity,
        user: Option<UserId>,
    ) -> Result<bool, StoreError> {
        let Some(user) = user else {
            return Ok(false);
        };

        let mut users = self.state.users(identity)?;
        if !users.try_track(user, self.max_tracked_users) {
            return Ok(false);
        }

        self.state.put_users(identity, users, self.cooldown)?;
        Ok(true)
    }

    /// Read the counters and count this occurrence.
    ///
    /// The result is not persisted; the caller writes it once the throttle
    /// decision is known.
    pub fn bump_occurrence(&self, identity: &ErrorIdentity) -> Result<OccurrenceStats, StoreError> {
        let mut stats = self.state.stats(identity)?;
        stats.record_occurrence();
        Ok(stats)
    }

    /// Count a suppressed occurrence and persist the counters.
    pub fn record_throttled(
        &self,
        identity: &ErrorIdentity,
        mut stats: OccurrenceStats,
    ) -> Result<OccurrenceStats, StoreError> {
        stats.record_throttled();
        self.state.put_stats(identity, stats, self.cooldown)?;
        Ok(stats)
    }

    /// Check whether the identity is inside a cooldown window.
    pub fn is_throttled(&self, identity: &ErrorIdentity) -> Result<bool, StoreError> {
        self.state.has_marker(identity)
    }

    /// Users collected in the current window.
    pub fn affected_users(&self, identity: &ErrorIdentity) -> Result<AffectedUsers, StoreError> {
        self.state.users(identity)
    }

    /// Start a cooldown window.
    ///
    /// The marker is written once and never refreshed by later occurrences.
    pub fn activate(&self, identity: &ErrorIdentity) -> Result<(), StoreError> {
        self.state.put_marker(identity, self.cooldown)
    }

    /// Drop the users and counters so the next window starts empty.
    ///
    /// The marker is left alone; only expiry removes it.
    pub fn clear(&self, identity: &ErrorIdentity) -> Result<(), StoreError> {
        self.state.forget_window(identity)
    }

    /// Cap of the affected-user set.
    pub fn max_tracked_users(&self) -> usize {
        self.max_tracked_users
    }
}
