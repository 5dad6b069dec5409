//! Typed access to the expiring store.
//!
//! Owns the key namespacing scheme: every identity gets three keys sharing a
//! common prefix, and one global key holds the map of tracked identities.

use crate::application::error::StoreError;
use crate::application::ports::ExpiringStore;
use crate::domain::identity::ErrorIdentity;
use crate::domain::records::{AffectedUsers, OccurrenceStats, Record, TrackedErrors};
use std::sync::Arc;
use std::time::Duration;

const IDENTITY_PREFIX: &str = "error-throttler:";

/// Key of the global tracked-errors map.
pub const GLOBAL_TRACKED_KEY: &str = "serene:global:tracked_errors";

/// Keys addressing the records of one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityKeys {
    /// Throttle marker
    pub throttle: String,
    /// Affected users
    pub users: String,
    /// Occurrence statistics
    pub stats: String,
}

impl IdentityKeys {
    /// Build the keys for an identity.
    pub fn for_identity(identity: &ErrorIdentity) -> Self {
        let throttle = format!("{}{}", IDENTITY_PREFIX, identity);
        Self {
            users: format!("{}:users", throttle),
            stats: format!("{}:stats", throttle),
            throttle,
        }
    }
}

/// Typed accessor over an [`ExpiringStore`].
#[derive(Debug, Clone)]
pub struct StateStore {
    store: Arc<dyn ExpiringStore>,
}

impl StateStore {
    /// Wrap a store.
    pub fn new(store: Arc<dyn ExpiringStore>) -> Self {
        Self { store }
    }

    /// Check whether the identity's throttle marker is present.
    pub fn has_marker(&self, identity: &ErrorIdentity) -> Result<bool, StoreError> {
        self.store.has(&IdentityKeys::for_identity(identity).throttle)
    }

    /// Write the throttle marker.
    pub fn put_marker(&self, identity: &ErrorIdentity, ttl: Duration) -> Result<(), StoreError> {
        self.store.set(
            &IdentityKeys::for_identity(identity).throttle,
            Record::Marker,
            ttl,
        )
    }

    /// Read the affected users, empty if absent.
    pub fn users(&self, identity: &ErrorIdentity) -> Result<AffectedUsers, StoreError> {
        match self.store.get(&IdentityKeys::for_identity(identity).users)? {
            None => Ok(AffectedUsers::new()),
            Some(Record::Users(users)) => Ok(users),
            Some(other) => Err(unexpected("users", &other)),
        }
    }

    /// Write the affected users.
    pub fn put_users(
        &self,
        identity: &ErrorIdentity,
        users: AffectedUsers,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        self.store.set(
            &IdentityKeys::for_identity(identity).users,
            Record::Users(users),
            ttl,
        )
    }

    /// Read the occurrence statistics, zeroed if absent.
    pub fn stats(&self, identity: &ErrorIdentity) -> Result<OccurrenceStats, StoreError> {
        match self.store.get(&IdentityKeys::for_identity(identity).stats)? {
            None => Ok(OccurrenceStats::default()),
            Some(Record::Stats(stats)) => Ok(stats),
            Some(other) => Err(unexpected("stats", &other)),
        }
    }

    /// Write the occurrence statistics.
    pub fn put_stats(
        &self,
        identity: &ErrorIdentity,
        stats: OccurrenceStats,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        self.store.set(
            &IdentityKeys::for_identity(identity).stats,
            Record::Stats(stats),
            ttl,
        )
    }

    /// Delete the users and stats records of an identity.
    pub fn forget_window(&self, identity: &ErrorIdentity) -> Result<(), StoreError> {
        let keys = IdentityKeys::for_identity(identity);
        self.store.delete(&keys.users)?;
        self.store.delete(&keys.stats)
    }

    /// Read the global tracked-errors map, empty if absent.
    pub fn tracked(&self) -> Result<TrackedErrors, StoreError> {
        match self.store.get(GLOBAL_TRACKED_KEY)? {
            None => Ok(TrackedErrors::new()),
            Some(Record::Tracked(tracked)) => Ok(tracked),
            Some(other) => Err(unexpected("tracked", &other)),
        }
    }

    /// Write the global tracked-errors map.
    pub fn put_tracked(&self, tracked: TrackedErrors, ttl: Duration) -> Result<(), StoreError> {
        self.store.set(GLOBAL_TRACKED_KEY, Record::Tracked(tracked), ttl)
    }
}

fn unexpected(expected: &str, found: &Record) -> StoreError {
    StoreError::Codec(format!(
        "expected {} record, found {}",
        expected,
        found.variant_name()
    ))
}
