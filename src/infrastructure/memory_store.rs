//! In-process expiring store.
//!
//! Backed by DashMap, with expiry evaluated against an injected clock so that
//! time-dependent behavior is deterministic under a mock clock.
//!
//! Expired entries are removed when read, and every [`PURGE_INTERVAL`] writes
//! a sweep drops all of them, so keys that are never read again do not
//! accumulate.

use crate::application::error::StoreError;
use crate::application::ports::{Clock, ExpiringStore};
use crate::domain::records::Record;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Number of writes between two sweeps of expired entries.
pub const PURGE_INTERVAL: usize = 256;

#[derive(Debug, Clone)]
struct Entry {
    record: Record,
    /// `None` when the TTL overflows the calendar
    expires_at: Option<DateTime<Utc>>,
}

impl Entry {
    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// Thread-safe expiring store shared by every reporter of one process.
///
/// DashMap provides lock-free reads and fine-grained locking for writes.
/// Expired entries read as absent and are removed when touched or by the
/// periodic sweep. Clones share the same map.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    map: Arc<DashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
    writes: Arc<AtomicUsize>,
}

impl MemoryStore {
    /// Create an empty store using `clock` to evaluate expiry.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            map: Arc::new(DashMap::new()),
            clock,
            writes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        let now = self.clock.now();
        self.map.iter().filter(|e| e.value().is_live(now)).count()
    }

    /// Check if the store holds no live entry.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every expired entry.
    pub fn purge_expired(&self) {
        let now = self.clock.now();
        self.map.retain(|_, entry| entry.is_live(now));
    }

    /// Remove all entries.
    pub fn clear(&self) {
        self.map.clear();
    }
}

impl ExpiringStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Record>, StoreError> {
        let now = self.clock.now();
        if let Some(entry) = self.map.get(key) {
            if entry.is_live(now) {
                return Ok(Some(entry.record.clone()));
            }
        }

        self.map.remove_if(key, |_, entry| !entry.is_live(now));
        Ok(None)
    }

    fn set(&self, key: &str, record: Record, ttl: Duration) -> Result<(), StoreError> {
        let expires_at = TimeDelta::from_std(ttl)
            .ok()
            .and_then(|delta| self.clock.now().checked_add_signed(delta));

        self.map.insert(key.to_string(), Entry { record, expires_at });

        let writes = self.writes.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        if writes % PURGE_INTERVAL == 0 {
            self.purge_expired();
        }
        Ok(())
    }

    fn has(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.map.remove(key);
        Ok(())
    }
}
