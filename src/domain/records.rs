//! Records persisted in the expiring store.
//!
//! Each error identity owns three records (throttle marker, affected users and
//! occurrence statistics) and all identities share one map of tracked errors.
//! All of them travel through the store as a [`Record`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a user affected by an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserId {
    /// Numeric identifier
    Int(i64),
    /// Numeric identifier above `i64::MAX`
    Uint(u64),
    /// String identifier
    Str(String),
}

impl UserId {
    /// Extract a user id from a context value.
    ///
    /// Non-zero integers of any size and non-empty strings are accepted.
    /// `null`, `0`, the empty string, booleans, floats, arrays and objects
    /// count as "no user": none of them identifies anyone.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(0), _) => None,
                (Some(id), _) => Some(UserId::Int(id)),
                (None, Some(id)) => Some(UserId::Uint(id)),
                (None, None) => None,
            },
            Value::String(s) if !s.is_empty() => Some(UserId::Str(s.clone())),
            _ => None,
        }
    }

    /// Render the id back into a context value.
    pub fn to_value(&self) -> Value {
        match self {
            UserId::Int(id) => Value::from(*id),
            UserId::Uint(id) => Value::from(*id),
            UserId::Str(id) => Value::from(id.as_str()),
        }
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        UserId::Int(id)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        UserId::Str(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        UserId::Str(id)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Int(id) => write!(f, "{}", id),
            UserId::Uint(id) => write!(f, "{}", id),
            UserId::Str(id) => f.write_str(id),
        }
    }
}

/// Ordered, duplicate-free and bounded set of affected users.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectedUsers(Vec<UserId>);

impl AffectedUsers {
    /// Create an empty set.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a user unless already present or the set holds `cap` entries.
    ///
    /// Returns true if the user was added.
    pub fn try_track(&mut self, user: UserId, cap: usize) -> bool {
        if self.0.len() >= cap || self.0.contains(&user) {
            return false;
        }
        self.0.push(user);
        true
    }

    /// Check whether a user is present.
    pub fn contains(&self, user: &UserId) -> bool {
        self.0.contains(user)
    }

    /// Number of tracked users.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if no user is tracked.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the set has reached (or exceeds) the cap.
    pub fn is_capped(&self, cap: usize) -> bool {
        self.0.len() >= cap
    }

    /// Tracked users in first-seen order.
    pub fn as_slice(&self) -> &[UserId] {
        &self.0
    }

    /// Render the users as a JSON array.
    pub fn to_value(&self) -> Value {
        Value::Array(self.0.iter().map(UserId::to_value).collect())
    }
}

impl FromIterator<UserId> for AffectedUsers {
    fn from_iter<I: IntoIterator<Item = UserId>>(iter: I) -> Self {
        let mut users = AffectedUsers::new();
        for user in iter {
            users.try_track(user, usize::MAX);
        }
        users
    }
}

/// Per-window occurrence counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrenceStats {
    /// Every occurrence in the window, including the one that reports
    pub occurrences: u64,
    /// Occurrences that were suppressed
    pub throttled: u64,
}

impl OccurrenceStats {
    /// Count one more occurrence.
    pub fn record_occurrence(&mut self) {
        self.occurrences = self.occurrences.saturating_add(1);
    }

    /// Count one more suppressed occurrence.
    pub fn record_throttled(&mut self) {
        self.throttled = self.throttled.saturating_add(1);
    }
}

/// Map from error identity to the unix timestamp (seconds) its tracking expires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedErrors(BTreeMap<String, i64>);

impl TrackedErrors {
    /// Create an empty map.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Insert or refresh an identity's expiry.
    pub fn insert(&mut self, identity: impl Into<String>, expires_at: i64) {
        self.0.insert(identity.into(), expires_at);
    }

    /// Filtered view with only entries still live at `now`.
    pub fn live(&self, now: i64) -> TrackedErrors {
        TrackedErrors(
            self.0
                .iter()
                .filter(|(_, expiry)| **expiry > now)
                .map(|(id, expiry)| (id.clone(), *expiry))
                .collect(),
        )
    }

    /// Number of entries still live at `now`.
    pub fn live_count(&self, now: i64) -> usize {
        self.0.values().filter(|expiry| **expiry > now).count()
    }

    /// Expiry recorded for an identity, live or not.
    pub fn expiry(&self, identity: &str) -> Option<i64> {
        self.0.get(identity).copied()
    }

    /// Total number of entries, including stale ones.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the map holds no entry at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A value stored under one key of the expiring store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Record {
    /// Presence-only throttle marker
    Marker,
    /// Affected users of the current window
    Users(AffectedUsers),
    /// Occurrence counters of the current window
    Stats(OccurrenceStats),
    /// Global map of tracked identities
    Tracked(TrackedErrors),
}

impl Record {
    /// Short name of the variant, for error messages.
    pub fn variant_name(&self) -> &'static str {
        match self {
            Record::Marker => "marker",
            Record::Users(_) => "users",
            Record::Stats(_) => "stats",
            Record::Tracked(_) => "tracked",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_id_from_value() {
        assert_eq!(UserId::from_value(&json!(42)), Some(UserId::Int(42)));
        assert_eq!(
            UserId::from_value(&json!("u-1")),
            Some(UserId::Str("u-1".to_string()))
        );
        assert_eq!(UserId::from_value(&json!(null)), None);
        assert_eq!(UserId::from_value(&json!("")), None);
        assert_eq!(UserId::from_value(&json!(0)), None);
        assert_eq!(UserId::from_value(&json!(1.5)), None);
        assert_eq!(UserId::from_value(&json!({"id": 1})), None);
        assert_eq!(UserId::from_value(&json!(true)), None);
        assert_eq!(UserId::from_value(&json!(-3)), Some(UserId::Int(-3)));
    }

    #[test]
    fn test_user_id_above_i64_max() {
        let big = u64::MAX;
        let id = UserId::from_value(&json!(big));

        assert_eq!(id, Some(UserId::Uint(big)));
        assert_eq!(id.unwrap().to_value(), json!(big));
    }

    #[test]
    fn test_user_id_value_roundtrip_keeps_type() {
        assert_eq!(UserId::Int(7).to_value(), json!(7));
        assert_eq!(UserId::from("abc").to_value(), json!("abc"));
    }

    #[test]
    fn test_affected_users_dedup_and_order() {
        let mut users = AffectedUsers::new();
        assert!(users.try_track(UserId::Int(3), 10));
        assert!(users.try_track(UserId::Int(1), 10));
        assert!(!users.try_track(UserId::Int(3), 10));
        assert!(users.try_track(UserId::Int(2), 10));

        assert_eq!(
            users.as_slice(),
            &[UserId::Int(3), UserId::Int(1), UserId::Int(2)]
        );
    }

    #[test]
    fn test_affected_users_cap() {
        let mut users = AffectedUsers::new();
        for id in 1..=5 {
            users.try_track(UserId::Int(id), 3);
        }

        assert_eq!(users.len(), 3);
        assert!(users.is_capped(3));
        assert!(!users.is_capped(4));
        assert!(!users.contains(&UserId::Int(4)));
    }

    #[test]
    fn test_int_and_string_ids_are_distinct() {
        let mut users = AffectedUsers::new();
        assert!(users.try_track(UserId::Int(1), 10));
        assert!(users.try_track(UserId::from("1"), 10));
        assert_eq!(users.len(), 2);
    }

    #[test]
    fn test_affected_users_to_value() {
        let users: AffectedUsers = vec![UserId::Int(1), UserId::from("b")].into_iter().collect();
        assert_eq!(users.to_value(), json!([1, "b"]));
    }

    #[test]
    fn test_stats_counters() {
        let mut stats = OccurrenceStats::default();
        stats.record_occurrence();
        stats.record_occurrence();
        stats.record_throttled();

        assert_eq!(
            stats,
            OccurrenceStats {
                occurrences: 2,
                throttled: 1
            }
        );
    }

    #[test]
    fn test_tracked_errors_live_view() {
        let mut tracked = TrackedErrors::new();
        tracked.insert("a", 100);
        tracked.insert("b", 200);
        tracked.insert("c", 150);

        let live = tracked.live(150);
        assert_eq!(live.len(), 1);
        assert_eq!(live.expiry("b"), Some(200));
        assert_eq!(tracked.live_count(150), 1);

        // The view is a copy; the source keeps stale entries
        assert_eq!(tracked.len(), 3);
    }

    #[test]
    fn test_tracked_errors_refresh() {
        let mut tracked = TrackedErrors::new();
        tracked.insert("a", 100);
        tracked.insert("a", 300);

        assert_eq!(tracked.len(), 1);
        assert_eq!(tracked.expiry("a"), Some(300));
    }
}
