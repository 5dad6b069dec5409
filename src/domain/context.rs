//! Report context and the enrichment attached to delivered reports.

use crate::domain::identity::ErrorIdentity;
use crate::domain::records::{AffectedUsers, OccurrenceStats, UserId};
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// Free-form context accompanying a report, forwarded to the notifier.
pub type Context = Map<String, Value>;

/// Context key carrying the affected user.
pub const USER_ID: &str = "user_id";
/// Users collected during the window.
pub const AFFECTED_USERS: &str = "affected_users";
/// Number of users collected during the window.
pub const AFFECTED_USER_COUNT: &str = "affected_user_count";
/// Whether user collection hit its cap.
pub const USER_TRACKING_CAPPED: &str = "user_tracking_capped";
/// Delivery time, `YYYY-MM-DD HH:MM:SS` in UTC.
pub const REPORTED_AT: &str = "reported_at";
/// The resolved error identity.
pub const KEY: &str = "key";
/// Occurrences counted in the window.
pub const OCCURRENCES: &str = "occurrences";
/// Suppressed occurrences in the window.
pub const THROTTLED: &str = "throttled";
/// Set when the report bypassed throttling at capacity.
pub const TRACKING_LIMIT_REACHED: &str = "tracking_limit_reached";

const REPORTED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Read the user id carried by a context, if any.
pub fn user_id(context: &Context) -> Option<UserId> {
    context.get(USER_ID).and_then(UserId::from_value)
}

/// Format a delivery timestamp.
pub fn format_reported_at(now: DateTime<Utc>) -> String {
    now.format(REPORTED_AT_FORMAT).to_string()
}

/// Enrich a context for a regular delivery with the window's accumulated state.
pub fn enrich_for_delivery(
    mut context: Context,
    identity: &ErrorIdentity,
    stats: OccurrenceStats,
    users: &AffectedUsers,
    max_tracked_users: usize,
    now: DateTime<Utc>,
) -> Context {
    context.insert(AFFECTED_USERS.to_string(), users.to_value());
    context.insert(AFFECTED_USER_COUNT.to_string(), Value::from(users.len()));
    context.insert(
        USER_TRACKING_CAPPED.to_string(),
        Value::Bool(users.is_capped(max_tracked_users)),
    );
    context.insert(REPORTED_AT.to_string(), Value::from(format_reported_at(now)));
    context.insert(KEY.to_string(), Value::from(identity.as_str()));
    context.insert(OCCURRENCES.to_string(), Value::from(stats.occurrences));
    context.insert(THROTTLED.to_string(), Value::from(stats.throttled));
    context
}

/// Enrich a context for a delivery that bypassed throttling.
pub fn enrich_for_bypass(
    mut context: Context,
    identity: &ErrorIdentity,
    now: DateTime<Utc>,
) -> Context {
    context.insert(REPORTED_AT.to_string(), Value::from(format_reported_at(now)));
    context.insert(KEY.to_string(), Value::from(identity.as_str()));
    context.insert(TRACKING_LIMIT_REACHED.to_string(), Value::Bool(true));
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 12, 5, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_user_id_lookup() {
        let mut context = Context::new();
        assert_eq!(user_id(&context), None);

        context.insert(USER_ID.to_string(), json!(12));
        assert_eq!(user_id(&context), Some(UserId::Int(12)));
    }

    #[test]
    fn test_reported_at_format() {
        assert_eq!(format_reported_at(noon()), "2025-12-05 12:00:00");
    }

    #[test]
    fn test_delivery_enrichment_keeps_caller_fields() {
        let mut context = Context::new();
        context.insert("custom".to_string(), json!("value"));

        let users: AffectedUsers = vec![UserId::Int(1), UserId::Int(2)].into_iter().collect();
        let stats = OccurrenceStats {
            occurrences: 5,
            throttled: 4,
        };
        let id = ErrorIdentity::from("db:down");

        let enriched = enrich_for_delivery(context, &id, stats, &users, 2, noon());

        assert_eq!(enriched["custom"], json!("value"));
        assert_eq!(enriched[AFFECTED_USERS], json!([1, 2]));
        assert_eq!(enriched[AFFECTED_USER_COUNT], json!(2));
        assert_eq!(enriched[USER_TRACKING_CAPPED], json!(true));
        assert_eq!(enriched[REPORTED_AT], json!("2025-12-05 12:00:00"));
        assert_eq!(enriched[KEY], json!("db:down"));
        assert_eq!(enriched[OCCURRENCES], json!(5));
        assert_eq!(enriched[THROTTLED], json!(4));
        assert!(!enriched.contains_key(TRACKING_LIMIT_REACHED));
    }

    #[test]
    fn test_capped_flag_false_below_cap() {
        let users: AffectedUsers = vec![UserId::Int(1)].into_iter().collect();
        let enriched = enrich_for_delivery(
            Context::new(),
            &ErrorIdentity::from("k"),
            OccurrenceStats::default(),
            &users,
            2,
            noon(),
        );
        assert_eq!(enriched[USER_TRACKING_CAPPED], json!(false));
    }

    #[test]
    fn test_bypass_enrichment() {
        let enriched = enrich_for_bypass(Context::new(), &ErrorIdentity::from("k"), noon());

        assert_eq!(enriched[TRACKING_LIMIT_REACHED], json!(true));
        assert_eq!(enriched[KEY], json!("k"));
        assert!(!enriched.contains_key(OCCURRENCES));
        assert!(!enriched.contains_key(AFFECTED_USERS));
    }

    #[test]
    fn test_enrichment_overrides_reserved_keys() {
        let mut context = Context::new();
        context.insert(KEY.to_string(), json!("spoofed"));

        let enriched = enrich_for_bypass(context, &ErrorIdentity::from("real"), noon());
        assert_eq!(enriched[KEY], json!("real"));
    }
}
