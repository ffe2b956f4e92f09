//! Unique, time-ordered identifiers for primary keys
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Returns a 47 character id: a 15 digit millisecond timestamp followed by
/// a random UUIDv4 in simple hex form.
pub fn next_id() -> String {
    next_id_at(Utc::now())
}

/// Same as [`next_id`] with an explicit timestamp.
pub fn next_id_at(at: DateTime<Utc>) -> String {
    format!("{:015}{}", at.timestamp_millis(), Uuid::new_v4().simple())
}
