//! ID generation utilities.

use uuid::Uuid;

/// Generate a new UUID v4.
pub fn uuid() -> String {
    Uuid::new_v4().to_string()
}

/// Generate a short random ID (8 hex characters).
///
/// Used for peer identities, where lexicographic comparison must be total.
pub fn short_id() -> String {
    let bytes: [u8; 4] = rand::random();
    hex::encode(bytes)
}

/// Current wall-clock time in milliseconds since the Unix epoch.
///
/// All replication timestamps use this resolution.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
