//! Clock helpers

use std::time::Duration;

use chrono::Utc;

/// Current Unix epoch time in milliseconds
///
/// Internal API requests are stamped and checked against this clock.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Millisecond setting (e.g. `db_timeout_ms`) as a `Duration`
pub fn millis_to_duration(millis: u64) -> Duration {
    Duration::from_millis(millis)
}
