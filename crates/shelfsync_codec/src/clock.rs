//! Wall-clock helper.

use std::time::SystemTime;

/// Milliseconds since the Unix epoch, or 0 if the clock is before it.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
