//! Simple time helpers used for operation timings.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current timestamp in milliseconds since the Unix epoch.
pub fn now_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

/// Milliseconds elapsed since `start_ms`, saturating at zero on clock skew.
pub fn elapsed_ms(start_ms: u128) -> u128 {
    now_ms().saturating_sub(start_ms)
}
