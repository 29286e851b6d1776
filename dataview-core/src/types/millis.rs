//! Duration storage for config fields.

use std::time::Duration;

/// Converts `duration` to whole milliseconds for a `*_ms` config field.
///
/// A non-zero duration never becomes zero: sub-millisecond values round up to 1.
/// Durations past `u64::MAX` milliseconds saturate.
pub fn to_millis(duration: Duration) -> u64 {
    let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
    if millis == 0 && !duration.is_zero() {
        1
    } else {
        millis
    }
}
