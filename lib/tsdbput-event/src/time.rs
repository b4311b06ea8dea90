//! Time-related functions.

use std::time::SystemTime;

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// Get the current Unix timestamp, in nanoseconds.
///
/// Saturates at `i64::MAX`, and reports `0` if the system clock is set before the Unix epoch.
pub fn get_unix_timestamp_nanos() -> i64 {
    let since_unix_epoch = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();
    i64::try_from(since_unix_epoch.as_nanos()).unwrap_or(i64::MAX)
}

/// Converts a Unix timestamp in nanoseconds to whole Unix seconds.
///
/// Rounds towards negative infinity, so timestamps before the epoch map to the second they fall within.
pub const fn nanos_to_unix_seconds(nanos: i64) -> i64 {
    nanos.div_euclid(NANOS_PER_SECOND)
}

/// Converts a duration in whole seconds to nanoseconds, saturating on overflow.
pub const fn seconds_to_nanos(seconds: i64) -> i64 {
    seconds.saturating_mul(NANOS_PER_SECOND)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_seconds_floor() {
        assert_eq!(nanos_to_unix_seconds(0), 0);
        assert_eq!(nanos_to_unix_seconds(1_999_999_999), 1);
        assert_eq!(nanos_to_unix_seconds(1_500_000_000_000_000_000), 1_500_000_000);
        assert_eq!(nanos_to_unix_seconds(-1), -1);
        assert_eq!(nanos_to_unix_seconds(-1_000_000_000), -1);
        assert_eq!(nanos_to_unix_seconds(-1_000_000_001), -2);
    }

    #[test]
    fn seconds_to_nanos_saturates() {
        assert_eq!(seconds_to_nanos(60), 60_000_000_000);
        assert_eq!(seconds_to_nanos(i64::MAX), i64::MAX);
    }

    #[test]
    fn wall_clock_is_after_2020() {
        assert!(nanos_to_unix_seconds(get_unix_timestamp_nanos()) > 1_577_836_800);
    }
}
