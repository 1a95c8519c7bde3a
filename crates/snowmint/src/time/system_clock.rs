use std::time::{SystemTime, UNIX_EPOCH};

use crate::TimeSource;

/// Wall-clock time source backed by [`SystemTime`].
///
/// Every call is a syscall-backed read of the real-time clock, so readings
/// follow NTP steps and manual adjustments, including backward ones. A clock
/// set before 1970 reads as `0`. Use [`MonotonicClock`] if readings must never
/// decrease.
///
/// [`MonotonicClock`]: crate::MonotonicClock
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |since| {
                u64::try_from(since.as_millis()).unwrap_or(u64::MAX)
            })
    }
}
