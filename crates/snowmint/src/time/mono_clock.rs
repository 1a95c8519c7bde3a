use core::time::Duration;
use std::{
    sync::{
        Arc, OnceLock, Weak,
        atomic::{AtomicU64, Ordering},
    },
    thread::{self, JoinHandle},
    time::{Instant, SystemTime, UNIX_EPOCH},
};

use crate::TimeSource;

/// Shared ticker thread that updates every millisecond.
#[derive(Debug)]
struct SharedTickerInner {
    current: AtomicU64,
    _handle: OnceLock<JoinHandle<()>>,
}

/// A monotonic time source reporting milliseconds since the Unix epoch.
///
/// The wall-clock offset is read from `SystemTime::now()` once, at
/// construction. After that, a background thread advances a shared counter
/// once per millisecond using `Instant`, so readings are unaffected by NTP
/// steps or manual clock changes and never go backward.
///
/// Clones share the same ticker. The thread exits after the last clone is
/// dropped.
#[derive(Clone, Debug)]
pub struct MonotonicClock {
    inner: Arc<SharedTickerInner>,
    unix_offset: u64, // in milliseconds
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    /// Starts a new ticker aligned to the current wall-clock time.
    ///
    /// A wall clock set before 1970 anchors the ticker at `0`.
    ///
    /// # Example
    ///
    /// ```
    /// use snowmint::{MonotonicClock, SystemClock, TimeSource};
    ///
    /// let clock = MonotonicClock::new();
    /// let first = clock.current_millis();
    /// std::thread::sleep(std::time::Duration::from_millis(5));
    ///
    /// // The ticker may lag a tick behind the wall clock, but it never moves
    /// // backward.
    /// assert!(clock.current_millis() >= first);
    /// assert!(first <= SystemClock.current_millis());
    /// ```
    pub fn new() -> Self {
        let start = Instant::now();
        let unix_offset = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |since| {
                u64::try_from(since.as_millis()).unwrap_or(u64::MAX)
            });

        let inner = Arc::new(SharedTickerInner {
            current: AtomicU64::new(0),
            _handle: OnceLock::new(),
        });

        let ticker = Arc::downgrade(&inner);
        let handle = thread::spawn(move || run_ticker(&ticker, start));

        // The cell was created just above, so it is always empty here.
        let _ = inner._handle.set(handle);

        Self { inner, unix_offset }
    }
}

/// Publishes whole milliseconds elapsed since `start` until every clock
/// sharing `ticker` is gone.
fn run_ticker(ticker: &Weak<SharedTickerInner>, start: Instant) {
    let mut deadline_ms = 0;

    while let Some(shared) = ticker.upgrade() {
        let deadline = start + Duration::from_millis(deadline_ms);
        if let Some(early) = deadline.checked_duration_since(Instant::now()) {
            thread::sleep(early);
        }

        // Sleep overshoot is absorbed here: the stored value is the real
        // elapsed time, never the deadline.
        let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        shared.current.store(elapsed_ms, Ordering::Relaxed);
        deadline_ms = elapsed_ms.saturating_add(1);
    }
}

impl TimeSource for MonotonicClock {
    fn current_millis(&self) -> u64 {
        self.unix_offset
            .saturating_add(self.inner.current.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SystemClock;

    #[test]
    fn never_goes_backward() {
        let clock = MonotonicClock::new();
        let mut last = clock.current_millis();
        for _ in 0..10_000 {
            let now = clock.current_millis();
            assert!(now >= last);
            last = now;
        }
    }

    #[test]
    fn advances_and_tracks_wall_clock() {
        let clock = MonotonicClock::default();
        let first = clock.current_millis();
        thread::sleep(Duration::from_millis(20));
        let second = clock.current_millis();
        assert!(second > first);
        // Allow generous drift for slow CI machines.
        assert!(second.abs_diff(SystemClock.current_millis()) < 1_000);
    }
}
