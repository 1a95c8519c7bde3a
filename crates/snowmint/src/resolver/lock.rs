#[cfg(feature = "tracing")]
use tracing::instrument;

use super::mutex::Mutex;
use crate::SequenceResolver;

/// Returned for a millisecond older than the last one seen. Matches the
/// saturation value of [`AtomicResolver`](crate::AtomicResolver).
const STALE_SEQUENCE: u64 = u16::MAX as u64;

#[derive(Debug, Default)]
pub(crate) struct State {
    last: Option<u64>,
    counter: u64,
}

/// A mutex-backed [`SequenceResolver`].
///
/// Same semantics as [`AtomicResolver`], including the exhausted answer for a
/// millisecond older than the last one seen, with the state behind a
/// [`std::sync::Mutex`] (or a `parking_lot` mutex with the `parking-lot`
/// feature). Useful on targets without 64-bit atomics or when fair access
/// across threads matters more than throughput.
///
/// ## Features
/// - ✅ Thread-safe
/// - ❌ Fails with [`ResolverError::LockPoisoned`] if a thread panicked while
///   holding the std mutex
///
/// [`AtomicResolver`]: crate::AtomicResolver
/// [`ResolverError::LockPoisoned`]: crate::ResolverError::LockPoisoned
#[derive(Debug, Default)]
pub struct LockResolver {
    #[cfg(feature = "cache-padded")]
    pub(crate) state: crossbeam_utils::CachePadded<Mutex<State>>,
    #[cfg(not(feature = "cache-padded"))]
    pub(crate) state: Mutex<State>,
}

impl LockResolver {
    /// Creates a resolver that has not observed any millisecond yet.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SequenceResolver for LockResolver {
    #[cfg(feature = "parking-lot")]
    type Err = core::convert::Infallible;
    #[cfg(not(feature = "parking-lot"))]
    type Err = crate::ResolverError;

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    fn resolve(&self, millis: u64) -> Result<u64, Self::Err> {
        let mut state = {
            #[cfg(feature = "parking-lot")]
            {
                self.state.lock()
            }
            #[cfg(not(feature = "parking-lot"))]
            {
                self.state.lock()?
            }
        };

        let last = state.last;
        match last {
            Some(last) if last == millis => {
                state.counter = state.counter.saturating_add(1);
            }
            // Stale reading: report exhaustion until the clock catches up.
            Some(last) if last > millis => return Ok(STALE_SEQUENCE),
            _ => {
                state.last = Some(millis);
                state.counter = 0;
            }
        }
        Ok(state.counter)
    }
}
