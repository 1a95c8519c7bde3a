use core::convert::Infallible;

use portable_atomic::{AtomicU64, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::SequenceResolver;

/// Low bits of the packed state hold the counter.
const COUNTER_BITS: u32 = 16;
const COUNTER_MASK: u64 = (1 << COUNTER_BITS) - 1;

/// Milliseconds are tagged as `millis + 1` so that a zero state means "never
/// called". The tag must fit in the remaining 48 bits.
const TAG_MASK: u64 = (1 << (u64::BITS - COUNTER_BITS - 1)) - 1;

/// The default, lock-free [`SequenceResolver`].
///
/// The last observed millisecond and its counter are packed into a single
/// [`AtomicU64`] and updated with a compare-and-swap loop, so the
/// read-compare-update for a millisecond is one atomic step:
///
/// - same millisecond as the last call: the counter is incremented and the new
///   value returned;
/// - a later millisecond: the millisecond is stored, the counter reset, and `0`
///   returned;
/// - an earlier millisecond: the state is left alone and `u16::MAX` returned,
///   so the generator waits until the clock catches up with the stored
///   millisecond instead of reissuing its sequence numbers.
///
/// The counter saturates at `u16::MAX`, far above any layout's maximum
/// sequence, so a generator keeps seeing "exhausted" until the clock moves on.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Never fails
///
/// ## See Also
/// - [`LockResolver`]
///
/// [`LockResolver`]: crate::LockResolver
#[derive(Debug, Default)]
pub struct AtomicResolver {
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<AtomicU64>,
    #[cfg(not(feature = "cache-padded"))]
    state: AtomicU64,
}

impl AtomicResolver {
    /// Creates a resolver that has not observed any millisecond yet.
    pub fn new() -> Self {
        Self::default()
    }

    const fn tag(millis: u64) -> u64 {
        (millis & TAG_MASK) + 1
    }
}

impl SequenceResolver for AtomicResolver {
    type Err = Infallible;

    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    fn resolve(&self, millis: u64) -> Result<u64, Self::Err> {
        let tag = Self::tag(millis);
        let mut current = self.state.load(Ordering::Relaxed);

        loop {
            let last = current >> COUNTER_BITS;
            let next = if last == tag {
                if current & COUNTER_MASK == COUNTER_MASK {
                    return Ok(COUNTER_MASK);
                }
                current + 1
            } else if last > tag {
                // Stale reading: another caller already moved past `millis`.
                return Ok(COUNTER_MASK);
            } else {
                tag << COUNTER_BITS
            };

            match self.state.compare_exchange_weak(
                current,
                next,
                Ordering::Relaxed,
                Ordering::Relaxed,
            ) {
                Ok(_) => return Ok(next & COUNTER_MASK),
                // Another thread won the race; retry against its state.
                Err(actual) => current = actual,
            }
        }
    }
}
