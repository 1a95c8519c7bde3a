use core::convert::Infallible;

/// A result type whose error defaults to a generation [`Error`] from an
/// infallible resolver.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Invalid generator configuration, reported once at construction time.
///
/// None of these can occur after a generator has been built: the start epoch
/// and machine ID are immutable from then on.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The start epoch was left at the Unix epoch (zero).
    #[error("the start epoch cannot be zero")]
    ZeroEpoch,

    /// The start epoch lies after the current clock reading.
    #[error("the start epoch ({epoch_ms} ms) is after the current time ({now_ms} ms)")]
    EpochInFuture {
        /// The requested start epoch, in ms since the Unix epoch.
        epoch_ms: u64,
        /// The clock reading at validation time.
        now_ms: u64,
    },

    /// More time has already passed since the start epoch than the timestamp
    /// field can represent.
    #[error(
        "the start epoch ({epoch_ms} ms) is more than {max_ms} ms before the current time ({now_ms} ms)"
    )]
    EpochTooOld {
        /// The requested start epoch, in ms since the Unix epoch.
        epoch_ms: u64,
        /// The clock reading at validation time.
        now_ms: u64,
        /// The largest representable timestamp for the layout.
        max_ms: u64,
    },

    /// The machine ID does not fit in the machine ID field.
    #[error("machine ID {machine_id} exceeds the maximum of {max}")]
    MachineIdOutOfRange {
        /// The requested machine ID.
        machine_id: u64,
        /// The largest machine ID the layout can hold.
        max: u64,
    },
}

/// Errors surfaced by a single call to
/// [`SnowflakeGenerator::try_next_id`].
///
/// The generic parameter `E` is the error type of the active
/// [`SequenceResolver`]. With the default [`AtomicResolver`] it is
/// [`Infallible`], so only [`Error::EpochExhausted`] can be observed.
///
/// [`SnowflakeGenerator::try_next_id`]: crate::SnowflakeGenerator::try_next_id
/// [`SequenceResolver`]: crate::SequenceResolver
/// [`AtomicResolver`]: crate::AtomicResolver
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error<E = Infallible> {
    /// The sequence resolver failed. The resolver's error is passed through
    /// untouched and never retried.
    #[error("sequence resolver failed: {0}")]
    Resolver(#[source] E),

    /// The clock is before the start epoch, or more time has elapsed since the
    /// start epoch than the timestamp field can hold. Recovering requires a
    /// new start epoch.
    #[error("clock reading {now_ms} ms is outside the lifetime of start epoch {epoch_ms} ms")]
    EpochExhausted {
        /// The clock reading used for the failed identifier.
        now_ms: u64,
        /// The configured start epoch, in ms since the Unix epoch.
        epoch_ms: u64,
    },
}

/// Errors raised by the built-in lock-based resolver.
#[derive(Clone, Debug, PartialEq, Eq, Hash, thiserror::Error)]
#[non_exhaustive]
pub enum ResolverError {
    /// The operation failed because the lock was **poisoned**.
    ///
    /// This occurs when a thread panics while holding the lock. When the
    /// `parking-lot` feature is enabled, mutexes do **not** poison, so this
    /// variant is never produced.
    #[error("the sequence resolver lock was poisoned")]
    LockPoisoned,
}

use std::sync::{MutexGuard, PoisonError};
// Convert all poisoned lock errors to a simplified `LockPoisoned`
impl<T> From<PoisonError<MutexGuard<'_, T>>> for ResolverError {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}
