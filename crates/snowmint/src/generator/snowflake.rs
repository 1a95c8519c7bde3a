use core::marker::PhantomData;
use std::time::SystemTime;

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::{
    AtomicResolver, ConfigError, EpochConfig, Error, SequenceResolver, Sid, Snowflake,
    SnowflakeId, SystemClock, TimeSource, WaitStrategy,
};

/// A thread-safe Snowflake ID generator.
///
/// The generator combines an immutable [`EpochConfig`], a [`TimeSource`] and a
/// [`SequenceResolver`]. Each call samples the clock, asks the resolver for a
/// sequence number within that millisecond and packs the result into an `ID`.
/// All methods take `&self`; share one generator across threads with an
/// [`Arc`](std::sync::Arc) or a `static`.
///
/// ## Features
/// - ✅ Thread-safe (the resolver is the only shared mutable state)
/// - ✅ Pluggable clock and resolver
/// - ✅ Configuration validated at construction
///
/// ## Caveats
/// - When a millisecond's sequence space is exhausted the call busy-waits for
///   the next millisecond. It cannot be cancelled.
/// - A clock reading older than one the resolver has already seen counts as
///   an exhausted millisecond: the call waits until the clock catches up, so a
///   backward clock step stalls generation instead of reissuing IDs.
///
/// # Example
///
/// ```
/// use core::time::Duration;
/// use snowmint::{EpochConfig, SnowflakeGenerator};
///
/// let config = EpochConfig::new(Duration::from_millis(1_600_000_000_000), 3);
/// let generator = SnowflakeGenerator::new(config)?;
///
/// let id = generator.try_next_id()?;
/// assert_eq!(id.machine_id(), 3);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct SnowflakeGenerator<ID = SnowflakeId, T = SystemClock, R = AtomicResolver>
where
    ID: Snowflake,
    T: TimeSource,
    R: SequenceResolver,
{
    config: EpochConfig,
    epoch_millis: u64,
    time: T,
    resolver: R,
    wait: WaitStrategy,
    _id: PhantomData<ID>,
}

impl SnowflakeGenerator<SnowflakeId, SystemClock, AtomicResolver> {
    /// Creates a generator for [`SnowflakeId`]s using the wall clock and the
    /// lock-free [`AtomicResolver`].
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `config` is invalid at the current time,
    /// see [`EpochConfig::validate`].
    pub fn new(config: EpochConfig) -> Result<Self, ConfigError> {
        Self::try_new(config, SystemClock, AtomicResolver::new())
    }

    /// Builds the process-wide default generator without validation; any
    /// problem surfaces per call as [`Error::EpochExhausted`].
    #[cfg(feature = "global")]
    pub(crate) fn new_unchecked(config: EpochConfig) -> Self {
        Self::from_parts(config, SystemClock, AtomicResolver::new())
    }
}

impl<ID, T, R> SnowflakeGenerator<ID, T, R>
where
    ID: Snowflake,
    T: TimeSource,
    R: SequenceResolver,
{
    /// Creates a generator from explicit parts.
    ///
    /// The configuration is checked against the layout of `ID` and a single
    /// reading of `time`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the start epoch is zero, after the current
    /// time, or too far in the past for the timestamp field, or if the machine
    /// ID does not fit in its field.
    pub fn try_new(config: EpochConfig, time: T, resolver: R) -> Result<Self, ConfigError> {
        let now = time.current_millis();
        if let Err(err) = config.validate::<ID>(now) {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %err, "rejected generator configuration");
            return Err(err);
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(
            epoch_ms = config.epoch_millis(),
            machine_id = config.machine_id(),
            "configured snowflake generator"
        );

        Ok(Self::from_parts(config, time, resolver))
    }

    fn from_parts(config: EpochConfig, time: T, resolver: R) -> Self {
        Self {
            epoch_millis: config.epoch_millis(),
            config,
            time,
            resolver,
            wait: WaitStrategy::default(),
            _id: PhantomData,
        }
    }

    /// Replaces the sequence resolver, keeping the configuration and clock.
    ///
    /// The new resolver starts from its own state; call this before the
    /// generator is shared.
    pub fn with_resolver<R2: SequenceResolver>(self, resolver: R2) -> SnowflakeGenerator<ID, T, R2> {
        SnowflakeGenerator {
            config: self.config,
            epoch_millis: self.epoch_millis,
            time: self.time,
            resolver,
            wait: self.wait,
            _id: PhantomData,
        }
    }

    /// Sets how the generator waits when a millisecond is exhausted.
    #[must_use]
    pub fn with_wait_strategy(mut self, wait: WaitStrategy) -> Self {
        self.wait = wait;
        self
    }

    /// The configuration this generator was built with.
    pub fn config(&self) -> &EpochConfig {
        &self.config
    }

    /// The active wait strategy.
    pub fn wait_strategy(&self) -> WaitStrategy {
        self.wait
    }

    /// Generates the next ID, discarding any error.
    ///
    /// This is the best-effort counterpart to [`Self::try_next_id`]: on
    /// failure it returns the ID whose raw value is `0`. Callers that need to
    /// know about resolver failures or epoch exhaustion must use
    /// [`Self::try_next_id`].
    ///
    /// # Example
    /// ```
    /// use snowmint::{EpochConfig, SnowflakeGenerator};
    ///
    /// let generator = SnowflakeGenerator::new(EpochConfig::default())?;
    /// let a = generator.next_id();
    /// let b = generator.next_id();
    /// assert!(a < b);
    /// # Ok::<(), snowmint::ConfigError>(())
    /// ```
    pub fn next_id(&self) -> ID {
        match self.try_next_id() {
            Ok(id) => id,
            Err(_e) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %_e, "discarding id generation error");
                ID::from_raw(0)
            }
        }
    }

    /// Generates the next ID.
    ///
    /// 1. Samples the clock.
    /// 2. Resolves a sequence for that millisecond.
    /// 3. While the sequence is at or above `ID::max_sequence()` (the
    ///    millisecond is used up, or older than one already resolved), waits
    ///    for the clock to change and resolves again.
    /// 4. Checks that the reading lies within the representable lifetime of
    ///    the start epoch.
    /// 5. Packs `(now - epoch, machine_id, sequence)`.
    ///
    /// # Errors
    ///
    /// - [`Error::Resolver`] with the resolver's error, unchanged
    /// - [`Error::EpochExhausted`] if the clock is before the start epoch or
    ///   more than `ID::max_timestamp()` ms after it
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_next_id(&self) -> Result<ID, Error<R::Err>> {
        let mut now = self.time.current_millis();
        let mut sequence = self.resolver.resolve(now).map_err(Error::Resolver)?;

        while sequence >= ID::max_sequence() {
            #[cfg(feature = "tracing")]
            tracing::trace!(now, sequence, "sequence exhausted, waiting for next millisecond");
            now = self.wait_for_next_millis(now);
            sequence = self.resolver.resolve(now).map_err(Error::Resolver)?;
        }

        let Some(elapsed) = now
            .checked_sub(self.epoch_millis)
            .filter(|elapsed| *elapsed <= ID::max_timestamp())
        else {
            return Err(self.cold_epoch_exhausted(now));
        };

        Ok(ID::from_components(
            elapsed,
            self.config.machine_id(),
            sequence,
        ))
    }

    /// Milliseconds since the Unix epoch at which `sid` was generated,
    /// assuming this generator's configuration was used to encode it.
    pub fn generated_at_millis(&self, sid: &Sid) -> u64 {
        self.config.absolute_millis(sid)
    }

    /// The UTC wall-clock time at which `sid` was generated, assuming this
    /// generator's configuration was used to encode it.
    pub fn generated_at(&self, sid: &Sid) -> Option<SystemTime> {
        self.config.absolute_time(sid)
    }

    fn wait_for_next_millis(&self, last: u64) -> u64 {
        let mut now = self.time.current_millis();
        while now == last {
            self.wait.relax();
            now = self.time.current_millis();
        }
        now
    }

    #[cold]
    #[inline(never)]
    fn cold_epoch_exhausted(&self, now: u64) -> Error<R::Err> {
        #[cfg(feature = "tracing")]
        tracing::warn!(
            now_ms = now,
            epoch_ms = self.epoch_millis,
            "clock is outside the start epoch's lifetime"
        );
        Error::EpochExhausted {
            now_ms: now,
            epoch_ms: self.epoch_millis,
        }
    }
}
