use core::time::Duration;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::{ConfigError, DEFAULT_EPOCH, Sid, Snowflake};

/// The start epoch and machine ID a generator stamps into every identifier.
///
/// An `EpochConfig` is plain data: the `with_*` methods never fail. It is
/// validated once, when a [`SnowflakeGenerator`] is built from it, and is
/// immutable from then on.
///
/// The epoch is not embedded in identifiers. Decoding with a different
/// configuration than the one used for encoding yields a wrong absolute time.
///
/// # Example
///
/// ```
/// use core::time::Duration;
/// use snowmint::{ConfigError, EpochConfig, SnowflakeId, SystemClock, TimeSource};
///
/// let config = EpochConfig::default()
///     .with_start_epoch(Duration::from_millis(1_600_000_000_000))
///     .with_machine_id(64);
///
/// let err = config
///     .validate::<SnowflakeId>(SystemClock.current_millis())
///     .unwrap_err();
/// assert_eq!(err, ConfigError::MachineIdOutOfRange { machine_id: 64, max: 63 });
/// ```
///
/// [`SnowflakeGenerator`]: crate::SnowflakeGenerator
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EpochConfig {
    start_epoch: Duration,
    machine_id: u64,
}

impl Default for EpochConfig {
    /// [`DEFAULT_EPOCH`] with machine ID `0`.
    fn default() -> Self {
        Self::new(DEFAULT_EPOCH, 0)
    }
}

impl EpochConfig {
    /// Creates a configuration from a start epoch (as a [`Duration`] since
    /// 1970-01-01 UTC) and a machine ID.
    pub const fn new(start_epoch: Duration, machine_id: u64) -> Self {
        Self {
            start_epoch,
            machine_id,
        }
    }

    /// Replaces the start epoch.
    #[must_use]
    pub const fn with_start_epoch(mut self, start_epoch: Duration) -> Self {
        self.start_epoch = start_epoch;
        self
    }

    /// Replaces the machine ID.
    #[must_use]
    pub const fn with_machine_id(mut self, machine_id: u64) -> Self {
        self.machine_id = machine_id;
        self
    }

    /// The start epoch as a [`Duration`] since the Unix epoch.
    pub const fn start_epoch(&self) -> Duration {
        self.start_epoch
    }

    /// The machine ID stamped into every identifier.
    pub const fn machine_id(&self) -> u64 {
        self.machine_id
    }

    /// The start epoch in milliseconds since the Unix epoch, saturating at
    /// `u64::MAX`.
    pub fn epoch_millis(&self) -> u64 {
        u64::try_from(self.start_epoch.as_millis()).unwrap_or(u64::MAX)
    }

    /// Checks the configuration against the layout of `ID` and the clock
    /// reading `now_ms` (milliseconds since the Unix epoch).
    ///
    /// # Errors
    ///
    /// - [`ConfigError::ZeroEpoch`] if the start epoch is zero
    /// - [`ConfigError::EpochInFuture`] if the start epoch is after `now_ms`
    /// - [`ConfigError::EpochTooOld`] if more than `ID::max_timestamp()` ms
    ///   have passed since the start epoch
    /// - [`ConfigError::MachineIdOutOfRange`] if the machine ID exceeds
    ///   `ID::max_machine_id()`
    pub fn validate<ID: Snowflake>(&self, now_ms: u64) -> Result<(), ConfigError> {
        if self.start_epoch.is_zero() {
            return Err(ConfigError::ZeroEpoch);
        }

        let epoch_ms = self.epoch_millis();
        let Some(elapsed) = now_ms.checked_sub(epoch_ms) else {
            return Err(ConfigError::EpochInFuture { epoch_ms, now_ms });
        };
        if elapsed > ID::max_timestamp() {
            return Err(ConfigError::EpochTooOld {
                epoch_ms,
                now_ms,
                max_ms: ID::max_timestamp(),
            });
        }

        if self.machine_id > ID::max_machine_id() {
            return Err(ConfigError::MachineIdOutOfRange {
                machine_id: self.machine_id,
                max: ID::max_machine_id(),
            });
        }

        Ok(())
    }

    /// Milliseconds since the Unix epoch at which `sid` was generated,
    /// assuming it was generated under this configuration. Saturates at
    /// `u64::MAX` for foreign values.
    pub fn absolute_millis(&self, sid: &Sid) -> u64 {
        self.epoch_millis().saturating_add(sid.timestamp)
    }

    /// The UTC wall-clock time at which `sid` was generated, assuming it was
    /// generated under this configuration.
    ///
    /// Returns `None` only if the platform's [`SystemTime`] cannot represent
    /// the instant, which can happen for foreign values with reserved bits
    /// set.
    pub fn absolute_time(&self, sid: &Sid) -> Option<SystemTime> {
        UNIX_EPOCH.checked_add(Duration::from_millis(self.absolute_millis(sid)))
    }
}
