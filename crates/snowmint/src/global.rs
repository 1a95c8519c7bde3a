//! A process-wide default generator.
//!
//! The free functions here share one [`SnowflakeGenerator`] per process. It
//! is created on first use with [`EpochConfig::default`], unless
//! [`configure`] ran first. Configuration is set-once: there is no way to
//! change the epoch or machine ID of the shared generator after it exists.

use std::{sync::OnceLock, time::SystemTime};

use crate::{ConfigError, EpochConfig, Result, Sid, SnowflakeGenerator, SnowflakeId};

static GLOBAL: OnceLock<SnowflakeGenerator> = OnceLock::new();

/// Errors from [`configure`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum GlobalError {
    /// The shared generator already exists, either from an earlier
    /// [`configure`] call or because an ID was generated first.
    #[error("the global generator is already initialized")]
    AlreadyInitialized,

    /// The configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Sets the configuration of the shared generator.
///
/// Call this once during startup, before any ID is generated.
///
/// # Errors
///
/// - [`GlobalError::Config`] if `config` is invalid at the current time
/// - [`GlobalError::AlreadyInitialized`] if the shared generator already
///   exists
pub fn configure(config: EpochConfig) -> Result<(), GlobalError> {
    let generator = SnowflakeGenerator::new(config)?;
    GLOBAL
        .set(generator)
        .map_err(|_| GlobalError::AlreadyInitialized)
}

fn global() -> &'static SnowflakeGenerator {
    GLOBAL.get_or_init(|| SnowflakeGenerator::new_unchecked(EpochConfig::default()))
}

/// The configuration of the shared generator, creating it if needed.
pub fn global_config() -> EpochConfig {
    *global().config()
}

/// Generates an ID with the shared generator.
///
/// This function is thread safe.
///
/// # Errors
///
/// Returns [`Error::EpochExhausted`](crate::Error::EpochExhausted) if the
/// wall clock is outside the lifetime of the configured start epoch.
pub fn try_next_id() -> Result<SnowflakeId> {
    global().try_next_id()
}

/// Generates an ID with the shared generator, returning the zero ID on
/// failure. Use [`try_next_id`] to observe errors.
///
/// This function is thread safe.
pub fn id() -> SnowflakeId {
    global().next_id()
}

/// Decodes a raw identifier.
pub fn parse_id(id: u64) -> Sid {
    Sid::from(id)
}

/// The UTC time at which `sid` was generated, using the shared generator's
/// start epoch.
pub fn generated_at(sid: &Sid) -> Option<SystemTime> {
    global().generated_at(sid)
}
