//! Coordinator-free, time-ordered 64-bit identifiers.
//!
//! Every identifier packs three fields, most significant first:
//!
//! ```text
//!  Bit Index:  63          53 52            12 11            6 5            0
//!              +-------------+----------------+---------------+--------------+
//!  Field:      | unused (11) | timestamp (41) | machine ID (6) | sequence (6) |
//!              +-------------+----------------+---------------+--------------+
//! ```
//!
//! The timestamp is the number of milliseconds since a configurable start
//! epoch, the machine ID distinguishes concurrently generating nodes, and the
//! sequence disambiguates identifiers minted within the same millisecond.
//!
//! ```
//! use snowmint::{EpochConfig, SnowflakeGenerator};
//!
//! let generator = SnowflakeGenerator::new(EpochConfig::default().with_machine_id(7))?;
//! let id = generator.try_next_id()?;
//! let sid = id.decode();
//! assert_eq!(sid.machine_id, 7);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
mod config;
mod error;
mod generator;
#[cfg(feature = "global")]
mod global;
mod id;
pub mod machine;
mod resolver;
mod time;

pub use crate::config::*;
pub use crate::error::*;
pub use crate::generator::*;
#[cfg(feature = "global")]
pub use crate::global::*;
pub use crate::id::*;
pub use crate::resolver::*;
pub use crate::time::*;
