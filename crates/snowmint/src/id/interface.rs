use core::{fmt, hash::Hash};

/// A trait representing a layout-compatible Snowflake ID.
///
/// This trait abstracts the core behavior of a Snowflake-style ID with separate
/// bit fields for timestamp, machine ID, and sequence, packed into a `u64`.
/// The generator is written against this trait so that it never hard-codes
/// shifts or masks.
///
/// # Example
///
/// ```
/// use snowmint::{Snowflake, SnowflakeId};
///
/// let id = SnowflakeId::from_components(1000, 2, 1);
/// assert_eq!(id.timestamp(), 1000);
/// assert_eq!(id.machine_id(), 2);
/// assert_eq!(id.sequence(), 1);
/// ```
pub trait Snowflake:
    Sized + Copy + Clone + fmt::Display + fmt::Debug + PartialOrd + Ord + PartialEq + Eq + Hash
{
    /// Returns the timestamp portion of the ID.
    fn timestamp(&self) -> u64;

    /// Returns the maximum possible value for the timestamp field.
    fn max_timestamp() -> u64;

    /// Returns the machine ID portion of the ID.
    fn machine_id(&self) -> u64;

    /// Returns the maximum possible value for the machine_id field.
    fn max_machine_id() -> u64;

    /// Returns the sequence portion of the ID.
    fn sequence(&self) -> u64;

    /// Returns the maximum possible value for the sequence field.
    fn max_sequence() -> u64;

    /// Constructs a new Snowflake ID from its components.
    fn from_components(timestamp: u64, machine_id: u64, sequence: u64) -> Self;

    /// Converts this type into its raw representation.
    fn to_raw(&self) -> u64;

    /// Converts a raw value into this type.
    fn from_raw(raw: u64) -> Self;
}
