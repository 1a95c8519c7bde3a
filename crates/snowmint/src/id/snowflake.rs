use core::fmt;

use crate::{Sid, Snowflake};

/// Bit width of the relative timestamp field.
pub const TIMESTAMP_BITS: u32 = 41;

/// Bit width of the machine ID field.
pub const MACHINE_ID_BITS: u32 = 6;

/// Bit width of the sequence field.
pub const SEQUENCE_BITS: u32 = 6;

/// Largest relative timestamp, in milliseconds (about 69.7 years).
pub const MAX_TIMESTAMP: u64 = (1 << TIMESTAMP_BITS) - 1;

/// Largest machine ID (63).
pub const MAX_MACHINE_ID: u64 = (1 << MACHINE_ID_BITS) - 1;

/// Largest sequence value (63).
pub const MAX_SEQUENCE: u64 = (1 << SEQUENCE_BITS) - 1;

/// A 64-bit Snowflake ID using the 41/6/6 layout.
///
/// - 11 bits unused (always zero for generated IDs)
/// - 41 bits timestamp (ms since the configured start epoch)
/// - 6 bits machine ID
/// - 6 bits sequence
///
/// ```text
///  Bit Index:  63           53 52             12 11              6 5             0
///              +--------------+----------------+-----------------+---------------+
///  Field:      | unused (11)  | timestamp (41) | machine ID (6)  | sequence (6)  |
///              +--------------+----------------+-----------------+---------------+
///              |<----------- MSB ---------- 64 bits ----------- LSB ------------>|
/// ```
///
/// This layout is part of the wire format; changing any width is a breaking
/// change.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
#[derive(Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SnowflakeId {
    id: u64,
}

impl SnowflakeId {
    /// Bitmask for extracting the 41-bit timestamp field. Occupies bits 12
    /// through 52.
    pub const TIMESTAMP_MASK: u64 = MAX_TIMESTAMP;

    /// Bitmask for extracting the 6-bit machine ID field. Occupies bits 6
    /// through 11.
    pub const MACHINE_ID_MASK: u64 = MAX_MACHINE_ID;

    /// Bitmask for extracting the 6-bit sequence field. Occupies bits 0
    /// through 5.
    pub const SEQUENCE_MASK: u64 = MAX_SEQUENCE;

    /// Number of bits to shift the timestamp to its correct position (bit 12).
    pub const TIMESTAMP_SHIFT: u32 = MACHINE_ID_BITS + SEQUENCE_BITS;

    /// Number of bits to shift the machine ID to its correct position (bit 6).
    pub const MACHINE_ID_SHIFT: u32 = SEQUENCE_BITS;

    /// Number of bits to shift the sequence field (bit 0).
    pub const SEQUENCE_SHIFT: u32 = 0;

    /// Bits above the timestamp field. Generated IDs never set them.
    pub const RESERVED_MASK: u64 = !((Self::TIMESTAMP_MASK << Self::TIMESTAMP_SHIFT)
        | (Self::MACHINE_ID_MASK << Self::MACHINE_ID_SHIFT)
        | (Self::SEQUENCE_MASK << Self::SEQUENCE_SHIFT));

    /// Packs the three fields into an ID. Each value is masked to its field
    /// width.
    pub const fn from_components(timestamp: u64, machine_id: u64, sequence: u64) -> Self {
        let timestamp = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let machine_id = (machine_id & Self::MACHINE_ID_MASK) << Self::MACHINE_ID_SHIFT;
        let sequence = (sequence & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        Self {
            id: timestamp | machine_id | sequence,
        }
    }

    /// Wraps a raw 64-bit value without any validation.
    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    /// Returns the packed 64-bit value.
    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Extracts the relative timestamp from the packed ID.
    ///
    /// Everything above the machine ID is treated as timestamp, so foreign
    /// values with reserved bits set decode to an oversized timestamp rather
    /// than being truncated.
    pub const fn timestamp(&self) -> u64 {
        self.id >> Self::TIMESTAMP_SHIFT
    }

    /// Extracts the machine ID from the packed ID.
    pub const fn machine_id(&self) -> u64 {
        (self.id >> Self::MACHINE_ID_SHIFT) & Self::MACHINE_ID_MASK
    }

    /// Extracts the sequence number from the packed ID.
    pub const fn sequence(&self) -> u64 {
        (self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    /// Returns `true` if none of the reserved high bits are set, i.e. the value
    /// could have been produced by a generator.
    pub const fn is_valid(&self) -> bool {
        self.id & Self::RESERVED_MASK == 0
    }

    /// Splits the ID into its fields.
    pub const fn decode(&self) -> Sid {
        Sid {
            sequence: self.sequence(),
            machine_id: self.machine_id(),
            timestamp: self.timestamp(),
            id: self.id,
        }
    }

    /// Returns the ID as a zero-padded 20-digit string.
    pub fn to_padded_string(&self) -> String {
        format!("{:020}", self.id)
    }
}

impl Snowflake for SnowflakeId {
    fn timestamp(&self) -> u64 {
        self.timestamp()
    }

    fn max_timestamp() -> u64 {
        Self::TIMESTAMP_MASK
    }

    fn machine_id(&self) -> u64 {
        self.machine_id()
    }

    fn max_machine_id() -> u64 {
        Self::MACHINE_ID_MASK
    }

    fn sequence(&self) -> u64 {
        self.sequence()
    }

    fn max_sequence() -> u64 {
        Self::SEQUENCE_MASK
    }

    fn from_components(timestamp: u64, machine_id: u64, sequence: u64) -> Self {
        debug_assert!(timestamp <= Self::TIMESTAMP_MASK, "timestamp overflow");
        debug_assert!(machine_id <= Self::MACHINE_ID_MASK, "machine_id overflow");
        debug_assert!(sequence <= Self::SEQUENCE_MASK, "sequence overflow");
        Self::from_components(timestamp, machine_id, sequence)
    }

    fn to_raw(&self) -> u64 {
        self.id
    }

    fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }
}

impl From<u64> for SnowflakeId {
    fn from(raw: u64) -> Self {
        Self::from_raw(raw)
    }
}

impl From<SnowflakeId> for u64 {
    fn from(id: SnowflakeId) -> Self {
        id.id
    }
}

impl fmt::Display for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl fmt::Debug for SnowflakeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnowflakeId")
            .field("id", &self.id)
            .field("timestamp", &self.timestamp())
            .field("machine_id", &self.machine_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}
