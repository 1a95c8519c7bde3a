use crate::SnowflakeId;

/// A decoded identifier.
///
/// Produced by [`SnowflakeId::decode`] or from a raw `u64`. Decoding is total:
/// any 64-bit value yields a `Sid`, whether or not it came from a generator.
/// Turning the relative [`timestamp`](Sid::timestamp) back into wall-clock
/// time requires the start epoch used when the ID was generated, see
/// [`EpochConfig::absolute_time`](crate::EpochConfig::absolute_time).
///
/// ```
/// use snowmint::Sid;
///
/// let sid = Sid::from((5u64 << 12) | (3 << 6) | 9);
/// assert_eq!((sid.timestamp, sid.machine_id, sid.sequence), (5, 3, 9));
/// ```
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub struct Sid {
    /// Sequence number within the millisecond.
    pub sequence: u64,
    /// Machine discriminator.
    pub machine_id: u64,
    /// Milliseconds since the start epoch.
    pub timestamp: u64,
    /// The raw identifier.
    pub id: u64,
}

impl From<u64> for Sid {
    fn from(raw: u64) -> Self {
        SnowflakeId::from_raw(raw).decode()
    }
}

impl From<SnowflakeId> for Sid {
    fn from(id: SnowflakeId) -> Self {
        id.decode()
    }
}

impl From<Sid> for SnowflakeId {
    fn from(sid: Sid) -> Self {
        SnowflakeId::from_raw(sid.id)
    }
}
