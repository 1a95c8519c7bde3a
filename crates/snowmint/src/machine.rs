//! Machine ID discovery from the host's private IPv4 address.
//!
//! This is a convenience source for [`EpochConfig::with_machine_id`] and
//! carries no uniqueness guarantee: hosts whose private addresses share the
//! last octet collide, and the octet (0..=255) must still be reduced to the
//! machine ID range, e.g. with `% (MAX_MACHINE_ID + 1)`.
//!
//! [`EpochConfig::with_machine_id`]: crate::EpochConfig::with_machine_id

use std::net::{IpAddr, Ipv4Addr};

/// Returns `true` for addresses in `10.0.0.0/8`, `172.16.0.0/12` and
/// `192.168.0.0/16`.
pub fn is_private_ipv4(ip: Ipv4Addr) -> bool {
    ip.is_private()
}

/// Returns the last octet of the first non-loopback private IPv4 address in
/// `addrs`, or `None` if there is none.
///
/// ```
/// use std::net::{IpAddr, Ipv4Addr};
/// use snowmint::machine::machine_id_from_addrs;
///
/// let addrs = [
///     IpAddr::V4(Ipv4Addr::LOCALHOST),
///     IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)),
///     IpAddr::V4(Ipv4Addr::new(192, 168, 1, 42)),
/// ];
/// assert_eq!(machine_id_from_addrs(addrs), Some(42));
/// ```
pub fn machine_id_from_addrs<I>(addrs: I) -> Option<u8>
where
    I: IntoIterator<Item = IpAddr>,
{
    addrs.into_iter().find_map(|addr| match addr {
        IpAddr::V4(ip) if !ip.is_loopback() && is_private_ipv4(ip) => Some(ip.octets()[3]),
        _ => None,
    })
}

/// Enumerates the host's network interfaces and returns the last octet of the
/// first private, non-loopback IPv4 address.
///
/// Returns `None` if no such address exists or the interfaces cannot be read.
#[cfg(feature = "private-ip")]
pub fn private_ipv4_machine_id() -> Option<u8> {
    let interfaces = match if_addrs::get_if_addrs() {
        Ok(interfaces) => interfaces,
        Err(_e) => {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %_e, "failed to list network interfaces");
            return None;
        }
    };

    let id = machine_id_from_addrs(
        interfaces
            .iter()
            .filter(|iface| !iface.is_loopback())
            .map(if_addrs::Interface::ip),
    );

    #[cfg(feature = "tracing")]
    tracing::debug!(?id, "discovered machine id from private ipv4");

    id
}
