//! Network address value types.
//!
//! Parses textual IPv4/IPv6 address and prefix pairs into validated value
//! types consumed by the description parser and the protocol stacks. Pure
//! conversions, no side effects; the fallible constructors return `None` on
//! malformed input so callers decide how to report the failure.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// An IPv4 interface address: host address plus contiguous netmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkV4 {
    address: Ipv4Addr,
    netmask: Ipv4Addr,
}

impl NetworkV4 {
    /// Returns `None` when the netmask bits are not contiguous.
    pub fn new(address: Ipv4Addr, netmask: Ipv4Addr) -> Option<Self> {
        if !is_contiguous_mask(netmask) {
            return None;
        }
        Some(Self { address, netmask })
    }

    pub fn address(&self) -> Ipv4Addr {
        self.address
    }

    pub fn netmask(&self) -> Ipv4Addr {
        self.netmask
    }

    /// The network part of the address, host bits masked off.
    pub fn network(&self) -> Ipv4Addr {
        Ipv4Addr::from(u32::from(self.address) & u32::from(self.netmask))
    }

    pub fn prefix_len(&self) -> u8 {
        u32::from(self.netmask).count_ones() as u8
    }
}

impl fmt::Display for NetworkV4 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len())
    }
}

/// An IPv6 interface address: host address plus prefix length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkV6 {
    address: Ipv6Addr,
    prefix_len: u8,
}

impl NetworkV6 {
    /// Returns `None` when the prefix length exceeds 128.
    pub fn new(address: Ipv6Addr, prefix_len: u8) -> Option<Self> {
        if prefix_len > 128 {
            return None;
        }
        Some(Self { address, prefix_len })
    }

    pub fn address(&self) -> Ipv6Addr {
        self.address
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }
}

impl fmt::Display for NetworkV6 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

/// Parse an IPv4 network from textual address and netmask.
pub fn from_string_v4(address: &str, netmask: &str) -> Option<NetworkV4> {
    let address = address.trim().parse::<Ipv4Addr>().ok()?;
    let netmask = netmask.trim().parse::<Ipv4Addr>().ok()?;
    NetworkV4::new(address, netmask)
}

/// Parse an IPv6 network from a textual address and a prefix length.
pub fn from_string_v6(address: &str, prefix_len: u8) -> Option<NetworkV6> {
    let address = address.trim().parse::<Ipv6Addr>().ok()?;
    NetworkV6::new(address, prefix_len)
}

fn is_contiguous_mask(mask: Ipv4Addr) -> bool {
    let bits = u32::from(mask);
    bits.leading_ones() + bits.trailing_zeros() == 32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ipv4_network() {
        let network = from_string_v4("10.1.22.222", "255.255.255.0").unwrap();
        assert_eq!(network.address(), Ipv4Addr::new(10, 1, 22, 222));
        assert_eq!(network.netmask(), Ipv4Addr::new(255, 255, 255, 0));
        assert_eq!(network.prefix_len(), 24);
        assert_eq!(network.network(), Ipv4Addr::new(10, 1, 22, 0));
        assert_eq!(network.to_string(), "10.1.22.222/24");
    }

    #[test]
    fn test_parse_ipv4_rejects_bad_input() {
        assert!(from_string_v4("10.1.22.256", "255.255.255.0").is_none());
        assert!(from_string_v4("not an ip", "255.255.255.0").is_none());
        assert!(from_string_v4("10.1.22.1", "255.0.255.0").is_none());
        assert!(from_string_v4("10.1.22.1", "garbage").is_none());
    }

    #[test]
    fn test_zero_and_full_masks_are_contiguous() {
        assert!(from_string_v4("10.0.0.1", "0.0.0.0").is_some());
        assert!(from_string_v4("10.0.0.1", "255.255.255.255").is_some());
    }

    #[test]
    fn test_parse_ipv6_network() {
        let network = from_string_v6("2022:dead:beef:2023::1", 64).unwrap();
        assert_eq!(
            network.address(),
            "2022:dead:beef:2023::1".parse::<Ipv6Addr>().unwrap()
        );
        assert_eq!(network.prefix_len(), 64);
        assert_eq!(network.to_string(), "2022:dead:beef:2023::1/64");
    }

    #[test]
    fn test_parse_ipv6_rejects_bad_input() {
        assert!(from_string_v6("not:an:address::zz", 64).is_none());
        assert!(from_string_v6("::1", 129).is_none());
    }
}
