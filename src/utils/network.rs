// file: src/utils/network.rs
// version: 2.0.0
// guid: 9d41f7c3-2a6b-4e05-8c9f-13b7e2d4a860

//! Subnet arithmetic and local address detection

use crate::error::BootstrapError;
use crate::Result;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;
use tracing::debug;

/// Network utilities used by the config synthesizer
pub struct NetworkUtils;

/// Derived IPv4 network information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    pub network: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub broadcast: Ipv4Addr,
    pub first_usable: Ipv4Addr,
    pub last_usable: Ipv4Addr,
    pub prefix_len: u8,
}

impl NetworkUtils {
    /// Validate IP address format
    pub fn validate_ip_address(ip: &str) -> Result<IpAddr> {
        IpAddr::from_str(ip.trim())
            .map_err(|e| BootstrapError::validation(format!("Invalid IP address {}: {}", ip, e)))
    }

    /// Validate network CIDR format
    pub fn validate_cidr(cidr: &str) -> Result<(IpAddr, u8)> {
        let (addr, prefix) = cidr
            .trim()
            .split_once('/')
            .ok_or_else(|| BootstrapError::validation(format!("Invalid CIDR format: {}", cidr)))?;

        let ip = Self::validate_ip_address(addr)?;
        let prefix_len = prefix.parse::<u8>().map_err(|_| {
            BootstrapError::validation(format!("Invalid prefix length in {}: {}", cidr, prefix))
        })?;

        let max_prefix = match ip {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };

        if prefix_len > max_prefix {
            return Err(BootstrapError::validation(format!(
                "Prefix length {} exceeds maximum {} in {}",
                prefix_len, max_prefix, cidr
            )));
        }

        Ok((ip, prefix_len))
    }

    /// Calculate network and broadcast addresses
    pub fn calculate_network_info(ip: Ipv4Addr, prefix_len: u8) -> Result<NetworkInfo> {
        if prefix_len > 32 {
            return Err(BootstrapError::validation(format!(
                "Invalid prefix length for IPv4: {}",
                prefix_len
            )));
        }

        let ip_u32 = u32::from(ip);
        let mask_u32 = if prefix_len == 0 {
            0
        } else {
            u32::MAX << (32 - prefix_len)
        };
        let network_u32 = ip_u32 & mask_u32;
        let broadcast_u32 = network_u32 | !mask_u32;

        // /31 and /32 have no network/broadcast reservation
        let (first_usable, last_usable) = if prefix_len >= 31 {
            (network_u32, broadcast_u32)
        } else {
            (network_u32 + 1, broadcast_u32 - 1)
        };

        Ok(NetworkInfo {
            network: Ipv4Addr::from(network_u32),
            netmask: Ipv4Addr::from(mask_u32),
            broadcast: Ipv4Addr::from(broadcast_u32),
            first_usable: Ipv4Addr::from(first_usable),
            last_usable: Ipv4Addr::from(last_usable),
            prefix_len,
        })
    }

    /// First host address of a subnet, e.g. `10.233.0.0/18` -> `10.233.0.1`
    pub fn first_usable_address(cidr: &str) -> Result<IpAddr> {
        match Self::validate_cidr(cidr)? {
            (IpAddr::V4(ip), prefix_len) => {
                Ok(IpAddr::V4(Self::calculate_network_info(ip, prefix_len)?.first_usable))
            }
            (IpAddr::V6(ip), prefix_len) => {
                let mask = if prefix_len == 0 {
                    0
                } else {
                    u128::MAX << (128 - prefix_len)
                };
                let network = u128::from(ip) & mask;
                let first = if prefix_len == 128 { network } else { network + 1 };
                Ok(IpAddr::V6(Ipv6Addr::from(first)))
            }
        }
    }

    /// Primary non-loopback IPv4 address of this machine
    pub fn detect_local_address() -> Option<IpAddr> {
        use network_interface::{NetworkInterface, NetworkInterfaceConfig};

        let interfaces = match NetworkInterface::show() {
            Ok(interfaces) => interfaces,
            Err(e) => {
                debug!("Failed to list network interfaces: {}", e);
                return None;
            }
        };

        interfaces
            .into_iter()
            .filter(|iface| !iface.name.starts_with("lo"))
            .flat_map(|iface| iface.addr)
            .map(|addr| addr.ip())
            .find(|ip| ip.is_ipv4() && !ip.is_loopback())
    }
}
