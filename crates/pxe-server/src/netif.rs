//! Bind-address resolution.
//!
//! Picks the local address dnsmasq should listen on: the first interface
//! address whose subnet contains the target host's IP. The matched subnet
//! also provides the network identifier and mask for the static DHCP range.

use std::net::Ipv4Addr;

use ipnetwork::Ipv4Network;
use network_interface::{Addr, NetworkInterface, NetworkInterfaceConfig};
use tracing::debug;

use crate::error::{PxeError, Result};

/// A local network interface and its IPv4 address/subnet pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalInterface {
    /// Interface name (e.g. `eth0`)
    pub name: String,
    /// Interface addresses with their subnet (host bits preserved)
    pub addrs: Vec<Ipv4Network>,
}

impl LocalInterface {
    /// Creates an interface entry from its name and addresses.
    pub fn new(name: impl Into<String>, addrs: Vec<Ipv4Network>) -> Self {
        Self {
            name: name.into(),
            addrs,
        }
    }

    fn is_loopback(&self) -> bool {
        self.name.starts_with("lo")
    }
}

/// Source of local interfaces.
///
/// The resolver only needs a snapshot of names and addresses, so tests can
/// substitute a fixed list for the host's real interfaces.
pub trait InterfaceSource {
    /// Returns the current interfaces in enumeration order.
    fn interfaces(&self) -> Result<Vec<LocalInterface>>;
}

/// Interfaces of the running host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemInterfaces;

impl InterfaceSource for SystemInterfaces {
    fn interfaces(&self) -> Result<Vec<LocalInterface>> {
        let interfaces =
            NetworkInterface::show().map_err(|e| PxeError::Interfaces(e.to_string()))?;

        debug!("Found {} network interfaces", interfaces.len());

        Ok(interfaces.into_iter().map(local_interface).collect())
    }
}

/// Keeps the IPv4 addresses that carry a usable netmask.
fn local_interface(iface: NetworkInterface) -> LocalInterface {
    let addrs = iface
        .addr
        .iter()
        .filter_map(|addr| match addr {
            Addr::V4(v4) => {
                let netmask = v4.netmask?;
                match Ipv4Network::with_netmask(v4.ip, netmask) {
                    Ok(network) => Some(network),
                    Err(e) => {
                        debug!("Ignoring {}/{} on {}: {}", v4.ip, netmask, iface.name, e);
                        None
                    }
                }
            }
            Addr::V6(_) => None,
        })
        .collect();
    LocalInterface::new(iface.name, addrs)
}

impl InterfaceSource for Vec<LocalInterface> {
    fn interfaces(&self) -> Result<Vec<LocalInterface>> {
        Ok(self.clone())
    }
}

/// Address dnsmasq binds to, with the subnet it was matched in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BindAddress {
    cidr: Ipv4Network,
}

impl BindAddress {
    /// Wraps an interface address/subnet pair.
    #[must_use]
    pub fn new(cidr: Ipv4Network) -> Self {
        Self { cidr }
    }

    /// Local address to listen on
    #[must_use]
    pub fn address(&self) -> Ipv4Addr {
        self.cidr.ip()
    }

    /// Network identifier of the matched subnet
    #[must_use]
    pub fn network_id(&self) -> Ipv4Addr {
        self.cidr.network()
    }

    /// Dotted-quad mask of the matched subnet
    #[must_use]
    pub fn netmask(&self) -> Ipv4Addr {
        self.cidr.mask()
    }

    /// Prefix length of the matched subnet
    #[must_use]
    pub fn prefix(&self) -> u8 {
        self.cidr.prefix()
    }
}

/// Selects the bind address for `target`.
///
/// Interfaces named `lo*` and interfaces without addresses are skipped. The
/// first address (in interface, then address order) whose subnet contains
/// `target` wins. Returns `None` when no local subnet contains it.
#[must_use]
pub fn resolve_bind_address(interfaces: &[LocalInterface], target: Ipv4Addr) -> Option<BindAddress> {
    for iface in interfaces {
        if iface.is_loopback() {
            debug!("Skipping interface {}: loopback", iface.name);
            continue;
        }
        if iface.addrs.is_empty() {
            debug!("Skipping interface {}: no IPv4 addresses", iface.name);
            continue;
        }

        if let Some(cidr) = iface.addrs.iter().find(|cidr| cidr.contains(target)) {
            debug!("Interface {} ({}) contains {}", iface.name, cidr, target);
            return Some(BindAddress::new(*cidr));
        }
    }

    None
}
