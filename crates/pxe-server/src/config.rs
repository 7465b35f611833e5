//! Boot service configuration.
//!
//! `BootService` is assembled once at startup (see [`crate::cli`]) and only
//! read afterwards.

use std::borrow::Cow;
use std::net::Ipv4Addr;
use std::path::PathBuf;

use mac_address::MacAddress;

use crate::dnsmasq::LEASE_FILE;
use crate::error::{PxeError, Result};
use crate::netif::BindAddress;
use crate::pxelinux::PxeLinuxConfig;

/// Default dnsmasq location
pub const DEFAULT_DNSMASQ: &str = "/usr/bin/dnsmasq";
/// Default TFTP root
pub const DEFAULT_TFTP_ROOT: &str = ".";
/// Default boot ROM handed out via DHCP
pub const DEFAULT_ROM: &str = "pxelinux.0";
/// Default installation kernel
pub const DEFAULT_KERNEL: &str = "vmlinuz";
/// Default installation initrd
pub const DEFAULT_INITRD: &str = "initrd.img";
/// DNS server advertised to the target (DHCP option 6)
pub const DEFAULT_DNS_SERVER: Ipv4Addr = Ipv4Addr::new(114, 114, 114, 114);

/// The single host being installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetHost {
    /// Address reserved for the host
    pub ip: Ipv4Addr,
    /// Hardware address the reservation is bound to
    pub mac: MacAddress,
}

impl TargetHost {
    /// Parses the target's IPv4 and MAC addresses from their flag values.
    pub fn parse(ip: &str, mac: &str) -> Result<Self> {
        let ip = ip
            .trim()
            .parse::<Ipv4Addr>()
            .map_err(|e| PxeError::InvalidIp {
                input: ip.to_string(),
                reason: e.to_string(),
            })?;
        let mac = colon_form(mac.trim())
            .parse::<MacAddress>()
            .map_err(|e| PxeError::InvalidMac {
                input: mac.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self { ip, mac })
    }
}

/// Rewrites the Cisco-style `0800.27ae.0d26` spelling to `08:00:27:ae:0d:26`.
///
/// Anything else is returned unchanged for `MacAddress` to accept or reject.
fn colon_form(mac: &str) -> Cow<'_, str> {
    let groups: Vec<&str> = mac.split('.').collect();
    let dotted = groups.len() == 3
        && groups
            .iter()
            .all(|g| g.len() == 4 && g.bytes().all(|b| b.is_ascii_hexdigit()));
    if !dotted {
        return Cow::Borrowed(mac);
    }

    let pairs: Vec<&str> = groups
        .into_iter()
        .flat_map(|g| [&g[..2], &g[2..]])
        .collect();
    Cow::Owned(pairs.join(":"))
}

/// Everything needed to render the boot config and start dnsmasq.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootService {
    /// dnsmasq binary
    pub dnsmasq: PathBuf,
    /// Absolute TFTP root; also holds the lease file
    pub tftp_root: PathBuf,
    /// Host that receives the DHCP reservation
    pub target: TargetHost,
    /// Local address and subnet dnsmasq serves
    pub bind: BindAddress,
    /// Boot filename sent in the DHCP reply
    pub rom: String,
    /// Kernel, initrd and command line written to pxelinux.cfg
    pub boot: PxeLinuxConfig,
    /// DNS server handed out as DHCP option 6
    pub dns_server: Ipv4Addr,
}

impl BootService {
    /// dnsmasq lease database path
    #[must_use]
    pub fn lease_file(&self) -> PathBuf {
        self.tftp_root.join(LEASE_FILE)
    }
}
