//! PXE Boot Launcher
//!
//! Serves a network installation to exactly one machine by driving `dnsmasq`.
//!
//! The launcher:
//! - picks the local address whose subnet contains the target's IP
//! - renders `pxelinux.cfg/default` for the installation kernel and initrd
//! - runs dnsmasq with DHCP restricted to a static reservation for the
//!   target's MAC/IP pair and TFTP serving the boot files
//!
//! # Example
//!
//! ```no_run
//! use pxe_server::{LaunchArgs, PxeServer, SystemInterfaces};
//! use clap::Parser;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let args = LaunchArgs::parse_from([
//!     "pxe-boot",
//!     "--ip", "192.168.56.101",
//!     "--mac", "08:00:27:AE:0D:26",
//!     "--tftproot", "/srv/tftp",
//! ]);
//! let service = args.into_service(&SystemInterfaces)?;
//! PxeServer::new(service).start().await?;
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod dnsmasq;
pub mod error;
pub mod netif;
pub mod pxelinux;
pub mod server;

pub use cli::{LaunchArgs, normalize_legacy_flags};
pub use config::{BootService, TargetHost};
pub use dnsmasq::DnsmasqCommand;
pub use error::*;
pub use netif::{BindAddress, InterfaceSource, LocalInterface, SystemInterfaces};
pub use pxelinux::PxeLinuxConfig;
pub use server::*;
