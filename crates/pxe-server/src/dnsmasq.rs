//! dnsmasq invocation.
//!
//! dnsmasq does the actual DHCP and TFTP work. It runs in the foreground with
//! DNS disabled, serves a static range covering the bind subnet and hands out
//! exactly one reservation: the target's MAC/IP pair.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::BootService;
use crate::error::{PxeError, Result};

/// Lease database file name, created under the TFTP root
pub const LEASE_FILE: &str = "dnsmasq.lease";

/// Checks that `binary` exists and is not a directory.
pub fn check_binary(binary: &Path) -> Result<()> {
    match fs::metadata(binary) {
        Ok(meta) if meta.is_dir() => Err(PxeError::Binary(format!(
            "{} is a directory",
            binary.display()
        ))),
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(PxeError::Binary(format!(
            "no such file or directory: {}",
            binary.display()
        ))),
        Err(e) => {
            debug!("stat {} failed: {}", binary.display(), e);
            Err(PxeError::Binary(format!(
                "error on reading {}",
                binary.display()
            )))
        }
    }
}

/// A fully derived dnsmasq command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DnsmasqCommand {
    program: PathBuf,
    args: Vec<String>,
}

impl DnsmasqCommand {
    /// Derives the command line for `service`.
    #[must_use]
    pub fn from_service(service: &BootService) -> Self {
        let bind = &service.bind;
        let args = vec![
            // keep in foreground
            "-k".to_string(),
            // no DNS service
            "-p".to_string(),
            "0".to_string(),
            "--log-dhcp".to_string(),
            "--enable-tftp".to_string(),
            format!("--listen-address={}", bind.address()),
            format!("--tftp-root={}", service.tftp_root.display()),
            format!("--dhcp-leasefile={}", service.lease_file().display()),
            format!(
                "--dhcp-range={},static,{}",
                bind.network_id(),
                bind.netmask()
            ),
            format!("--dhcp-host={},{}", service.target.mac, service.target.ip),
            format!("--dhcp-boot={}", service.rom),
            format!("--dhcp-option=6,{}", service.dns_server),
        ];

        Self {
            program: service.dnsmasq.clone(),
            args,
        }
    }

    /// dnsmasq binary
    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Arguments, without the program name
    #[must_use]
    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Shell-style rendering for logs.
    #[must_use]
    pub fn display(&self) -> String {
        std::iter::once(self.program.display().to_string())
            .chain(self.args.iter().cloned())
            .map(|arg| {
                if arg.is_empty() || arg.contains(char::is_whitespace) {
                    format!("'{arg}'")
                } else {
                    arg
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Runs dnsmasq until it exits.
    ///
    /// Output is captured. A non-zero exit is returned as
    /// [`PxeError::Daemon`] carrying dnsmasq's stderr.
    pub async fn run(&self) -> Result<()> {
        info!("Running {}", self.display());

        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| PxeError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.stdout.is_empty() {
            debug!("dnsmasq stdout: {}", String::from_utf8_lossy(&output.stdout));
        }

        if output.status.success() {
            info!("dnsmasq exited cleanly");
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        warn!("dnsmasq exited with {}", output.status);
        Err(PxeError::Daemon {
            status: output.status,
            stderr,
        })
    }
}
