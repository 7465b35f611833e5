//! Boot service orchestration.
//!
//! Runs the launch sequence for one target host: verify the dnsmasq binary,
//! write `pxelinux.cfg/default`, then run dnsmasq in the foreground.

use tracing::info;

use crate::config::BootService;
use crate::dnsmasq::{DnsmasqCommand, check_binary};
use crate::error::Result;

/// PXE boot service for a single target host.
#[derive(Debug, Clone)]
pub struct PxeServer {
    service: BootService,
}

impl PxeServer {
    /// Creates a server for an already resolved configuration.
    #[must_use]
    pub fn new(service: BootService) -> Self {
        Self { service }
    }

    /// Configuration this server was built from
    #[must_use]
    pub fn service(&self) -> &BootService {
        &self.service
    }

    /// Performs every step except starting dnsmasq.
    ///
    /// Checks the binary and writes the boot config, returning the command
    /// that [`PxeServer::start`] would run.
    pub fn prepare(&self) -> Result<DnsmasqCommand> {
        check_binary(&self.service.dnsmasq)?;
        self.service.boot.write_to(&self.service.tftp_root)?;
        Ok(DnsmasqCommand::from_service(&self.service))
    }

    /// Prepares the TFTP root and runs dnsmasq until it exits.
    ///
    /// Stops at the first failing step.
    pub async fn start(&self) -> Result<()> {
        info!(
            "Starting PXE boot service for {} ({})",
            self.service.target.ip, self.service.target.mac
        );

        let command = self.prepare()?;
        command.run().await
    }
}
