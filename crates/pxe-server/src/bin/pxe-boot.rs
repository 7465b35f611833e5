//! pxe-boot
//!
//! Network-installs a single machine: resolves the bind address for the
//! target, writes `pxelinux.cfg/default` and runs dnsmasq in the foreground.
//!
//! ```text
//! sudo pxe-boot -tftproot tftproot -dnsmasq /usr/local/sbin/dnsmasq \
//!     -ip 192.168.56.101 -mac 08:00:27:AE:0D:26 \
//!     -append "ks=http://192.168.56.1/ks.cfg ksdevice=eth1"
//! ```

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use pxe_server::{LaunchArgs, PxeServer, SystemInterfaces, normalize_legacy_flags};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = LaunchArgs::parse_from(normalize_legacy_flags(std::env::args_os()));

    // RUST_LOG wins; -v only changes the fallback
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "pxe_server={default_level},pxe_boot={default_level}"
        ))
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: LaunchArgs) -> Result<()> {
    info!("Starting PXE boot launcher");

    let dry_run = args.dry_run;
    let service = args
        .into_service(&SystemInterfaces)
        .context("Argument error")?;
    let server = PxeServer::new(service);

    if dry_run {
        let command = server.prepare().context("Service error")?;
        println!("{}", serde_json::to_string_pretty(&command)?);
        return Ok(());
    }

    server.start().await.context("Service error")?;
    Ok(())
}
