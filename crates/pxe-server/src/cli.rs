//! Command-line configuration.
//!
//! Every flag can also be supplied through a `PXE_BOOT_*` environment
//! variable. The historical single-dash spelling (`-ip 10.0.0.5`) is accepted
//! by rewriting it before clap sees the arguments.

use std::ffi::OsString;
use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::Parser;
use tracing::info;

use crate::config::{
    BootService, DEFAULT_DNS_SERVER, DEFAULT_DNSMASQ, DEFAULT_INITRD, DEFAULT_KERNEL,
    DEFAULT_ROM, DEFAULT_TFTP_ROOT, TargetHost,
};
use crate::error::{PxeError, Result};
use crate::netif::{InterfaceSource, resolve_bind_address};
use crate::pxelinux::PxeLinuxConfig;

/// Long flags that used to be spelled with a single dash
const LEGACY_FLAGS: &[&str] = &[
    "ip", "mac", "tftproot", "dnsmasq", "rom", "kernel", "initrd", "append",
];

/// Serve a PXE installation to a single host through dnsmasq.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "pxe-boot", version, about, long_about = None)]
pub struct LaunchArgs {
    /// IP address of the new server
    #[arg(long, env = "PXE_BOOT_IP")]
    pub ip: String,

    /// MAC address of the new server
    #[arg(long, env = "PXE_BOOT_MAC")]
    pub mac: String,

    /// Path to tftproot
    #[arg(long, env = "PXE_BOOT_TFTPROOT", default_value = DEFAULT_TFTP_ROOT)]
    pub tftproot: PathBuf,

    /// Path to dnsmasq
    #[arg(long, env = "PXE_BOOT_DNSMASQ", default_value = DEFAULT_DNSMASQ)]
    pub dnsmasq: PathBuf,

    /// Path to boot rom
    #[arg(long, env = "PXE_BOOT_ROM", default_value = DEFAULT_ROM)]
    pub rom: String,

    /// Path to installation kernel
    #[arg(long, env = "PXE_BOOT_KERNEL", default_value = DEFAULT_KERNEL)]
    pub kernel: String,

    /// Path to installation init ramdisk
    #[arg(long, env = "PXE_BOOT_INITRD", default_value = DEFAULT_INITRD)]
    pub initrd: String,

    /// Kernel command line appended in pxelinux.cfg
    #[arg(long, env = "PXE_BOOT_APPEND", allow_hyphen_values = true)]
    pub append: Option<String>,

    /// DNS server advertised to the target
    #[arg(long, env = "PXE_BOOT_DNS_SERVER", default_value_t = DEFAULT_DNS_SERVER)]
    pub dns_server: Ipv4Addr,

    /// Render pxelinux.cfg and print the dnsmasq command without running it
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl LaunchArgs {
    /// Builds the immutable service configuration.
    ///
    /// Fails on a TFTP root that is not valid UTF-8, an unparsable IP or MAC,
    /// and when no interface of `source` has a subnet containing the target IP.
    pub fn into_service(self, source: &impl InterfaceSource) -> Result<BootService> {
        let tftp_root =
            std::path::absolute(&self.tftproot).map_err(|e| PxeError::io(&self.tftproot, e))?;
        // dnsmasq takes the root and lease file inside --flag=value text arguments
        if tftp_root.to_str().is_none() {
            return Err(PxeError::NonUtf8Path(tftp_root));
        }
        let target = TargetHost::parse(&self.ip, &self.mac)?;

        let interfaces = source.interfaces()?;
        let bind = resolve_bind_address(&interfaces, target.ip)
            .ok_or(PxeError::NoMatchingInterface(target.ip))?;

        info!("Configuration:");
        info!("  Target: {} ({})", target.ip, target.mac);
        info!(
            "  Bind: {} on {}/{}",
            bind.address(),
            bind.network_id(),
            bind.prefix()
        );
        info!("  TFTP root: {}", tftp_root.display());

        Ok(BootService {
            dnsmasq: self.dnsmasq,
            tftp_root,
            target,
            bind,
            rom: self.rom,
            boot: PxeLinuxConfig {
                kernel: self.kernel,
                initrd: self.initrd,
                append: self.append.unwrap_or_default(),
            },
            dns_server: self.dns_server,
        })
    }
}

/// Rewrites `-ip`/`-ip=…` style flags to `--ip`/`--ip=…`.
///
/// The first argument (program name), short flags, unknown flags and the
/// value following a rewritten flag are passed through unchanged. Nothing
/// after a bare `--` is touched.
pub fn normalize_legacy_flags<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut out = Vec::new();
    let mut args = args.into_iter().map(Into::into);
    let mut value_next = false;

    if let Some(program) = args.next() {
        out.push(program);
    }

    while let Some(arg) = args.next() {
        if value_next {
            value_next = false;
            out.push(arg);
            continue;
        }

        let Some(text) = arg.to_str() else {
            out.push(arg);
            continue;
        };

        if text == "--" {
            out.push(arg);
            out.extend(args.by_ref());
            break;
        }

        let legacy = text
            .strip_prefix('-')
            .filter(|rest| !rest.starts_with('-'))
            .filter(|rest| {
                let name = rest.split_once('=').map_or(*rest, |(name, _)| name);
                LEGACY_FLAGS.contains(&name)
            });

        match legacy {
            Some(rest) => {
                value_next = !rest.contains('=');
                out.push(OsString::from(format!("--{rest}")));
            }
            None => out.push(arg),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netif::LocalInterface;
    use std::path::Path;

    fn interfaces() -> Vec<LocalInterface> {
        vec![
            LocalInterface::new("lo", vec!["127.0.0.1/8".parse().unwrap()]),
            LocalInterface::new("eth1", vec!["192.168.56.1/24".parse().unwrap()]),
        ]
    }

    fn parse(args: &[&str]) -> LaunchArgs {
        LaunchArgs::try_parse_from(normalize_legacy_flags(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_normalize_rewrites_legacy_flags() {
        let args = normalize_legacy_flags([
            "pxe-boot",
            "-tftproot",
            "tftproot",
            "-ip",
            "192.168.56.101",
            "-mac=08:00:27:AE:0D:26",
            "-v",
            "--dry-run",
        ]);

        assert_eq!(
            args,
            [
                "pxe-boot",
                "--tftproot",
                "tftproot",
                "--ip",
                "192.168.56.101",
                "--mac=08:00:27:AE:0D:26",
                "-v",
                "--dry-run",
            ]
            .map(OsString::from)
        );
    }

    #[test]
    fn test_normalize_leaves_flag_values_alone() {
        let args = normalize_legacy_flags(["pxe-boot", "-append", "-ip", "-rom", "x"]);
        assert_eq!(
            args,
            ["pxe-boot", "--append", "-ip", "--rom", "x"].map(OsString::from)
        );
    }

    #[test]
    fn test_normalize_stops_at_terminator() {
        let args = normalize_legacy_flags(["pxe-boot", "--", "-ip"]);
        assert_eq!(args, ["pxe-boot", "--", "-ip"].map(OsString::from));
    }

    #[test]
    fn test_defaults_match_historical_flags() {
        let args = parse(&["pxe-boot", "-ip", "192.168.56.101", "-mac", "08:00:27:AE:0D:26"]);

        assert_eq!(args.tftproot, PathBuf::from("."));
        assert_eq!(args.dnsmasq, PathBuf::from("/usr/bin/dnsmasq"));
        assert_eq!(args.rom, "pxelinux.0");
        assert_eq!(args.kernel, "vmlinuz");
        assert_eq!(args.initrd, "initrd.img");
        assert_eq!(args.append, None);
        assert_eq!(args.dns_server, Ipv4Addr::new(114, 114, 114, 114));
        assert!(!args.dry_run);
    }

    #[test]
    fn test_into_service_resolves_bind_address() {
        let root = tempfile::tempdir().unwrap();
        let root_arg = root.path().display().to_string();
        let args = parse(&[
            "pxe-boot",
            "-tftproot",
            &root_arg,
            "-ip",
            "192.168.56.101",
            "-mac",
            "08:00:27:AE:0D:26",
            "-append",
            "ks=http://192.168.56.1/ks.cfg ksdevice=eth1",
        ]);

        let service = args.into_service(&interfaces()).unwrap();

        assert_eq!(service.tftp_root, root.path());
        assert_eq!(service.target.ip, Ipv4Addr::new(192, 168, 56, 101));
        assert_eq!(service.bind.address(), Ipv4Addr::new(192, 168, 56, 1));
        assert_eq!(service.bind.network_id(), Ipv4Addr::new(192, 168, 56, 0));
        assert_eq!(service.bind.netmask(), Ipv4Addr::new(255, 255, 255, 0));
        assert_eq!(service.boot.append, "ks=http://192.168.56.1/ks.cfg ksdevice=eth1");
        assert_eq!(service.lease_file(), root.path().join("dnsmasq.lease"));
    }

    #[test]
    fn test_into_service_makes_tftp_root_absolute() {
        let args = parse(&["pxe-boot", "--ip", "192.168.56.7", "--mac", "08:00:27:AE:0D:26"]);
        let service = args.into_service(&interfaces()).unwrap();

        assert!(service.tftp_root.is_absolute());
        assert_eq!(service.tftp_root, std::env::current_dir().unwrap());
    }

    #[test]
    fn test_into_service_without_matching_subnet() {
        let args = parse(&["pxe-boot", "--ip", "10.20.30.40", "--mac", "08:00:27:AE:0D:26"]);

        let err = args.into_service(&interfaces()).unwrap_err();
        assert!(matches!(
            err,
            PxeError::NoMatchingInterface(ip) if ip == Ipv4Addr::new(10, 20, 30, 40)
        ));
    }

    #[test]
    fn test_into_service_rejects_bad_ip_before_resolving() {
        let args = parse(&["pxe-boot", "--ip", "not-an-ip", "--mac", "08:00:27:AE:0D:26"]);

        let err = args.into_service(&Vec::<LocalInterface>::new()).unwrap_err();
        assert_eq!(err.to_string(), "invalid IPv4 address: not-an-ip");
    }

    #[cfg(unix)]
    #[test]
    fn test_into_service_rejects_non_utf8_tftp_root() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let root = OsStr::from_bytes(b"/srv/tftp-\xff");
        let args = LaunchArgs::try_parse_from([
            OsStr::new("pxe-boot"),
            OsStr::new("--ip"),
            OsStr::new("192.168.56.7"),
            OsStr::new("--mac"),
            OsStr::new("08:00:27:AE:0D:26"),
            OsStr::new("--tftproot"),
            root,
        ])
        .unwrap();

        let err = args.into_service(&interfaces()).unwrap_err();
        match &err {
            PxeError::NonUtf8Path(path) => assert_eq!(path.as_os_str(), root),
            other => panic!("Expected NonUtf8Path, got {other:?}"),
        }
        assert!(err.to_string().starts_with("path is not valid UTF-8: /srv/tftp-"));
    }

    #[test]
    fn test_relative_tftp_root_is_joined_to_cwd() {
        let args = parse(&[
            "pxe-boot",
            "--ip",
            "192.168.56.7",
            "--mac",
            "08:00:27:AE:0D:26",
            "--tftproot",
            "boot/tftp",
        ]);
        let service = args.into_service(&interfaces()).unwrap();

        assert!(service.tftp_root.ends_with(Path::new("boot/tftp")));
        assert!(service.tftp_root.is_absolute());
    }
}
