//! PXE launcher errors

use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Errors that can occur while configuring or launching the boot service.
#[derive(Debug, Error)]
pub enum PxeError {
    /// Target IP could not be parsed as an IPv4 address
    #[error("invalid IPv4 address: {input}")]
    InvalidIp {
        /// Raw flag value
        input: String,
        /// Parser error text
        reason: String,
    },

    /// Target MAC could not be parsed
    #[error("invalid MAC address {input}: {reason}")]
    InvalidMac {
        /// Raw flag value
        input: String,
        /// Parser error text
        reason: String,
    },

    /// Local interfaces could not be enumerated
    #[error("failed to list network interfaces: {0}")]
    Interfaces(String),

    /// No local subnet contains the target IP
    #[error("no local interface has a subnet containing {0}")]
    NoMatchingInterface(Ipv4Addr),

    /// Daemon binary is missing, unreadable or not a file
    #[error("{0}")]
    Binary(String),

    /// Path has to be passed to dnsmasq as text but is not valid UTF-8
    #[error("path is not valid UTF-8: {}", .0.display())]
    NonUtf8Path(PathBuf),

    /// Filesystem operation failed
    #[error("IO error on {}: {source}", path.display())]
    Io {
        /// File or directory being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// pxelinux.cfg rendering failed
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    /// Daemon process could not be started
    #[error("failed to spawn {}: {source}", program.display())]
    Spawn {
        /// Binary that failed to start
        program: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Daemon exited unsuccessfully; the message is its captured stderr
    #[error("{stderr}")]
    Daemon {
        /// Exit status reported by the OS
        status: ExitStatus,
        /// Everything dnsmasq wrote to stderr
        stderr: String,
    },
}

impl PxeError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PxeError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used across the crate
pub type Result<T> = std::result::Result<T, PxeError>;
