//! pxelinux.cfg rendering.
//!
//! The boot loader fetches `pxelinux.cfg/default` from the TFTP root. It holds
//! a single `default` label pointing at the installation kernel and initrd.

use std::fs;
use std::path::{Path, PathBuf};

use minijinja::{AutoEscape, Environment};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{PxeError, Result};

/// Directory under the TFTP root that pxelinux searches for configs
pub const CONFIG_DIR: &str = "pxelinux.cfg";

/// Config file served to every client
pub const CONFIG_FILE: &str = "default";

const TEMPLATE_NAME: &str = "pxelinux.cfg/default";

const TEMPLATE: &str = "
DEFAULT default
LABEL default
  KERNEL {{ kernel }}
  INITRD {{ initrd }}
  APPEND {{ append }}
";

/// Boot stanza for the installation kernel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PxeLinuxConfig {
    /// Kernel path, relative to the TFTP root
    pub kernel: String,
    /// Initial ramdisk path, relative to the TFTP root
    pub initrd: String,
    /// Kernel command line
    pub append: String,
}

impl PxeLinuxConfig {
    /// Renders the stanza. Values are inserted verbatim.
    pub fn render(&self) -> Result<String> {
        let mut env = Environment::new();
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        env.add_template(TEMPLATE_NAME, TEMPLATE)?;
        Ok(env.get_template(TEMPLATE_NAME)?.render(self)?)
    }

    /// Renders the stanza into `<tftp_root>/pxelinux.cfg/default`.
    ///
    /// Creates the config directory if needed and replaces any existing file.
    pub fn write_to(&self, tftp_root: &Path) -> Result<PathBuf> {
        let path = config_path(tftp_root);
        let dir = tftp_root.join(CONFIG_DIR);

        fs::create_dir_all(&dir).map_err(|e| PxeError::io(&dir, e))?;

        let rendered = self.render()?;
        debug!("Rendered pxelinux config:{}", rendered);

        fs::write(&path, rendered).map_err(|e| PxeError::io(&path, e))?;
        info!("Wrote {}", path.display());

        Ok(path)
    }
}

/// Location of the rendered config for a TFTP root.
#[must_use]
pub fn config_path(tftp_root: &Path) -> PathBuf {
    tftp_root.join(CONFIG_DIR).join(CONFIG_FILE)
}
