// src/fsattrs.rs
//! Filesystem attribute adapter for key files
//!
//! Attribute failures are logged, never fatal: a key file that ends up
//! writable or visible is still a valid key file.

use std::fs;
use std::path::Path;

use log::warn;

pub fn set_read_only(path: &Path) {
    match fs::metadata(path) {
        Ok(metadata) => {
            let mut permissions = metadata.permissions();
            permissions.set_readonly(true);
            if let Err(e) = fs::set_permissions(path, permissions) {
                warn!("cannot set {} read-only: {e}", path.display());
            }
        }
        Err(e) => warn!("cannot stat {}: {e}", path.display()),
    }
}

#[cfg(windows)]
pub fn set_hidden(path: &Path) {
    use std::process::Command;
    match Command::new("attrib").arg("+H").arg(path).status() {
        Ok(status) if status.success() => {}
        Ok(status) => warn!("attrib +H {} exited with {status}", path.display()),
        Err(e) => warn!("cannot hide {}: {e}", path.display()),
    }
}

/// Key files are dot-prefixed, which is all "hidden" means on Unix.
#[cfg(not(windows))]
pub fn set_hidden(_path: &Path) {}
