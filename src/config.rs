// src/config.rs
//! Service configuration — TOML file with built-in defaults
//!
//! The configuration is an explicit value handed to the service constructor;
//! nothing here is a process-wide global.

use std::path::{Path, PathBuf};

use log::warn;
use serde::Deserialize;

use crate::consts::DEFAULT_RECIPHER_WORKERS;

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    /// Directory holding the key files; created on first write.
    #[serde(default = "default_security_dir")]
    pub security_dir: PathBuf,

    /// Upper bound of the batch recipher worker pool.
    #[serde(default = "default_recipher_workers")]
    pub recipher_workers: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            security_dir: default_security_dir(),
            recipher_workers: default_recipher_workers(),
        }
    }
}

impl ServiceConfig {
    /// Loads the TOML file named by `CONTENT_CIPHER_CONFIG` (default
    /// `content-cipher.toml`), falling back to the built-in defaults when the
    /// file is absent or invalid.
    pub fn load() -> Self {
        let path = std::env::var("CONTENT_CIPHER_CONFIG")
            .unwrap_or_else(|_| "content-cipher.toml".to_string());
        Self::from_file(Path::new(&path))
    }

    pub fn from_file(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(text) => match toml::from_str(&text) {
                Ok(config) => config,
                Err(e) => {
                    warn!("invalid TOML in {}: {e}; using defaults", path.display());
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Configuration rooted at an explicit security directory.
    pub fn at(security_dir: impl Into<PathBuf>) -> Self {
        Self {
            security_dir: security_dir.into(),
            ..Self::default()
        }
    }
}

fn default_security_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("content-cipher").join("security"))
        .unwrap_or_else(|| PathBuf::from(".security"))
}

fn default_recipher_workers() -> usize {
    DEFAULT_RECIPHER_WORKERS
}
