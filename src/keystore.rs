// src/keystore.rs
//! On-disk store of the current and previous content keys
//!
//! Each key file is one text line of two base64 tokens separated by a single
//! ASCII space: the raw key-encryption key, then the key cipher's output when
//! encrypting the hexadecimal content key. A fresh key-encryption key is
//! generated on every write. Files are replaced by writing a sibling temp
//! file and renaming it into place, so a reader never observes a missing or
//! half-written key file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::cipher::Cipher;
use crate::consts::{CURRENT_KEY_FILE, KEY_TOKEN_SEPARATOR, PREVIOUS_KEY_FILE};
use crate::error::CryptoError;
use crate::fsattrs;
use crate::key::CipherKey;

pub struct CipherKeyStore {
    dir: PathBuf,
    key_cipher: Box<dyn Cipher>,
}

impl CipherKeyStore {
    pub fn new(dir: PathBuf, key_cipher: Box<dyn Cipher>) -> Self {
        Self { dir, key_cipher }
    }

    pub fn current_key_path(&self) -> PathBuf {
        self.dir.join(CURRENT_KEY_FILE)
    }

    pub fn previous_key_path(&self) -> PathBuf {
        self.dir.join(PREVIOUS_KEY_FILE)
    }

    pub fn has_current(&self) -> bool {
        self.current_key_path().exists()
    }

    pub fn has_previous(&self) -> bool {
        self.previous_key_path().exists()
    }

    pub fn read_current(&self) -> Result<CipherKey, CryptoError> {
        self.read(&self.current_key_path())
    }

    pub fn read_previous(&self) -> Result<CipherKey, CryptoError> {
        self.read(&self.previous_key_path())
    }

    fn read(&self, path: &Path) -> Result<CipherKey, CryptoError> {
        let text =
            fs::read_to_string(path).map_err(|e| unavailable(path, e.to_string()))?;
        let line = text.trim_end();
        let (kek_token, payload_token) = line
            .split_once(KEY_TOKEN_SEPARATOR)
            .ok_or_else(|| unavailable(path, "truncated key file".to_string()))?;

        let kek = CipherKey::from_base64(kek_token)
            .map_err(|e| unavailable(path, e.to_string()))?;
        let payload = STANDARD
            .decode(payload_token)
            .map_err(|e| unavailable(path, e.to_string()))?;
        let hex_key = self
            .key_cipher
            .decrypt(&payload, &kek)
            .map_err(|e| unavailable(path, e.to_string()))?;
        CipherKey::from_hex(&hex_key)
            .map_err(|_| unavailable(path, "decrypted key is not hexadecimal".to_string()))
    }

    /// Writes `key` as the current content key, replacing any existing file
    /// non-destructively (temp write, then atomic rename).
    ///
    /// Cipher failures while protecting the key are folded into the I/O error
    /// so the rotation transaction has a single rollback trigger.
    pub fn write_current(&self, key: &CipherKey) -> io::Result<()> {
        let kek = self.key_cipher.generate_key();
        let payload = self
            .key_cipher
            .encrypt(&key.to_hex(), &kek)
            .map_err(io::Error::other)?;
        let line = format!(
            "{}{}{}",
            kek.to_base64(),
            KEY_TOKEN_SEPARATOR,
            STANDARD.encode(payload)
        );
        self.install(&self.current_key_path(), line.as_bytes())
    }

    /// Copies the current key file over the previous-key path, keeping the
    /// current path in place. Used by the rotation transaction.
    pub(crate) fn promote_current_to_previous(&self) -> io::Result<()> {
        let bytes = fs::read(self.current_key_path())?;
        self.install(&self.previous_key_path(), &bytes)
    }

    /// Installs raw key-file bytes at `path` through a sibling temp file and
    /// an atomic rename, then marks the file read-only and hidden.
    pub(crate) fn install(&self, path: &Path, bytes: &[u8]) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let temp = path.with_extension("tmp");
        // A stale temp file from a crashed rotation may be read-only.
        let _ = fs::remove_file(&temp);
        fs::write(&temp, bytes)?;
        fs::rename(&temp, path)?;
        fsattrs::set_read_only(path);
        fsattrs::set_hidden(path);
        Ok(())
    }
}

fn unavailable(path: &Path, detail: String) -> CryptoError {
    CryptoError::KeyUnavailable {
        path: path.to_path_buf(),
        detail,
    }
}
