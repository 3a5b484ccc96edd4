// src/rotation.rs
//! Key rotation — validate, backup, swap, recipher, commit or roll back
//!
//! A rotation replaces the current content key (demoting it to previous) and
//! re-enciphers every registered content store under the new key. The swap is
//! all-or-nothing from the perspective of the key files: on any failure after
//! backups were taken, the backed-up files are restored before the error
//! propagates. Content updates already committed by the batch are not undone.

use std::fs;
use std::io;
use std::path::PathBuf;

use log::{error, info, warn};

use crate::batch::BatchRecipherTask;
use crate::cipher::Cipher;
use crate::consts::{BACKUP_SUFFIX, CONTENT_KEY_BITS, CONTENT_KEY_HEX_LEN};
use crate::coordinator::ConcurrencyCoordinator;
use crate::error::{EncryptionError, Result};
use crate::iterator::EncryptionContentIterator;
use crate::key::CipherKey;
use crate::keystore::CipherKeyStore;

/// Checks that a candidate content key is hexadecimal and exactly 256 bits.
pub(crate) fn validate_content_key(key: &str) -> Result<()> {
    if hex::decode(key).is_err() {
        return Err(EncryptionError::Validation(
            "the encryption key must be in hexadecimal".to_string(),
        ));
    }
    if key.len() != CONTENT_KEY_HEX_LEN {
        return Err(EncryptionError::Validation(format!(
            "the encryption key must be {CONTENT_KEY_BITS} bits ({CONTENT_KEY_HEX_LEN} hex characters)"
        )));
    }
    Ok(())
}

pub(crate) struct KeyRotationTransaction<'a> {
    store: &'a CipherKeyStore,
    content_cipher: &'a dyn Cipher,
    coordinator: &'a ConcurrencyCoordinator,
    max_workers: usize,
}

impl<'a> KeyRotationTransaction<'a> {
    pub fn new(
        store: &'a CipherKeyStore,
        content_cipher: &'a dyn Cipher,
        coordinator: &'a ConcurrencyCoordinator,
        max_workers: usize,
    ) -> Self {
        Self {
            store,
            content_cipher,
            coordinator,
            max_workers,
        }
    }

    /// Runs the full rotation over the given iterators.
    pub fn run(
        &self,
        hex_key: &str,
        iterators: &mut [Box<dyn EncryptionContentIterator>],
    ) -> Result<()> {
        validate_content_key(hex_key)?;
        let _exclusive = self.coordinator.acquire_exclusive();

        let backup = self.backup_key_files().map_err(EncryptionError::KeyUpdate)?;
        let renewing = backup.had_current;
        let result = self.swap_and_recipher(hex_key, renewing, iterators);
        match &result {
            Ok(()) => {
                backup.discard();
                info!("cipher key updated{}", if renewing { ", contents renewed" } else { "" });
            }
            Err(e) => {
                warn!("cipher key update failed, restoring key files: {e}");
                backup.restore(self.store);
            }
        }
        result
    }

    fn swap_and_recipher(
        &self,
        hex_key: &str,
        renewing: bool,
        iterators: &mut [Box<dyn EncryptionContentIterator>],
    ) -> Result<()> {
        if renewing {
            self.store
                .promote_current_to_previous()
                .map_err(EncryptionError::KeyUpdate)?;
        }
        let new_key = CipherKey::from_hex(hex_key)?;
        self.store
            .write_current(&new_key)
            .map_err(EncryptionError::KeyUpdate)?;

        let task = if renewing {
            let previous = self.store.read_previous()?;
            BatchRecipherTask::renewal(self.content_cipher, new_key, previous, self.max_workers)
        } else {
            BatchRecipherTask::encryption(self.content_cipher, new_key, self.max_workers)
        };
        task.run(iterators)
    }

    fn backup_key_files(&self) -> io::Result<KeyFileBackup> {
        let mut backup = KeyFileBackup::default();
        let current = self.store.current_key_path();
        if current.exists() {
            backup.had_current = true;
            backup.current = Some(copy_aside(&current)?);
        }
        let previous = self.store.previous_key_path();
        if previous.exists() {
            backup.previous = Some(copy_aside(&previous)?);
        }
        Ok(backup)
    }
}

fn copy_aside(live: &PathBuf) -> io::Result<(PathBuf, PathBuf)> {
    let mut name = live.as_os_str().to_owned();
    name.push(BACKUP_SUFFIX);
    let aside = PathBuf::from(name);
    // A stale backup from a crashed rotation may be read-only.
    let _ = fs::remove_file(&aside);
    fs::copy(live, &aside)?;
    Ok((live.clone(), aside))
}

/// Backed-up key files taken before the swap. Restored only on failure, and
/// only for the files that actually existed beforehand.
#[derive(Default)]
struct KeyFileBackup {
    had_current: bool,
    current: Option<(PathBuf, PathBuf)>,
    previous: Option<(PathBuf, PathBuf)>,
}

impl KeyFileBackup {
    fn discard(self) {
        for (_, aside) in self.current.iter().chain(self.previous.iter()) {
            if let Err(e) = fs::remove_file(aside) {
                warn!("cannot remove key backup {}: {e}", aside.display());
            }
        }
    }

    fn restore(self, store: &CipherKeyStore) {
        for (live, aside) in self.current.iter().chain(self.previous.iter()) {
            let restored = fs::read(aside).and_then(|bytes| store.install(live, &bytes));
            match restored {
                Ok(()) => {
                    if let Err(e) = fs::remove_file(aside) {
                        warn!("cannot remove key backup {}: {e}", aside.display());
                    }
                }
                // The backup stays on disk for manual recovery.
                Err(e) => error!("cannot restore key file {}: {e}", live.display()),
            }
        }
    }
}
