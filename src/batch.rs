// src/batch.rs
//! Batch (re)ciphering of content iterators
//!
//! Drives one or more content iterators through encrypt, decrypt or renew.
//! A single iterator runs on the caller's thread; several run on a bounded
//! pool of scoped workers pulling iterators from a shared queue. The first
//! per-item failure invokes the iterator's `on_error` hook, then aborts the
//! whole batch; sibling workers stop at their next item boundary. Updates
//! already committed on other iterators are not rolled back.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use log::debug;
use parking_lot::Mutex;

use crate::cipher::Cipher;
use crate::error::{CryptoError, EncryptionError};
use crate::iterator::{ContentFields, EncryptionContentIterator};
use crate::key::CipherKey;
use crate::ops;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipherMode {
    Encrypt,
    Decrypt,
    /// Decrypt under the previous key, re-encrypt under the current key.
    Renew,
}

pub(crate) struct BatchRecipherTask<'a> {
    mode: CipherMode,
    cipher: &'a dyn Cipher,
    current: CipherKey,
    previous: Option<CipherKey>,
    max_workers: usize,
}

impl<'a> BatchRecipherTask<'a> {
    pub fn encryption(cipher: &'a dyn Cipher, current: CipherKey, max_workers: usize) -> Self {
        Self {
            mode: CipherMode::Encrypt,
            cipher,
            current,
            previous: None,
            max_workers,
        }
    }

    pub fn decryption(cipher: &'a dyn Cipher, current: CipherKey, max_workers: usize) -> Self {
        Self {
            mode: CipherMode::Decrypt,
            cipher,
            current,
            previous: None,
            max_workers,
        }
    }

    pub fn renewal(
        cipher: &'a dyn Cipher,
        current: CipherKey,
        previous: CipherKey,
        max_workers: usize,
    ) -> Self {
        Self {
            mode: CipherMode::Renew,
            cipher,
            current,
            previous: Some(previous),
            max_workers,
        }
    }

    pub fn run(
        &self,
        iterators: &mut [Box<dyn EncryptionContentIterator>],
    ) -> Result<(), EncryptionError> {
        debug!(
            "running {:?} batch over {} content iterator(s)",
            self.mode,
            iterators.len()
        );
        match iterators {
            [] => Ok(()),
            [single] => {
                let abort = AtomicBool::new(false);
                self.run_iterator(single.as_mut(), &abort)
                    .map_err(EncryptionError::CipherRenewing)
            }
            many => self.run_pool(many),
        }
    }

    fn run_pool(
        &self,
        iterators: &mut [Box<dyn EncryptionContentIterator>],
    ) -> Result<(), EncryptionError> {
        let workers = self.max_workers.clamp(1, iterators.len());
        let queue = Mutex::new(iterators.iter_mut());
        let abort = AtomicBool::new(false);
        let failure: Mutex<Option<CryptoError>> = Mutex::new(None);

        thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| loop {
                    let Some(iterator) = queue.lock().next() else {
                        break;
                    };
                    if abort.load(Ordering::SeqCst) {
                        break;
                    }
                    if let Err(e) = self.run_iterator(iterator.as_mut(), &abort) {
                        abort.store(true, Ordering::SeqCst);
                        let mut slot = failure.lock();
                        if slot.is_none() {
                            *slot = Some(e);
                        }
                    }
                });
            }
        });

        match failure.into_inner() {
            Some(e) => Err(EncryptionError::CipherRenewing(e)),
            None => Ok(()),
        }
    }

    /// Drives one iterator to completion, stopping early at an item boundary
    /// once the batch is aborting.
    fn run_iterator(
        &self,
        iterator: &mut dyn EncryptionContentIterator,
        abort: &AtomicBool,
    ) -> Result<(), CryptoError> {
        iterator.init();
        while iterator.has_next() {
            if abort.load(Ordering::SeqCst) {
                break;
            }
            let fields = match iterator.next() {
                Ok(fields) => fields,
                Err(e) => {
                    iterator.on_error(&ContentFields::new(), &e);
                    return Err(e);
                }
            };
            match self.transform_fields(&fields) {
                Ok(transformed) => {
                    if let Err(e) = iterator.update(transformed) {
                        iterator.on_error(&fields, &e);
                        return Err(e);
                    }
                }
                Err(e) => {
                    iterator.on_error(&fields, &e);
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    fn transform_fields(&self, fields: &ContentFields) -> Result<ContentFields, CryptoError> {
        let mut transformed = ContentFields::with_capacity(fields.len());
        for (name, value) in fields {
            let value = value
                .as_deref()
                .map(|v| self.transform_value(v))
                .transpose()?;
            transformed.insert(name.clone(), value);
        }
        Ok(transformed)
    }

    fn transform_value(&self, value: &str) -> Result<String, CryptoError> {
        match self.mode {
            CipherMode::Encrypt => ops::encrypt_value(self.cipher, &self.current, value),
            CipherMode::Decrypt => ops::decrypt_value(self.cipher, &self.current, value),
            CipherMode::Renew => {
                let previous = self.previous.as_ref().ok_or_else(|| {
                    CryptoError::InvalidKey("no previous key for cipher renewal".to_string())
                })?;
                let plaintext = ops::decrypt_value(self.cipher, previous, value)?;
                ops::encrypt_value(self.cipher, &self.current, &plaintext)
            }
        }
    }
}
