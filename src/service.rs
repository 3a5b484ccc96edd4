// src/service.rs
//! The content-encryption facade
//!
//! Composes the key store, the concurrency coordinator, the iterator
//! registry and the two ciphers (content and key-encryption) behind the
//! public operations. Every non-privileged operation takes a shared guard
//! and fetches the current key fresh; `update_cipher_key` and
//! `renew_cipher_of_contents` run exclusively.

use log::warn;

use crate::batch::BatchRecipherTask;
use crate::cipher::{AesGcmCipher, Cipher};
use crate::config::ServiceConfig;
use crate::coordinator::ConcurrencyCoordinator;
use crate::error::Result;
use crate::iterator::{ContentFields, ContentIteratorRegistry, EncryptionContentIterator};
use crate::keystore::CipherKeyStore;
use crate::ops;
use crate::rotation::KeyRotationTransaction;

pub struct ContentEncryptionService {
    store: CipherKeyStore,
    coordinator: ConcurrencyCoordinator,
    registry: ContentIteratorRegistry,
    content_cipher: Box<dyn Cipher>,
    recipher_workers: usize,
}

impl ContentEncryptionService {
    /// Builds a service with the default AES-256-GCM content and
    /// key-encryption ciphers.
    pub fn new(config: ServiceConfig) -> Self {
        Self::with_ciphers(config, Box::new(AesGcmCipher), Box::new(AesGcmCipher))
    }

    /// Builds a service over caller-supplied cipher implementations. The two
    /// instances are independent: `key_cipher` only protects the content key
    /// at rest.
    pub fn with_ciphers(
        config: ServiceConfig,
        content_cipher: Box<dyn Cipher>,
        key_cipher: Box<dyn Cipher>,
    ) -> Self {
        Self {
            store: CipherKeyStore::new(config.security_dir, key_cipher),
            coordinator: ConcurrencyCoordinator::new(),
            registry: ContentIteratorRegistry::new(),
            content_cipher,
            recipher_workers: config.recipher_workers.max(1),
        }
    }

    /// Registers an iterator over encrypted contents whose cipher has to be
    /// renewed whenever the encryption key is updated.
    pub fn register_for_content_ciphering(&self, iterator: Box<dyn EncryptionContentIterator>) {
        self.registry.register(iterator);
    }

    /// Replaces the content encryption key.
    ///
    /// The key must be hexadecimal and 256 bits (64 hex characters); anything
    /// else is rejected before any state changes. The update re-enciphers the
    /// contents of every registered iterator under the new key, rolling the
    /// key files back if any of that fails. While the update runs, other
    /// service calls fail fast with a busy error.
    pub fn update_cipher_key(&self, hex_key: &str) -> Result<()> {
        let mut iterators = self.registry.lock();
        KeyRotationTransaction::new(
            &self.store,
            self.content_cipher.as_ref(),
            &self.coordinator,
            self.recipher_workers,
        )
        .run(hex_key, &mut iterators)
    }

    /// Encrypts content parts with the current key; each output is base64,
    /// in input order. `None` parts pass through unchanged.
    pub fn encrypt_content(&self, content_parts: &[Option<String>]) -> Result<Vec<Option<String>>> {
        let _shared = self.coordinator.acquire_shared()?;
        let key = self.store.read_current()?;
        Ok(ops::encrypt_values(
            self.content_cipher.as_ref(),
            &key,
            content_parts,
        )?)
    }

    /// Decrypts base64-encoded content parts with the current key.
    pub fn decrypt_content(&self, content_parts: &[Option<String>]) -> Result<Vec<Option<String>>> {
        let _shared = self.coordinator.acquire_shared()?;
        let key = self.store.read_current()?;
        Ok(ops::decrypt_values(
            self.content_cipher.as_ref(),
            &key,
            content_parts,
        )?)
    }

    /// Encrypts every field of a mapping with the current key.
    pub fn encrypt_content_fields(&self, fields: &ContentFields) -> Result<ContentFields> {
        let _shared = self.coordinator.acquire_shared()?;
        let key = self.store.read_current()?;
        Ok(ops::encrypt_fields(
            self.content_cipher.as_ref(),
            &key,
            fields,
        )?)
    }

    /// Decrypts every field of a mapping with the current key.
    pub fn decrypt_content_fields(&self, fields: &ContentFields) -> Result<ContentFields> {
        let _shared = self.coordinator.acquire_shared()?;
        let key = self.store.read_current()?;
        Ok(ops::decrypt_fields(
            self.content_cipher.as_ref(),
            &key,
            fields,
        )?)
    }

    /// Encrypts in batch the contents provided by the given iterators. With
    /// more than one iterator, each is taken in charge by a bounded pool of
    /// workers.
    pub fn encrypt_contents(
        &self,
        iterators: &mut [Box<dyn EncryptionContentIterator>],
    ) -> Result<()> {
        let _shared = self.coordinator.acquire_shared()?;
        let key = self.store.read_current()?;
        BatchRecipherTask::encryption(self.content_cipher.as_ref(), key, self.recipher_workers)
            .run(iterators)
    }

    /// Decrypts in batch the contents provided by the given iterators.
    pub fn decrypt_contents(
        &self,
        iterators: &mut [Box<dyn EncryptionContentIterator>],
    ) -> Result<()> {
        let _shared = self.coordinator.acquire_shared()?;
        let key = self.store.read_current()?;
        BatchRecipherTask::decryption(self.content_cipher.as_ref(), key, self.recipher_workers)
            .run(iterators)
    }

    /// Renews explicitly the cipher of the given contents: decrypts under the
    /// previous key, re-encrypts under the current one. Mainly for contents
    /// whose renewal failed during a key update. Runs exclusively; without a
    /// previous key there is nothing to renew from and the call returns
    /// successfully.
    pub fn renew_cipher_of_contents(
        &self,
        iterators: &mut [Box<dyn EncryptionContentIterator>],
    ) -> Result<()> {
        let _exclusive = self.coordinator.acquire_exclusive();
        if !self.store.has_previous() {
            warn!("no previous cipher key, nothing to renew");
            return Ok(());
        }
        let current = self.store.read_current()?;
        let previous = self.store.read_previous()?;
        BatchRecipherTask::renewal(
            self.content_cipher.as_ref(),
            current,
            previous,
            self.recipher_workers,
        )
        .run(iterators)
    }

    /// Whether a content key is defined and readable.
    pub fn is_cipher_key_defined(&self) -> bool {
        match self.store.read_current() {
            Ok(_) => true,
            Err(e) => {
                warn!("{e}");
                false
            }
        }
    }

    /// Number of iterators registered for cipher renewal.
    pub fn registered_iterator_count(&self) -> usize {
        self.registry.len()
    }
}
