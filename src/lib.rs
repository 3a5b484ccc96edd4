// src/lib.rs
//! content-cipher — rotatable symmetric encryption for scattered textual
//! content
//!
//! Features:
//! - AES-256-GCM content and key-encryption ciphers behind a [`Cipher`] seam
//! - Two-generation key files, swapped atomically on key rotation
//! - Many concurrent encrypt/decrypt readers vs. one exclusive rotator
//! - Batch cipher renewal over externally owned content iterators, with
//!   rollback of the key-file swap on failure

pub mod cipher;
pub mod config;
pub mod consts;
pub mod coordinator;
pub mod error;
pub mod iterator;
pub mod key;
pub mod keystore;
pub mod ops;
pub mod service;

mod batch;
mod fsattrs;
mod rotation;

// Re-export everything users need at the crate root
pub use cipher::{AesGcmCipher, Cipher};
pub use config::ServiceConfig;
pub use error::{ConcurrencyError, CryptoError, EncryptionError, Result};
pub use iterator::{ContentFields, ContentIteratorRegistry, EncryptionContentIterator};
pub use key::CipherKey;
pub use keystore::CipherKeyStore;
pub use service::ContentEncryptionService;
