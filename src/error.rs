// src/error.rs
//! Public error taxonomy for the entire crate

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EncryptionError>;

/// Rejection of non-privileged work while a privileged task holds the key
/// generation exclusively. The caller may simply retry later.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConcurrencyError {
    #[error("the cipher key is being updated, retry later")]
    Busy,
}

/// Failures of the cipher machinery or of the key files it depends on.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The key file is missing, truncated or undecodable.
    #[error("cipher key unavailable ({path}): {detail}")]
    KeyUnavailable { path: PathBuf, detail: String },

    /// Decrypt input that is not valid base64 or not a well-formed blob.
    #[error("malformed ciphertext: {0}")]
    MalformedCiphertext(String),

    /// The cipher itself failed: wrong key, tampered data.
    #[error("cipher operation failed: {0}")]
    CipherFailure(String),

    /// Key material of the wrong shape (length, encoding).
    #[error("invalid cipher key material: {0}")]
    InvalidKey(String),

    /// A content iterator failed on the store side.
    #[error("content store failure: {0}")]
    ContentStore(String),
}

/// Top-level error surfaced by [`ContentEncryptionService`].
///
/// [`ContentEncryptionService`]: crate::service::ContentEncryptionService
#[derive(Debug, Error)]
pub enum EncryptionError {
    /// Malformed or wrong-length candidate key, rejected before any state
    /// change.
    #[error("invalid cipher key: {0}")]
    Validation(String),

    #[error(transparent)]
    Concurrency(#[from] ConcurrencyError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    /// I/O failure during the backup/swap steps of a key rotation; the key
    /// files have been rolled back when this is returned.
    #[error("cannot update the cipher key")]
    KeyUpdate(#[source] std::io::Error),

    /// A per-item failure inside a batch recipher. The batch is aborted but
    /// updates already committed on sibling iterators are not retracted.
    #[error("cipher renewing failed on a content item")]
    CipherRenewing(#[source] CryptoError),
}
