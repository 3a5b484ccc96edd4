// src/cipher.rs
//! Cipher capability — the trait seam plus the default AES-256-GCM
//! implementation
//!
//! Blob format: [nonce:12][ciphertext + tag:16]. Two independent instances
//! are used by the service: one for content, one to protect the content key
//! at rest.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::RngCore;

use crate::error::CryptoError;
use crate::key::CipherKey;

/// Key length of the default ciphers, in bytes.
pub const AES_KEY_LENGTH: usize = 32;

const NONCE_LENGTH: usize = 12;
const TAG_LENGTH: usize = 16;

/// A symmetric cipher over textual content.
pub trait Cipher: Send + Sync {
    fn encrypt(&self, plaintext: &str, key: &CipherKey) -> Result<Vec<u8>, CryptoError>;
    fn decrypt(&self, ciphertext: &[u8], key: &CipherKey) -> Result<String, CryptoError>;
    /// Generates a fresh random key of the cipher's native size.
    fn generate_key(&self) -> CipherKey;
}

/// AES-256-GCM with a random 12-byte nonce prepended to each blob.
#[derive(Debug, Clone, Copy, Default)]
pub struct AesGcmCipher;

impl AesGcmCipher {
    fn instance(key: &CipherKey) -> Result<Aes256Gcm, CryptoError> {
        if key.as_bytes().len() != AES_KEY_LENGTH {
            return Err(CryptoError::InvalidKey(format!(
                "expected {AES_KEY_LENGTH} bytes, got {}",
                key.as_bytes().len()
            )));
        }
        Aes256Gcm::new_from_slice(key.as_bytes())
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))
    }
}

impl Cipher for AesGcmCipher {
    fn encrypt(&self, plaintext: &str, key: &CipherKey) -> Result<Vec<u8>, CryptoError> {
        let cipher = Self::instance(key)?;
        let mut nonce_bytes = [0u8; NONCE_LENGTH];
        rand::rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| CryptoError::CipherFailure(e.to_string()))?;

        let mut blob = Vec::with_capacity(NONCE_LENGTH + ciphertext.len());
        blob.extend_from_slice(&nonce_bytes);
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    fn decrypt(&self, ciphertext: &[u8], key: &CipherKey) -> Result<String, CryptoError> {
        if ciphertext.len() < NONCE_LENGTH + TAG_LENGTH {
            return Err(CryptoError::MalformedCiphertext(
                "blob too short".to_string(),
            ));
        }
        let cipher = Self::instance(key)?;
        let nonce = Nonce::from_slice(&ciphertext[..NONCE_LENGTH]);

        let plaintext = cipher
            .decrypt(nonce, &ciphertext[NONCE_LENGTH..])
            .map_err(|e| CryptoError::CipherFailure(e.to_string()))?;
        String::from_utf8(plaintext)
            .map_err(|e| CryptoError::CipherFailure(format!("plaintext is not UTF-8: {e}")))
    }

    fn generate_key(&self) -> CipherKey {
        let mut bytes = vec![0u8; AES_KEY_LENGTH];
        rand::rng().fill_bytes(&mut bytes);
        CipherKey::from_bytes(bytes)
    }
}
