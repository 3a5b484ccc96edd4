// src/key.rs
//! Cipher key value type — raw bytes plus hex/base64 representations

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::CryptoError;

/// An immutable symmetric key: raw bytes with a declared bit length.
///
/// The type itself accepts any length; the 256-bit constraint on the content
/// key is enforced at the `update_cipher_key` validation boundary. Key bytes
/// are zeroized when the value is dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct CipherKey {
    bytes: Vec<u8>,
}

impl CipherKey {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Parses a key from hexadecimal text.
    pub fn from_hex(text: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(text)
            .map_err(|e| CryptoError::InvalidKey(format!("not hexadecimal: {e}")))?;
        Ok(Self { bytes })
    }

    /// Parses a key from base64 text.
    pub fn from_base64(text: &str) -> Result<Self, CryptoError> {
        let bytes = STANDARD
            .decode(text)
            .map_err(|e| CryptoError::InvalidKey(format!("not base64: {e}")))?;
        Ok(Self { bytes })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    pub fn bit_len(&self) -> usize {
        self.bytes.len() * 8
    }
}

// Never expose key material through Debug.
impl fmt::Debug for CipherKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CipherKey({} bits)", self.bit_len())
    }
}
