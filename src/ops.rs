// src/ops.rs
//! Single-value, array and field-mapping cipher operations
//!
//! These helpers never cache a key: callers fetch the current key fresh for
//! every call, so correctness under rotation rests entirely on the
//! concurrency coordinator.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::cipher::Cipher;
use crate::error::CryptoError;
use crate::iterator::ContentFields;
use crate::key::CipherKey;

/// Encrypts one value; the result is the base64 of the cipher blob.
pub fn encrypt_value(
    cipher: &dyn Cipher,
    key: &CipherKey,
    value: &str,
) -> Result<String, CryptoError> {
    Ok(STANDARD.encode(cipher.encrypt(value, key)?))
}

/// Decrypts one base64-encoded value back to plaintext.
pub fn decrypt_value(
    cipher: &dyn Cipher,
    key: &CipherKey,
    value: &str,
) -> Result<String, CryptoError> {
    let blob = STANDARD
        .decode(value)
        .map_err(|e| CryptoError::MalformedCiphertext(e.to_string()))?;
    cipher.decrypt(&blob, key)
}

/// Encrypts each value of the slice, in order. `None` passes through.
pub fn encrypt_values(
    cipher: &dyn Cipher,
    key: &CipherKey,
    values: &[Option<String>],
) -> Result<Vec<Option<String>>, CryptoError> {
    values
        .iter()
        .map(|value| {
            value
                .as_deref()
                .map(|v| encrypt_value(cipher, key, v))
                .transpose()
        })
        .collect()
}

/// Decrypts each value of the slice, in order. `None` passes through.
pub fn decrypt_values(
    cipher: &dyn Cipher,
    key: &CipherKey,
    values: &[Option<String>],
) -> Result<Vec<Option<String>>, CryptoError> {
    values
        .iter()
        .map(|value| {
            value
                .as_deref()
                .map(|v| decrypt_value(cipher, key, v))
                .transpose()
        })
        .collect()
}

/// Encrypts every named field of a mapping. `None` values stay `None`.
pub fn encrypt_fields(
    cipher: &dyn Cipher,
    key: &CipherKey,
    fields: &ContentFields,
) -> Result<ContentFields, CryptoError> {
    let mut encrypted = ContentFields::with_capacity(fields.len());
    for (name, value) in fields {
        let value = value
            .as_deref()
            .map(|v| encrypt_value(cipher, key, v))
            .transpose()?;
        encrypted.insert(name.clone(), value);
    }
    Ok(encrypted)
}

/// Decrypts every named field of a mapping. `None` values stay `None`.
pub fn decrypt_fields(
    cipher: &dyn Cipher,
    key: &CipherKey,
    fields: &ContentFields,
) -> Result<ContentFields, CryptoError> {
    let mut decrypted = ContentFields::with_capacity(fields.len());
    for (name, value) in fields {
        let value = value
            .as_deref()
            .map(|v| decrypt_value(cipher, key, v))
            .transpose()?;
        decrypted.insert(name.clone(), value);
    }
    Ok(decrypted)
}
