// src/consts.rs
//! Shared constants — key sizing, file naming and pool defaults

/// Required size of the content cipher key
pub const CONTENT_KEY_BITS: usize = 256;

/// Hexadecimal length of a 256-bit content key
pub const CONTENT_KEY_HEX_LEN: usize = 64;

/// Separator between the two base64 tokens of a key file
pub const KEY_TOKEN_SEPARATOR: char = ' ';

/// File holding the current content key (dot-prefixed: hidden on Unix)
pub const CURRENT_KEY_FILE: &str = ".content_key";

/// File holding the previous content key, kept for cipher renewal
pub const PREVIOUS_KEY_FILE: &str = ".content_key_old";

/// Suffix appended to key-file paths backed up during a rotation
pub const BACKUP_SUFFIX: &str = ".backup";

/// Default bound of the batch recipher worker pool
pub const DEFAULT_RECIPHER_WORKERS: usize = 4;
