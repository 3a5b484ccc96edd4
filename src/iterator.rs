// src/iterator.rs
//! Content iterators — externally owned cursors over encrypted content
//!
//! Content stores register an iterator once; the service drives every
//! registered iterator through a batch recipher whenever the cipher key is
//! rotated.

use std::collections::HashMap;

use parking_lot::{Mutex, MutexGuard};

use crate::error::CryptoError;

/// One content item: named fields ciphered independently by name. A `None`
/// value stays `None`; it is never sent to the cipher.
pub type ContentFields = HashMap<String, Option<String>>;

/// A resumable cursor over the field mappings of one content store.
///
/// The store owns its data; the encryption service only drives the cursor.
pub trait EncryptionContentIterator: Send {
    /// Resets the cursor; called once before each batch pass.
    fn init(&mut self);

    fn has_next(&mut self) -> bool;

    fn next(&mut self) -> Result<ContentFields, CryptoError>;

    /// Commits the transformed fields of the item last returned by `next`
    /// back to the owning store.
    fn update(&mut self, fields: ContentFields) -> Result<(), CryptoError>;

    /// Compensation hook, invoked with the failing item before the batch
    /// aborts. Receives an empty mapping when `next` itself failed.
    fn on_error(&mut self, fields: &ContentFields, error: &CryptoError);

    /// Discards the item last returned by `next`.
    fn remove(&mut self) {}
}

/// Iterators registered for cipher renewal, owned by the service instance.
#[derive(Default)]
pub struct ContentIteratorRegistry {
    iterators: Mutex<Vec<Box<dyn EncryptionContentIterator>>>,
}

impl ContentIteratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, iterator: Box<dyn EncryptionContentIterator>) {
        self.iterators.lock().push(iterator);
    }

    pub fn len(&self) -> usize {
        self.iterators.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Locks the registered iterators for the duration of a batch pass.
    pub(crate) fn lock(&self) -> MutexGuard<'_, Vec<Box<dyn EncryptionContentIterator>>> {
        self.iterators.lock()
    }
}
