// tests/support.rs
//! Test fixtures — a tempdir-backed service and scripted content iterators

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use content_cipher::consts::{CURRENT_KEY_FILE, PREVIOUS_KEY_FILE};
use content_cipher::{
    ContentEncryptionService, ContentFields, CryptoError, EncryptionContentIterator, ServiceConfig,
};
use tempfile::TempDir;

pub fn key_a() -> String {
    "00".repeat(32)
}

#[allow(dead_code)]
pub fn key_b() -> String {
    "11".repeat(32)
}

#[allow(dead_code)]
pub fn key_c() -> String {
    "22".repeat(32)
}

/// One-field content item.
#[allow(dead_code)]
pub fn item(name: &str, value: Option<&str>) -> ContentFields {
    let mut fields = ContentFields::new();
    fields.insert(name.to_string(), value.map(str::to_string));
    fields
}

pub struct TestService {
    pub service: ContentEncryptionService,
    dir: TempDir,
}

impl TestService {
    pub fn new() -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempfile::tempdir().expect("create tempdir");
        let service = ContentEncryptionService::new(ServiceConfig::at(dir.path()));
        Self { service, dir }
    }

    #[allow(dead_code)]
    pub fn current_key_file(&self) -> PathBuf {
        self.dir.path().join(CURRENT_KEY_FILE)
    }

    #[allow(dead_code)]
    pub fn previous_key_file(&self) -> PathBuf {
        self.dir.path().join(PREVIOUS_KEY_FILE)
    }
}

/// In-memory content store shared between a test and its iterator.
#[derive(Clone, Default)]
pub struct SharedContentStore {
    items: Arc<Mutex<Vec<ContentFields>>>,
}

impl SharedContentStore {
    pub fn with_items(items: Vec<ContentFields>) -> Self {
        Self {
            items: Arc::new(Mutex::new(items)),
        }
    }

    pub fn items(&self) -> Vec<ContentFields> {
        self.items.lock().unwrap().clone()
    }

    fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }
}

/// What a batch did to an iterator, inspectable after the boxes moved away.
#[derive(Default)]
pub struct IteratorLog {
    pub updates: Mutex<usize>,
    pub errors: Mutex<Vec<String>>,
}

impl IteratorLog {
    #[allow(dead_code)]
    pub fn update_count(&self) -> usize {
        *self.updates.lock().unwrap()
    }

    #[allow(dead_code)]
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }
}

/// Cursor over a [`SharedContentStore`], optionally failing at a scripted
/// item index.
pub struct StoreIterator {
    store: SharedContentStore,
    cursor: usize,
    fail_next_at: Option<usize>,
    log: Arc<IteratorLog>,
}

impl StoreIterator {
    pub fn new(store: &SharedContentStore) -> (Self, Arc<IteratorLog>) {
        let log = Arc::new(IteratorLog::default());
        (
            Self {
                store: store.clone(),
                cursor: 0,
                fail_next_at: None,
                log: log.clone(),
            },
            log,
        )
    }

    #[allow(dead_code)]
    pub fn failing_at(store: &SharedContentStore, index: usize) -> (Self, Arc<IteratorLog>) {
        let (mut iterator, log) = Self::new(store);
        iterator.fail_next_at = Some(index);
        (iterator, log)
    }
}

impl EncryptionContentIterator for StoreIterator {
    fn init(&mut self) {
        self.cursor = 0;
    }

    fn has_next(&mut self) -> bool {
        self.cursor < self.store.len()
    }

    fn next(&mut self) -> Result<ContentFields, CryptoError> {
        let index = self.cursor;
        self.cursor += 1;
        if self.fail_next_at == Some(index) {
            return Err(CryptoError::ContentStore(format!(
                "scripted failure at item {index}"
            )));
        }
        Ok(self.store.items.lock().unwrap()[index].clone())
    }

    fn update(&mut self, fields: ContentFields) -> Result<(), CryptoError> {
        self.store.items.lock().unwrap()[self.cursor - 1] = fields;
        *self.log.updates.lock().unwrap() += 1;
        Ok(())
    }

    fn on_error(&mut self, _fields: &ContentFields, error: &CryptoError) {
        self.log.errors.lock().unwrap().push(error.to_string());
    }
}

/// Iterator whose `next` sleeps, keeping a batch (and so an exclusive
/// rotation phase) open long enough for another thread to observe it.
#[allow(dead_code)]
pub struct SlowIterator {
    total: usize,
    remaining: usize,
    delay: Duration,
}

#[allow(dead_code)]
impl SlowIterator {
    pub fn new(items: usize, delay: Duration) -> Self {
        Self {
            total: items,
            remaining: items,
            delay,
        }
    }
}

impl EncryptionContentIterator for SlowIterator {
    fn init(&mut self) {
        self.remaining = self.total;
    }

    fn has_next(&mut self) -> bool {
        self.remaining > 0
    }

    fn next(&mut self) -> Result<ContentFields, CryptoError> {
        thread::sleep(self.delay);
        self.remaining -= 1;
        // A null field passes through any cipher mode untouched.
        let mut fields = ContentFields::new();
        fields.insert("field".to_string(), None);
        Ok(fields)
    }

    fn update(&mut self, _fields: ContentFields) -> Result<(), CryptoError> {
        Ok(())
    }

    fn on_error(&mut self, _fields: &ContentFields, _error: &CryptoError) {}
}
