//! In-memory settings backend for tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::common::error::StoreError;
use crate::common::types::UserId;
use crate::store::{decode_record, encode_record, Settings, SettingsStore};

/// Holds the serialized record exactly as a file backend would.
pub struct MemoryStore {
    owner_id: UserId,
    record: Mutex<Option<String>>,
    saves: AtomicUsize,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    /// An empty store, as on first run.
    pub fn new(owner_id: UserId) -> Self {
        Self {
            owner_id,
            record: Mutex::new(None),
            saves: AtomicUsize::new(0),
            fail_saves: AtomicBool::new(false),
        }
    }

    /// A store holding arbitrary raw content (possibly corrupt).
    pub fn with_raw(owner_id: UserId, raw: &str) -> Self {
        let store = Self::new(owner_id);
        *store.record.lock().unwrap() = Some(raw.to_string());
        store
    }

    /// A store pre-seeded with `settings`. Seeding does not count as a save.
    pub fn with_settings(settings: &Settings) -> Self {
        let raw = encode_record(settings).unwrap();
        Self::with_raw(settings.owner_id, &raw)
    }

    /// The stored bytes.
    pub fn raw(&self) -> Option<String> {
        self.record.lock().unwrap().clone()
    }

    /// Number of successful saves.
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Make subsequent saves fail with an I/O error.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl SettingsStore for MemoryStore {
    fn load(&self) -> Settings {
        let raw = self.raw();
        match raw.as_deref().map(|r| decode_record(r, self.owner_id)) {
            Some(Ok(settings)) => settings,
            _ => {
                let settings = Settings::new(self.owner_id);
                let _ = self.save(&settings);
                settings
            }
        }
    }

    fn save(&self, settings: &Settings) -> Result<(), StoreError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StoreError::Io {
                path: "<memory>".to_string(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "save disabled"),
            });
        }
        *self.record.lock().unwrap() = Some(encode_record(settings)?);
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
