//! Persistent settings storage.
//!
//! ## Module Structure
//!
//! - `settings`: the persisted `Settings` record
//! - `json`: `JsonFileStore`, the on-disk backend
//! - `memory`: `MemoryStore`, an in-memory backend for tests
//!
//! `ConfigStore` wraps a backend with a store-wide lock so that every
//! load -> mutate -> save sequence is atomic with respect to other events.
//! Backend I/O runs on the blocking pool so a slow disk never stalls the
//! async workers.

pub mod json;
#[cfg(test)]
pub mod memory;
pub mod settings;

use std::panic;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task;
use tracing::warn;

use crate::common::error::StoreError;
use crate::common::types::UserId;

pub use json::JsonFileStore;
pub use settings::Settings;

/// A durable home for the settings record.
pub trait SettingsStore: Send + Sync {
    /// Load the current record.
    ///
    /// Never fails: a missing or unparseable record yields `Settings::new(owner)`,
    /// which is written back so the store is reset to a known shape.
    fn load(&self) -> Settings;

    /// Overwrite the whole record.
    fn save(&self, settings: &Settings) -> Result<(), StoreError>;
}

/// Outcome of a settings mutation closure.
#[derive(Debug)]
pub enum Mutation<T> {
    /// The record changed and must be persisted.
    Commit(T),
    /// Nothing changed; skip the write.
    Skip(T),
}

/// Locked access to a `SettingsStore`.
///
/// Every call loads a fresh copy, so edits made to the backing record outside
/// the process are picked up on the next event.
pub struct ConfigStore {
    backend: Arc<dyn SettingsStore>,
    lock: Mutex<()>,
}

impl ConfigStore {
    pub fn new(backend: Arc<dyn SettingsStore>) -> Self {
        Self {
            backend,
            lock: Mutex::new(()),
        }
    }

    /// Read the current settings.
    pub async fn snapshot(&self) -> Settings {
        let _guard = self.lock.lock().await;
        self.load().await
    }

    /// Run a read-modify-write cycle under the store lock.
    ///
    /// The record is saved only when `f` returns `Mutation::Commit`. If the
    /// save fails the mutated copy is discarded and the error returned.
    pub async fn update<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Settings) -> Mutation<T>,
    {
        let _guard = self.lock.lock().await;
        let mut settings = self.load().await;
        match f(&mut settings) {
            Mutation::Commit(value) => {
                self.save(settings).await?;
                Ok(value)
            }
            Mutation::Skip(value) => Ok(value),
        }
    }

    async fn load(&self) -> Settings {
        let backend = Arc::clone(&self.backend);
        match task::spawn_blocking(move || backend.load()).await {
            Ok(settings) => settings,
            Err(e) if e.is_panic() => panic::resume_unwind(e.into_panic()),
            // The blocking pool is gone once the runtime shuts down.
            Err(_) => self.backend.load(),
        }
    }

    async fn save(&self, settings: Settings) -> Result<(), StoreError> {
        let backend = Arc::clone(&self.backend);
        let record = settings.clone();
        match task::spawn_blocking(move || backend.save(&record)).await {
            Ok(result) => result,
            Err(e) if e.is_panic() => panic::resume_unwind(e.into_panic()),
            Err(_) => self.backend.save(&settings),
        }
    }
}

/// Decode a stored record, forcing the configured owner.
pub(crate) fn decode_record(raw: &str, owner_id: UserId) -> Result<Settings, serde_json::Error> {
    let mut settings: Settings = serde_json::from_str(raw)?;
    if settings.owner_id != owner_id {
        warn!(
            stored = settings.owner_id,
            configured = owner_id,
            "Stored owner differs from configuration, using configured owner"
        );
        settings.owner_id = owner_id;
    }
    Ok(settings)
}

/// Encode a record the way every backend writes it.
pub(crate) fn encode_record(settings: &Settings) -> Result<String, StoreError> {
    Ok(serde_json::to_string_pretty(settings)?)
}

#[cfg(test)]
mod tests {
    use tokio_test::{assert_err, assert_ok};

    use super::memory::MemoryStore;
    use super::*;
    use crate::common::types::ChannelRef;

    #[tokio::test]
    async fn test_snapshot_initializes_defaults() {
        let backend = Arc::new(MemoryStore::new(10));
        let store = ConfigStore::new(backend.clone());

        let settings = store.snapshot().await;
        assert_eq!(settings, Settings::new(10));
        assert_eq!(backend.saves(), 1);
    }

    #[tokio::test]
    async fn test_commit_persists_and_skip_does_not() {
        let backend = Arc::new(MemoryStore::with_settings(&Settings::new(10)));
        let store = ConfigStore::new(backend.clone());

        let added = store
            .update(|s| {
                s.source_channels.push(ChannelRef::Username("news".into()));
                Mutation::Commit(true)
            })
            .await;
        assert!(assert_ok!(added));
        assert_eq!(backend.saves(), 1);

        let before = backend.raw();
        let skipped = store
            .update(|s| {
                s.working = true;
                Mutation::Skip(())
            })
            .await;
        assert_ok!(skipped);
        assert_eq!(backend.saves(), 1);
        assert_eq!(backend.raw(), before);
        assert!(!store.snapshot().await.working);
    }

    #[tokio::test]
    async fn test_failed_save_is_not_committed() {
        let backend = Arc::new(MemoryStore::with_settings(&Settings::new(10)));
        let store = ConfigStore::new(backend.clone());
        backend.fail_saves(true);

        let result = store
            .update(|s| {
                s.working = true;
                Mutation::Commit(())
            })
            .await;
        assert_err!(result);

        backend.fail_saves(false);
        assert!(!store.snapshot().await.working);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_updates_all_persist() {
        let backend = Arc::new(MemoryStore::with_settings(&Settings::new(10)));
        let store = Arc::new(ConfigStore::new(backend.clone()));

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .update(move |s| {
                            s.source_channels
                                .push(ChannelRef::Username(format!("chan{}", i)));
                            Mutation::Commit(())
                        })
                        .await
                })
            })
            .collect();
        for task in tasks {
            assert_ok!(task.await.unwrap());
        }

        let settings = store.snapshot().await;
        assert_eq!(settings.source_channels.len(), 16);
        for i in 0..16 {
            assert!(settings
                .source_channels
                .contains(&ChannelRef::Username(format!("chan{}", i))));
        }
        assert_eq!(backend.saves(), 16);
    }

    #[test]
    fn test_decode_collapses_normalized_duplicates() {
        let settings = decode_record(
            r#"{"owner_id": 1, "source_channels": ["@News", "@news", "-100", "@other"]}"#,
            1,
        )
        .unwrap();
        assert_eq!(
            settings.source_channels,
            vec![
                ChannelRef::Username("news".into()),
                ChannelRef::Id(-100),
                ChannelRef::Username("other".into())
            ]
        );
    }

    #[test]
    fn test_decode_forces_configured_owner() {
        let settings = decode_record(r#"{"owner_id": 1, "admins": [1]}"#, 2).unwrap();
        assert_eq!(settings.owner_id, 2);
        assert_eq!(settings.admins, vec![1]);
    }
}
