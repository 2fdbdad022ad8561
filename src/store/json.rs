//! JSON file settings backend.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::common::error::StoreError;
use crate::common::types::UserId;
use crate::store::{decode_record, encode_record, Settings, SettingsStore};

/// Stores the settings record as a pretty-printed JSON document.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    owner_id: UserId,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, owner_id: UserId) -> Self {
        Self {
            path: path.into(),
            owner_id,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a fresh record and return it.
    fn reset(&self) -> Settings {
        let settings = Settings::new(self.owner_id);
        if let Err(e) = self.save(&settings) {
            error!("Failed to persist default settings: {}", e);
        }
        settings
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> Settings {
        match fs::read_to_string(&self.path) {
            Ok(raw) => match decode_record(&raw, self.owner_id) {
                Ok(settings) => settings,
                Err(e) => {
                    warn!(
                        "Settings file {} is not valid ({}), resetting to defaults",
                        self.path.display(),
                        e
                    );
                    self.reset()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(
                    "No settings file at {}, creating defaults",
                    self.path.display()
                );
                self.reset()
            }
            Err(e) => {
                // The record may be intact; do not overwrite it.
                error!(
                    "Failed to read settings file {}: {}, using defaults",
                    self.path.display(),
                    e
                );
                Settings::new(self.owner_id)
            }
        }
    }

    fn save(&self, settings: &Settings) -> Result<(), StoreError> {
        let encoded = encode_record(settings)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
            }
        }

        // Write a sibling file and rename over the record.
        let temp = self.temp_path();
        fs::write(&temp, encoded).map_err(|e| self.io_error(e))?;
        fs::rename(&temp, &self.path).map_err(|e| self.io_error(e))?;

        debug!("Saved settings to {}", self.path.display());
        Ok(())
    }
}
