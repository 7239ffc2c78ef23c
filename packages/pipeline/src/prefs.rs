// ABOUTME: Session preference persistence (filters + page, never deal data)
// ABOUTME: Versioned JSON under ~/.dealflow, tolerant of missing or corrupt files

use std::path::PathBuf;

use dealflow_core::{preferences_file, DealFilters, PageRequest, PREFERENCES_VERSION};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};

/// What survives across sessions: the filter set and the current page.
/// The deal collection itself is never written to disk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Preferences {
    pub version: String,
    pub filters: DealFilters,
    pub page: PageRequest,
}

impl Preferences {
    pub fn new(filters: DealFilters, page: PageRequest) -> Self {
        Preferences {
            version: PREFERENCES_VERSION.to_string(),
            filters,
            page,
        }
    }
}

impl Default for Preferences {
    fn default() -> Self {
        Preferences::new(DealFilters::default(), PageRequest::default())
    }
}

/// Loads and saves [`Preferences`] at a fixed path
pub struct PreferenceStore {
    path: PathBuf,
}

impl PreferenceStore {
    /// Store at the standard location (~/.dealflow/preferences.json,
    /// honoring the DEALFLOW_DIR override)
    pub fn new() -> Self {
        Self {
            path: preferences_file(),
        }
    }

    /// Store at an explicit path
    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    /// Load preferences, falling back to defaults when the file is missing,
    /// unreadable, corrupt, or from a different format version. Load never
    /// fails; a bad preference file must not block startup.
    pub async fn load(&self) -> Preferences {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no preferences file at {}", self.path.display());
                return Preferences::default();
            }
            Err(e) => {
                warn!("could not read preferences file: {}", e);
                return Preferences::default();
            }
        };

        match serde_json::from_str::<Preferences>(&raw) {
            Ok(prefs) if prefs.version == PREFERENCES_VERSION => prefs,
            Ok(prefs) => {
                warn!(
                    "preferences file has version {}, expected {}; using defaults",
                    prefs.version, PREFERENCES_VERSION
                );
                Preferences::default()
            }
            Err(e) => {
                warn!("preferences file is corrupt, using defaults: {}", e);
                Preferences::default()
            }
        }
    }

    /// Write preferences, creating the parent directory if needed.
    pub async fn save(&self, prefs: &Preferences) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Io(e.to_string()))?;
        }
        let raw = serde_json::to_string_pretty(prefs)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        tokio::fs::write(&self.path, raw)
            .await
            .map_err(|e| StoreError::Io(e.to_string()))?;
        debug!("saved preferences to {}", self.path.display());
        Ok(())
    }
}

impl Default for PreferenceStore {
    fn default() -> Self {
        Self::new()
    }
}
