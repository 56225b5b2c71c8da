//! Selection state persistence
//!
//! The state is stored as `{ "settings": { ... } }` with the flat
//! [`SettingsRecord`] inside. Restoring never fails: missing or unreadable
//! state falls back to defaults.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::PersistError;
use crate::settings::{NumericBounds, SelectionState, SettingsRecord};

/// Persisted document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedState {
    /// Saved selection
    #[serde(default)]
    pub settings: SettingsRecord,
}

impl From<&SelectionState> for PersistedState {
    fn from(state: &SelectionState) -> Self {
        Self {
            settings: state.to_record(),
        }
    }
}

/// Storage for the persisted document
pub trait StateStore: Send + Sync {
    /// Load the stored document, `None` when nothing is stored yet
    ///
    /// # Errors
    /// Storage unreadable or the document is invalid
    fn load(&self) -> Result<Option<PersistedState>, PersistError>;

    /// Replace the stored document
    ///
    /// # Errors
    /// Storage unwritable
    fn save(&self, state: &PersistedState) -> Result<(), PersistError>;
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Option<PersistedState>>,
}

impl MemoryStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create store holding a document
    #[must_use]
    pub fn with_state(state: PersistedState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
        }
    }

    /// Stored document
    #[must_use]
    pub fn snapshot(&self) -> Option<PersistedState> {
        self.state.lock().clone()
    }
}

impl StateStore for MemoryStore {
    fn load(&self) -> Result<Option<PersistedState>, PersistError> {
        Ok(self.snapshot())
    }

    fn save(&self, state: &PersistedState) -> Result<(), PersistError> {
        *self.state.lock() = Some(state.clone());
        Ok(())
    }
}

/// Store backed by a JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create store for `path`; the file is created on first save
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<Option<PersistedState>, PersistError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_str(&text)?))
    }

    fn save(&self, state: &PersistedState) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }
}

/// Restore the selection from a store, falling back to defaults
#[must_use]
pub fn restore_selection(store: &dyn StateStore, defaults: NumericBounds) -> SelectionState {
    match store.load() {
        Ok(Some(persisted)) => SelectionState::from_record(&persisted.settings, defaults),
        Ok(None) => SelectionState::from_record(&SettingsRecord::default(), defaults),
        Err(e) => {
            tracing::warn!("Ignoring unreadable editor state: {}", e);
            SelectionState::from_record(&SettingsRecord::default(), defaults)
        }
    }
}
