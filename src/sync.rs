//! Factory-set synchronisation with a stored copy
//!
//! The planner never persists anything itself. This module covers the other
//! side: the `{ data, lastSaved }` body a store exchanges, deciding whether the
//! locally held set is stale, and when a save should happen at all.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Factory;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("malformed factory data in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Stored body: the factory set plus when it was last saved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedFactories {
    pub data: Vec<Factory>,
    pub last_saved: DateTime<Utc>,
}

/// Remote copy newer than the last local edit means the local set is stale.
/// A set that was never edited locally is always stale.
pub fn is_out_of_sync(
    local_last_edit: Option<DateTime<Utc>>,
    remote_last_saved: DateTime<Utc>,
) -> bool {
    match local_last_edit {
        Some(edited) => edited < remote_last_saved,
        None => true,
    }
}

/// How a local factory set compares with the stored copy
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SyncState {
    /// The stored copy was saved after the last local edit
    Behind {
        edited: DateTime<Utc>,
        stored: DateTime<Utc>,
    },
    /// The local set carries no edit time, so the stored copy wins
    Unstamped { stored: DateTime<Utc> },
    Current,
}

impl SyncState {
    pub fn compare(
        local_last_edit: Option<DateTime<Utc>>,
        remote_last_saved: DateTime<Utc>,
    ) -> Self {
        if !is_out_of_sync(local_last_edit, remote_last_saved) {
            return Self::Current;
        }
        match local_last_edit {
            Some(edited) => Self::Behind {
                edited,
                stored: remote_last_saved,
            },
            None => Self::Unstamped {
                stored: remote_last_saved,
            },
        }
    }
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Behind { edited, stored } => write!(
                f,
                "Out of sync: stored copy saved {stored} is newer than local edits at {edited}."
            ),
            Self::Unstamped { stored } => write!(
                f,
                "Out of sync: local set has no edit timestamp, stored copy saved {stored} wins."
            ),
            Self::Current => write!(f, "In sync: local edits are current."),
        }
    }
}

pub trait FactoryStore {
    /// `Ok(None)` when nothing has been stored yet
    fn load_factories(&self) -> Result<Option<SavedFactories>, SyncError>;

    /// Store `factories`, returning the save timestamp
    fn save_factories(&self, factories: &[Factory]) -> Result<DateTime<Utc>, SyncError>;
}

/// Store backed by a single JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a body as-is, keeping its own timestamp
    pub fn write(&self, saved: &SavedFactories) -> Result<(), SyncError> {
        let json = serde_json::to_string_pretty(saved).map_err(|source| SyncError::Parse {
            path: self.path.clone(),
            source,
        })?;
        std::fs::write(&self.path, json).map_err(|source| SyncError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl FactoryStore for JsonFileStore {
    fn load_factories(&self) -> Result<Option<SavedFactories>, SyncError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SyncError::Io {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let saved = serde_json::from_str(&content).map_err(|source| SyncError::Parse {
            path: self.path.clone(),
            source,
        })?;
        Ok(Some(saved))
    }

    fn save_factories(&self, factories: &[Factory]) -> Result<DateTime<Utc>, SyncError> {
        let saved = SavedFactories {
            data: factories.to_vec(),
            last_saved: Utc::now(),
        };
        self.write(&saved)?;
        tracing::info!(path = %self.path.display(), factories = factories.len(), "factories saved");
        Ok(saved.last_saved)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// The store holds nothing
    Empty,
    /// Forced load, taken without comparing timestamps
    Loaded(SavedFactories),
    /// The stored copy is newer than the local edits and should be preferred
    OutOfSync(SavedFactories),
    /// Local edits are at least as new as the stored copy
    UpToDate,
}

/// Fetch the stored set and decide whether it supersedes local state.
pub fn load_remote(
    store: &impl FactoryStore,
    local_last_edit: Option<DateTime<Utc>>,
    force: bool,
) -> Result<LoadOutcome, SyncError> {
    let Some(saved) = store.load_factories()? else {
        tracing::warn!("no factory data stored, nothing to load");
        return Ok(LoadOutcome::Empty);
    };

    if force {
        tracing::info!("forcing factory load");
        return Ok(LoadOutcome::Loaded(saved));
    }

    if is_out_of_sync(local_last_edit, saved.last_saved) {
        tracing::warn!(remote = %saved.last_saved, "stored data is ahead of local, out of sync");
        Ok(LoadOutcome::OutOfSync(saved))
    } else {
        tracing::debug!(remote = %saved.last_saved, "stored data is behind local, keeping local");
        Ok(LoadOutcome::UpToDate)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SavePolicy {
    pub stop_syncing: bool,
    pub save_pending: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SaveOutcome {
    Disabled,
    NothingPending,
    /// An empty factory set is never written over stored data
    NoData,
    Saved(DateTime<Utc>),
}

pub fn save_local(
    store: &impl FactoryStore,
    factories: &[Factory],
    policy: SavePolicy,
) -> Result<SaveOutcome, SyncError> {
    if policy.stop_syncing {
        tracing::warn!("syncing is disabled");
        return Ok(SaveOutcome::Disabled);
    }
    if !policy.save_pending {
        return Ok(SaveOutcome::NothingPending);
    }
    if factories.is_empty() {
        tracing::warn!("no factory data to save");
        return Ok(SaveOutcome::NoData);
    }
    Ok(SaveOutcome::Saved(store.save_factories(factories)?))
}
