//! File-backed guest session persistence.
//!
//! The on-disk shape stands in for the two browser-storage keys of the
//! original platform (session id + serialized snapshot), plus the pending
//! bucket so unsynced counts survive a reload:
//!
//! ```json
//! {
//!   "version": 1,
//!   "session_id": "01J...",
//!   "session": { ... GuestSession fields ... },
//!   "pending": { "page_views": 2, "time_spent_seconds": 30, "biography_views": 1 }
//! }
//! ```
//!
//! Loading is defensive: a missing, empty, corrupt, or future-version file
//! yields an empty store (logged, never raised), which makes initialization
//! fall through to handshake-or-fresh exactly as the lifecycle requires.
//! Saves go through a temp file + rename so a crash cannot leave a
//! half-written document.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use guestsync_core::{GuestSession, PendingDelta};

use crate::error::StoreError;

/// Schema version of the store document. Older or newer versions are
/// discarded rather than migrated; the data is cheap to re-accumulate.
const STORE_VERSION: u32 = 1;

/// The on-disk JSON structure.
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    version: u32,
    #[serde(default)]
    session_id: Option<String>,
    #[serde(default)]
    session: Option<GuestSession>,
    #[serde(default)]
    pending: PendingDelta,
}

/// Default per-user location for the store document: the platform's
/// app-data directory, or a hidden `.guestsync` directory under the home
/// directory when no app-data directory exists.
///
/// `None` only when the platform exposes neither; hosts can always pass
/// an explicit path instead.
pub fn default_store_path() -> Option<PathBuf> {
    if let Some(base) = dirs::data_local_dir() {
        return Some(base.join("guestsync").join("session.json"));
    }
    dirs::home_dir().map(|base| base.join(".guestsync").join("session.json"))
}

/// In-memory guest state, optionally backed by a file.
///
/// Create with [`SnapshotStore::open`] to read from disk, or
/// [`SnapshotStore::in_memory`] for tests and storage-less hosts.
#[derive(Debug)]
pub struct SnapshotStore {
    session_id: Option<String>,
    session: Option<GuestSession>,
    pending: PendingDelta,
    path: Option<PathBuf>,
}

impl SnapshotStore {
    /// An empty store with no backing file. `save` is a no-op.
    pub fn in_memory() -> Self {
        Self {
            session_id: None,
            session: None,
            pending: PendingDelta::default(),
            path: None,
        }
    }

    fn empty_at(path: PathBuf) -> Self {
        Self {
            session_id: None,
            session: None,
            pending: PendingDelta::default(),
            path: Some(path),
        }
    }

    /// Load the store from `path`, degrading to an empty store on any
    /// defect. Never fails: an unreadable or corrupt document is logged
    /// and treated as "no cache".
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if !path.exists() {
            return Self::empty_at(path);
        }

        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("unreadable store file {}: {e}", path.display());
                return Self::empty_at(path);
            }
        };

        if content.trim().is_empty() {
            tracing::warn!("empty store file {}", path.display());
            return Self::empty_at(path);
        }

        match serde_json::from_str::<StoreFile>(&content) {
            Ok(file) if file.version == STORE_VERSION => Self {
                // Keep the two fields coherent even if a foreign writer
                // stored an id without a snapshot.
                session_id: file.session_id.or_else(|| {
                    file.session.as_ref().map(|s| s.id.clone())
                }),
                session: file.session,
                pending: file.pending,
                path: Some(path),
            },
            Ok(file) => {
                tracing::warn!(
                    "unsupported store version {} (expected {STORE_VERSION}), starting empty",
                    file.version
                );
                Self::empty_at(path)
            }
            Err(e) => {
                tracing::warn!("corrupt store file {}: {e}", path.display());
                Self::empty_at(path)
            }
        }
    }

    /// The stored session id, if any.
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// The cached snapshot, if any.
    pub fn session(&self) -> Option<&GuestSession> {
        self.session.as_ref()
    }

    /// Mutable access to the cached snapshot for optimistic updates.
    pub fn session_mut(&mut self) -> Option<&mut GuestSession> {
        self.session.as_mut()
    }

    /// The pending bucket.
    pub fn pending(&self) -> PendingDelta {
        self.pending
    }

    /// Mutable access to the pending bucket.
    pub fn pending_mut(&mut self) -> &mut PendingDelta {
        &mut self.pending
    }

    /// Adopt a session as current, keeping id and snapshot in step.
    pub fn adopt(&mut self, session: GuestSession) {
        self.session_id = Some(session.id.clone());
        self.session = Some(session);
    }

    /// Write the document to disk atomically. No-op for in-memory stores.
    pub fn save(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let file = StoreFile {
            version: STORE_VERSION,
            session_id: self.session_id.clone(),
            session: self.session.clone(),
            pending: self.pending,
        };
        let content = serde_json::to_string_pretty(&file)?;

        let parent = path.parent().ok_or(StoreError::NoParentDir)?;
        fs::create_dir_all(parent)?;

        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }

    /// Drop all state and remove the backing file if present.
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.session_id = None;
        self.session = None;
        self.pending = PendingDelta::default();

        let Some(path) = &self.path else {
            return Ok(());
        };
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// The backing file path, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────
