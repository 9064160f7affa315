//! Persisted generations of the database engine.
//!
//! When a backend has an `index_path`, each committed generation is written
//! to `quarry-index.json` in that directory together with [`IndexMetadata`].
//! The write goes to a temporary file that is then renamed over the old
//! snapshot, so a crash leaves either the previous or the new generation.
//!
//! # Usage
//!
//! ```rust,ignore
//! use quarry_fts::snapshot::Snapshot;
//!
//! if let Some(snapshot) = Snapshot::load(&index_dir)? {
//!     println!("generation {}", snapshot.metadata.generation);
//! }
//! ```

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use quarry_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::document::Document;

/// Snapshot filename inside the index directory.
const SNAPSHOT_FILE: &str = "quarry-index.json";

/// Snapshot format version.
///
/// Increment when the document layout changes; older snapshots are ignored.
pub const SCHEMA_VERSION: u32 = 1;

/// Metadata about a committed generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Snapshot format version.
    pub schema_version: u32,

    /// Monotonic generation number.
    pub generation: u64,

    /// Number of documents in the generation.
    pub document_count: usize,

    /// Commit time.
    pub committed_at: DateTime<Utc>,
}

impl IndexMetadata {
    /// Metadata for a generation committed now.
    pub fn new(generation: u64, document_count: usize) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            generation,
            document_count,
            committed_at: Utc::now(),
        }
    }
}

/// A committed generation on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Generation metadata.
    pub metadata: IndexMetadata,

    /// Every committed document.
    pub documents: Vec<Document>,
}

impl Snapshot {
    /// Path of the snapshot file in `index_path`.
    pub fn path_in(index_path: &Path) -> PathBuf {
        index_path.join(SNAPSHOT_FILE)
    }

    /// Whether `index_path` holds a snapshot.
    pub fn exists_in(index_path: &Path) -> bool {
        Self::path_in(index_path).exists()
    }

    /// Load the snapshot in `index_path`.
    ///
    /// Returns `Ok(None)` if there is no snapshot or it was written with a
    /// different schema version. Returns `Err` if the file exists but cannot
    /// be parsed.
    pub fn load(index_path: &Path) -> Result<Option<Self>> {
        let path = Self::path_in(index_path);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path).map_err(|e| Error::io_with_path(e, &path))?;
        let snapshot: Self = serde_json::from_str(&content)
            .map_err(|e| Error::parse(format!("Invalid index snapshot {}: {e}", path.display())))?;

        if snapshot.metadata.schema_version != SCHEMA_VERSION {
            log::warn!(
                "Ignoring index snapshot with schema version {} (expected {SCHEMA_VERSION})",
                snapshot.metadata.schema_version
            );
            return Ok(None);
        }
        Ok(Some(snapshot))
    }

    /// Write the snapshot into `index_path`, replacing any previous one.
    pub fn save(&self, index_path: &Path) -> Result<()> {
        if !index_path.exists() {
            std::fs::create_dir_all(index_path).map_err(|e| Error::io_with_path(e, index_path))?;
        }

        let path = Self::path_in(index_path);
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string(self)
            .map_err(|e| Error::engine_with_source("Failed to serialize index snapshot", e))?;

        std::fs::write(&tmp, content).map_err(|e| Error::io_with_path(e, &tmp))?;
        std::fs::rename(&tmp, &path).map_err(|e| Error::io_with_path(e, &path))?;

        log::debug!(
            "Saved generation {} ({} documents) to {}",
            self.metadata.generation,
            self.metadata.document_count,
            path.display()
        );
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
