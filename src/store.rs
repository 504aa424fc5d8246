//! Record store for triage
//!
//! All state lives in one data directory as JSON documents, one file per
//! bucket:
//!
//! ```text
//! <data-dir>/
//!   triage.toml       # Optional configuration
//!   tasks.json        # Live task records (insertion order)
//!   archived.json     # Archived task records
//!   sync_meta.json    # Sync relationship metadata (singleton)
//!   q2_count.json     # Q2 completion counter (singleton)
//!   store.lock        # Advisory writer lock
//! ```
//!
//! Bucket files are replaced atomically (temp + rename); mutating commands
//! hold the store lock across their read-modify-write cycle.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::lock::{self, FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::sync::SyncMeta;
use crate::task::{ArchivedTask, Task};

/// Live task records
pub const TASKS_BUCKET: &str = "tasks.json";
/// Archived task records
pub const ARCHIVE_BUCKET: &str = "archived.json";
/// Sync metadata singleton
pub const SYNC_META_BUCKET: &str = "sync_meta.json";
/// Q2 completion counter singleton
pub const Q2_COUNT_BUCKET: &str = "q2_count.json";

const STORE_LOCK: &str = "store.lock";

/// Schema marker for exported snapshots
pub const EXPORT_SCHEMA_VERSION: &str = "triage.export.v1";

/// Storage manager for the board's buckets
#[derive(Debug, Clone)]
pub struct RecordStore {
    data_dir: PathBuf,
}

impl RecordStore {
    /// Create a store rooted at the given directory
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Create a store in the platform's per-user data directory
    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "triage").ok_or_else(|| {
            Error::Storage("cannot determine a data directory for this user".to_string())
        })?;
        Ok(Self::new(dirs.data_dir().to_path_buf()))
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    // =========================================================================
    // Path accessors
    // =========================================================================

    pub fn tasks_file(&self) -> PathBuf {
        self.data_dir.join(TASKS_BUCKET)
    }

    pub fn archive_file(&self) -> PathBuf {
        self.data_dir.join(ARCHIVE_BUCKET)
    }

    pub fn sync_meta_file(&self) -> PathBuf {
        self.data_dir.join(SYNC_META_BUCKET)
    }

    pub fn q2_count_file(&self) -> PathBuf {
        self.data_dir.join(Q2_COUNT_BUCKET)
    }

    fn lock_file(&self) -> PathBuf {
        self.data_dir.join(STORE_LOCK)
    }

    // =========================================================================
    // Initialization and locking
    // =========================================================================

    /// Create the data directory and seed missing buckets with defaults.
    /// Existing buckets are left untouched.
    pub fn init_all(&self, config: &Config) -> Result<()> {
        fs::create_dir_all(&self.data_dir)?;

        if !self.tasks_file().exists() {
            self.write_tasks(&[])?;
        }
        if !self.archive_file().exists() {
            self.write_archived(&[])?;
        }
        if !self.sync_meta_file().exists() {
            self.write_sync_meta(&SyncMeta::from_config(&config.sync))?;
        }
        if !self.q2_count_file().exists() {
            self.write_q2_count(0)?;
        }

        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.tasks_file().exists()
    }

    /// Take the store-wide writer lock for a read-modify-write cycle
    pub fn lock(&self) -> Result<FileLock> {
        FileLock::acquire(self.lock_file(), DEFAULT_LOCK_TIMEOUT_MS)
    }

    // =========================================================================
    // File I/O helpers (atomic writes for safety)
    // =========================================================================

    /// Write JSON data atomically (write to temp, then rename)
    pub fn write_json<T: Serialize>(&self, path: &Path, data: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(data)?;
        lock::write_atomic(path, json.as_bytes())
    }

    /// Read JSON data from a file
    pub fn read_json<T: DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        let data: T = serde_json::from_str(&content)?;
        Ok(data)
    }

    fn read_json_or<T: DeserializeOwned>(&self, path: &Path, default: impl FnOnce() -> T) -> Result<T> {
        if !path.exists() {
            return Ok(default());
        }
        self.read_json(path)
    }

    // =========================================================================
    // Bucket accessors
    // =========================================================================

    pub fn read_tasks(&self) -> Result<Vec<Task>> {
        self.read_json_or(&self.tasks_file(), Vec::new)
    }

    pub fn write_tasks(&self, tasks: &[Task]) -> Result<()> {
        self.write_json(&self.tasks_file(), &tasks)
    }

    pub fn read_archived(&self) -> Result<Vec<ArchivedTask>> {
        self.read_json_or(&self.archive_file(), Vec::new)
    }

    pub fn write_archived(&self, archived: &[ArchivedTask]) -> Result<()> {
        self.write_json(&self.archive_file(), &archived)
    }

    pub fn read_sync_meta(&self) -> Result<SyncMeta> {
        self.read_json_or(&self.sync_meta_file(), SyncMeta::default)
    }

    pub fn write_sync_meta(&self, meta: &SyncMeta) -> Result<()> {
        self.write_json(&self.sync_meta_file(), meta)
    }

    pub fn read_q2_count(&self) -> Result<u64> {
        self.read_json_or(&self.q2_count_file(), || 0)
    }

    pub fn write_q2_count(&self, count: u64) -> Result<()> {
        self.write_json(&self.q2_count_file(), &count)
    }

    // =========================================================================
    // Maintenance: export / import / reset
    // =========================================================================

    /// Serialize every bucket into one snapshot
    pub fn export_all(&self) -> Result<Snapshot> {
        Ok(Snapshot {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            tasks: self.read_tasks()?,
            archived: self.read_archived()?,
            sync_meta: self.read_sync_meta()?,
            q2_count: self.read_q2_count()?,
        })
    }

    /// Replace every bucket from a snapshot
    pub fn import_all(&self, snapshot: &Snapshot) -> Result<()> {
        if snapshot.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(Error::InvalidArgument(format!(
                "unsupported snapshot schema '{}' (expected {EXPORT_SCHEMA_VERSION})",
                snapshot.schema_version
            )));
        }

        let _guard = self.lock()?;
        fs::create_dir_all(&self.data_dir)?;
        self.write_tasks(&snapshot.tasks)?;
        self.write_archived(&snapshot.archived)?;
        self.write_sync_meta(&snapshot.sync_meta)?;
        self.write_q2_count(snapshot.q2_count)?;
        tracing::info!(tasks = snapshot.tasks.len(), "snapshot imported");
        Ok(())
    }

    /// Restore every bucket to its default value
    pub fn reset_all(&self, config: &Config) -> Result<()> {
        let _guard = self.lock()?;
        fs::create_dir_all(&self.data_dir)?;
        self.write_tasks(&[])?;
        self.write_archived(&[])?;
        self.write_sync_meta(&SyncMeta::from_config(&config.sync))?;
        self.write_q2_count(0)?;
        tracing::info!("store reset");
        Ok(())
    }
}

/// Full serialized store state, for backup and transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub schema_version: String,
    pub exported_at: DateTime<Utc>,
    pub tasks: Vec<Task>,
    pub archived: Vec<ArchivedTask>,
    pub sync_meta: SyncMeta,
    pub q2_count: u64,
}
