//! Store file management.
//!
//! This module provides:
//! - Loading and saving the data file (atomic: temp file + rename)
//! - Import/export of the store to arbitrary paths
//! - Timestamped backups with pruning of the oldest

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use craftbook_common::{CraftbookError, CraftbookResult};
use craftbook_core::{RecipeStore, StoreSnapshot};
use tracing::{debug, info, warn};

use crate::config::CraftbookConfig;

/// Backup file name prefix.
pub const BACKUP_PREFIX: &str = "recipe-backup-";

/// Backup file extension.
const BACKUP_EXTENSION: &str = "json";

/// Reads and writes the store on disk.
#[derive(Debug, Clone)]
pub struct DataFile {
    path: PathBuf,
    backup_dir: PathBuf,
    max_backups: usize,
}

impl DataFile {
    /// Creates a handle for the given locations.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>, max_backups: usize) -> Self {
        Self {
            path: path.into(),
            backup_dir: backup_dir.into(),
            max_backups: max_backups.max(1),
        }
    }

    /// Creates a handle from configuration.
    #[must_use]
    pub fn from_config(config: &CraftbookConfig) -> Self {
        Self::new(&config.data_file, &config.backup_dir, config.max_backups)
    }

    /// Path of the data file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the data file. A missing file yields an empty store.
    pub fn load(&self) -> CraftbookResult<RecipeStore> {
        if !self.path.exists() {
            info!("Data file {} not found, starting empty", self.path.display());
            return Ok(RecipeStore::new());
        }
        read_store(&self.path)
    }

    /// Writes the data file atomically.
    pub fn save(&self, store: &RecipeStore) -> CraftbookResult<()> {
        write_store(&self.path, store)?;
        debug!("Saved store to {}", self.path.display());
        Ok(())
    }

    /// Writes the store to an arbitrary path.
    pub fn export_to(&self, store: &RecipeStore, path: &Path) -> CraftbookResult<()> {
        write_store(path, store)?;
        info!("Exported store to {}", path.display());
        Ok(())
    }

    /// Reads a store from an arbitrary path without touching the data file.
    pub fn import_from(&self, path: &Path) -> CraftbookResult<RecipeStore> {
        let store = read_store(path)?;
        info!("Imported store from {}", path.display());
        Ok(store)
    }

    /// Writes a timestamped backup and prunes the oldest beyond the limit.
    pub fn create_backup(&self, store: &RecipeStore) -> CraftbookResult<PathBuf> {
        fs::create_dir_all(&self.backup_dir)?;

        let stamp = Utc::now().format("%Y%m%dT%H%M%S%3f");
        let mut path = self
            .backup_dir
            .join(format!("{BACKUP_PREFIX}{stamp}.{BACKUP_EXTENSION}"));
        let mut suffix = 1;
        while path.exists() {
            path = self
                .backup_dir
                .join(format!("{BACKUP_PREFIX}{stamp}-{suffix}.{BACKUP_EXTENSION}"));
            suffix += 1;
        }

        write_store(&path, store)?;
        info!("Created backup: {}", path.display());

        self.prune_backups()?;
        Ok(path)
    }

    /// Backup files, oldest first.
    pub fn list_backups(&self) -> CraftbookResult<Vec<PathBuf>> {
        if !self.backup_dir.exists() {
            return Ok(Vec::new());
        }

        let mut backups: Vec<PathBuf> = fs::read_dir(&self.backup_dir)?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| is_backup_file(path))
            .collect();
        backups.sort_by(|a, b| backup_order_key(a).cmp(&backup_order_key(b)));
        Ok(backups)
    }

    /// Reads a backup by file name.
    pub fn restore_backup(&self, file_name: &str) -> CraftbookResult<RecipeStore> {
        let bare_name = Path::new(file_name).file_name() == Some(OsStr::new(file_name));
        let path = self.backup_dir.join(file_name);
        if !bare_name || !is_backup_file(&path) || !path.exists() {
            return Err(CraftbookError::BackupNotFound(file_name.to_string()));
        }
        let store = read_store(&path)?;
        info!("Restored backup {}", path.display());
        Ok(store)
    }

    fn prune_backups(&self) -> CraftbookResult<()> {
        let backups = self.list_backups()?;
        let excess = backups.len().saturating_sub(self.max_backups);
        for old in backups.into_iter().take(excess) {
            match fs::remove_file(&old) {
                Ok(()) => debug!("Pruned backup {}", old.display()),
                Err(e) => warn!("Failed to prune backup {}: {e}", old.display()),
            }
        }
        Ok(())
    }
}

fn is_backup_file(path: &Path) -> bool {
    let named = path
        .file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with(BACKUP_PREFIX));
    named && path.extension().is_some_and(|ext| ext == BACKUP_EXTENSION)
}

/// Sorts `stamp` before `stamp-1` before `stamp-2`, and stamps by time.
fn backup_order_key(path: &Path) -> (String, u32) {
    let stem = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or_default();
    match stem.rsplit_once('-') {
        Some((stamp, suffix)) if stamp.len() > BACKUP_PREFIX.len() => {
            (stamp.to_string(), suffix.parse().unwrap_or(0))
        },
        _ => (stem.to_string(), 0),
    }
}

fn read_store(path: &Path) -> CraftbookResult<RecipeStore> {
    let contents = fs::read_to_string(path)?;
    let mut store = RecipeStore::new();
    store.load_json(&contents)?;
    Ok(store)
}

fn write_store(path: &Path, store: &RecipeStore) -> CraftbookResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let json = StoreSnapshot::from_store(store)
        .to_json_pretty()
        .map_err(|e| CraftbookError::Serialization(e.to_string()))?;

    let temp_path = path.with_extension("json.tmp");
    fs::write(&temp_path, json)?;
    fs::rename(&temp_path, path).map_err(|e| {
        // Clean up temp file on failure
        let _ = fs::remove_file(&temp_path);
        CraftbookError::Io(e)
    })?;
    Ok(())
}
