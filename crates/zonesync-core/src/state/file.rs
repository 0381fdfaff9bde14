// # File Record Store
//
// File-based implementation of RecordStore with crash recovery.
//
// ## Purpose
//
// Keeps the local mirror, soft-deleted audit rows and change ids across
// daemon restarts.
//
// ## Crash Recovery
//
// - Atomic writes: Uses write-then-rename for atomicity
// - Corruption detection: Validates JSON on load
// - Automatic backup: Keeps .backup of last known good state
// - Recovery: Falls back to backup if corruption detected
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "tables": {
//     "zones": { "1": { "id": 1, "provider_id": "Z1", "name": "example.com.", ... } },
//     "records": { ... },
//     "changes": { ... },
//     "next_zone_id": 1,
//     "next_record_id": 0,
//     "next_value_id": 0,
//     "next_change_id": 0
//   }
// }
// ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::Error;
use crate::config::StoreConfig;
use crate::model::{
    Change, ChangeOwner, ChangeRowId, HostedZone, NewChange, NewRecord, NewZone, Record,
    RecordId, StateFilter, ZoneId,
};
use crate::state::tables::Tables;
use crate::traits::record_store::{RecordStore, RecordStoreFactory};

/// Store file format version
const STORE_FILE_VERSION: &str = "1.0";

/// File-based record store with crash recovery
///
/// Every mutation is written through to disk before it returns. The
/// in-memory tables only change once the write succeeded, so a failed write
/// leaves the store as it was.
///
/// # Example
///
/// ```rust,no_run
/// use zonesync_core::state::FileRecordStore;
/// use zonesync_core::traits::RecordStore;
/// use zonesync_core::model::StateFilter;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileRecordStore::new("/var/lib/zonesync/store.json").await?;
///     let zones = store.list_zones(StateFilter::Active).await?;
///     println!("{} active zones", zones.len());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileRecordStore {
    path: PathBuf,
    tables: Arc<RwLock<Tables>>,
}

/// Serializable store file format
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
struct StoreFileFormat {
    version: String,
    tables: Tables,
}

impl FileRecordStore {
    /// Create or load a file record store
    ///
    /// This will:
    /// 1. Try to load the existing store file
    /// 2. If corruption detected, try to load from backup
    /// 3. If both fail, start with empty tables
    /// 4. Create parent directories if needed
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create store directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let tables = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            tables: Arc::new(RwLock::new(tables)),
        })
    }

    /// Load tables from file with automatic recovery
    async fn load_with_recovery(path: &Path) -> Result<Tables, Error> {
        match Self::load(path).await {
            Ok(tables) => {
                tracing::debug!("Loaded record store from {}", path.display());
                Ok(tables)
            }
            Err(LoadError::Corrupt(e)) => {
                tracing::warn!(
                    "Store file appears corrupted: {}. Attempting recovery from backup.",
                    e
                );

                let backup_path = Self::backup_path(path);
                if !backup_path.exists() {
                    tracing::warn!("No backup file found. Starting with an empty store.");
                    return Ok(Tables::default());
                }

                match Self::load(&backup_path).await {
                    Ok(tables) => {
                        tracing::info!("Recovered record store from backup");
                        if let Err(restore_err) =
                            Self::restore_from_backup(path, &backup_path).await
                        {
                            tracing::error!(
                                "Failed to restore store file from backup: {}",
                                restore_err
                            );
                        }
                        Ok(tables)
                    }
                    Err(backup_err) => {
                        tracing::error!(
                            "Backup also unreadable: {}. Starting with an empty store.",
                            backup_err.into_error()
                        );
                        Ok(Tables::default())
                    }
                }
            }
            Err(LoadError::Io(e)) => Err(e),
        }
    }

    async fn load(path: &Path) -> Result<Tables, LoadError> {
        if !path.exists() {
            tracing::debug!("Store file does not exist: {}", path.display());
            return Ok(Tables::default());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            LoadError::Io(Error::state_store(format!(
                "Failed to read store file {}: {}",
                path.display(),
                e
            )))
        })?;

        let file: StoreFileFormat = serde_json::from_str(&content).map_err(|e| {
            LoadError::Corrupt(Error::state_store(format!(
                "Failed to parse store file {}: {}",
                path.display(),
                e
            )))
        })?;

        if file.version != STORE_FILE_VERSION {
            tracing::warn!(
                "Store file version mismatch: expected {}, got {}. Attempting to load anyway.",
                STORE_FILE_VERSION,
                file.version
            );
        }

        Ok(file.tables)
    }

    /// Write tables to file atomically
    ///
    /// Callers hold the tables write lock so writes never interleave.
    async fn write_tables(&self, tables: &Tables) -> Result<(), Error> {
        let file = StoreFileFormat {
            version: STORE_FILE_VERSION.to_string(),
            tables: tables.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| Error::state_store(format!("Failed to serialize store: {}", e)))?;

        let temp_path = self.temp_path();
        {
            let mut out = fs::File::create(&temp_path).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            out.write_all(json.as_bytes()).await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
            out.flush().await.map_err(|e| {
                Error::state_store(format!(
                    "Failed to flush temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Record store written to {}", self.path.display());
        Ok(())
    }

    /// Apply a mutation to a copy of the tables, write it, then swap it in
    async fn mutate<T>(&self, f: impl FnOnce(&mut Tables) -> Result<T, Error>) -> Result<T, Error> {
        let mut tables = self.tables.write().await;
        let mut staged = tables.clone();
        let out = f(&mut staged)?;
        self.write_tables(&staged).await?;
        *tables = staged;
        Ok(out)
    }

    async fn restore_from_backup(path: &Path, backup_path: &Path) -> Result<(), Error> {
        fs::copy(backup_path, path).await.map_err(|e| {
            Error::state_store(format!(
                "Failed to restore from backup {} to {}: {}",
                backup_path.display(),
                path.display(),
                e
            ))
        })?;
        tracing::info!("Restored store file from backup");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }
}

/// Distinguishes unreadable files from unparseable ones during load
enum LoadError {
    Io(Error),
    Corrupt(Error),
}

impl LoadError {
    fn into_error(self) -> Error {
        match self {
            LoadError::Io(e) | LoadError::Corrupt(e) => e,
        }
    }
}

#[async_trait]
impl RecordStore for FileRecordStore {
    async fn insert_zone(&self, zone: NewZone) -> Result<HostedZone, Error> {
        self.mutate(|t| t.insert_zone(zone)).await
    }

    async fn get_zone(&self, id: ZoneId) -> Result<Option<HostedZone>, Error> {
        Ok(self.tables.read().await.get_zone(id))
    }

    async fn find_zone_by_provider_id(
        &self,
        provider_id: &str,
    ) -> Result<Option<HostedZone>, Error> {
        Ok(self
            .tables
            .read()
            .await
            .find_zone_by_provider_id(provider_id))
    }

    async fn find_zone_by_name(&self, name: &str) -> Result<Option<HostedZone>, Error> {
        Ok(self.tables.read().await.find_zone_by_name(name))
    }

    async fn list_zones(&self, filter: StateFilter) -> Result<Vec<HostedZone>, Error> {
        Ok(self.tables.read().await.list_zones(filter))
    }

    async fn rename_zone(&self, id: ZoneId, name: &str) -> Result<(), Error> {
        self.mutate(|t| t.rename_zone(id, name)).await
    }

    async fn mark_zone_deleted(&self, id: ZoneId) -> Result<(), Error> {
        self.mutate(|t| t.mark_zone_deleted(id)).await
    }

    async fn insert_record(&self, record: NewRecord) -> Result<Record, Error> {
        self.mutate(|t| t.insert_record(record)).await
    }

    async fn get_record(&self, id: RecordId) -> Result<Option<Record>, Error> {
        Ok(self.tables.read().await.get_record(id))
    }

    async fn list_records(
        &self,
        zone_id: ZoneId,
        filter: StateFilter,
    ) -> Result<Vec<Record>, Error> {
        Ok(self.tables.read().await.list_records(zone_id, filter))
    }

    async fn mark_record_deleted(&self, id: RecordId) -> Result<(), Error> {
        self.mutate(|t| t.mark_record_deleted(id)).await
    }

    async fn retire_zone_records(&self, zone_id: ZoneId) -> Result<usize, Error> {
        self.mutate(|t| Ok(t.retire_zone_records(zone_id))).await
    }

    async fn insert_change(&self, change: NewChange) -> Result<Change, Error> {
        self.mutate(|t| t.insert_change(change)).await
    }

    async fn get_change(&self, id: ChangeRowId) -> Result<Option<Change>, Error> {
        Ok(self.tables.read().await.get_change(id))
    }

    async fn list_changes(&self, owner: ChangeOwner) -> Result<Vec<Change>, Error> {
        Ok(self.tables.read().await.list_changes(owner))
    }

    async fn flush(&self) -> Result<(), Error> {
        let tables = self.tables.write().await;
        self.write_tables(&tables).await
    }
}

/// Factory for `type = "file"` store configurations
pub struct FileRecordStoreFactory;

#[async_trait]
impl RecordStoreFactory for FileRecordStoreFactory {
    async fn create(&self, config: &StoreConfig) -> Result<Box<dyn RecordStore>, Error> {
        match config {
            StoreConfig::File { path } => Ok(Box::new(FileRecordStore::new(path).await?)),
            _ => Err(Error::config("Invalid config for file record store")),
        }
    }
}
