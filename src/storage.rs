//src/storage.rs
//! Key-value persistence for the workout list.
//!
//! `StorageBackend` is the small string-level capability the app needs
//! (`get`/`set`/`remove`). Two backends are provided:
//!
//! - `MemoryStorage`: an in-process map, used by tests and throwaway sessions.
//! - `SqliteStorage`: a single `kv_store` table in a SQLite file under the
//!   user's data directory.
//!
//! The workout list itself lives under one key as a JSON array of plain
//! records, re-tagged into their variants on load.

use rusqlite::{named_params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing::debug;

use crate::workout::Workout;

pub const WORKOUTS_KEY: &str = "workouts";

const STORAGE_FILE_NAME: &str = "storage.sqlite";
const APP_DATA_DIR: &str = "workout-map"; // Same dir name as config

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to get application data directory")]
    DataDir,
    #[error("I/O error accessing storage file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Storage query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Stored workout data is malformed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Storage backend error: {0}")]
    Backend(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// String key/value store. Missing keys read as `Ok(None)`.
pub trait StorageBackend {
    fn get_string(&self, key: &str) -> StorageResult<Option<String>>;

    fn set_string(&self, key: &str, value: &str) -> StorageResult<()>;

    /// No-op if the key does not exist.
    fn remove(&self, key: &str) -> StorageResult<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.inner
            .lock()
            .map_err(|e| StorageError::Backend(format!("mutex poisoned: {e}")))
    }
}

impl StorageBackend for MemoryStorage {
    fn get_string(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_string(&self, key: &str, value: &str) -> StorageResult<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

pub struct SqliteStorage {
    conn: Connection,
}

/// Gets the path to the SQLite storage file within the app's data directory.
pub fn get_storage_path() -> StorageResult<PathBuf> {
    let data_dir = dirs::data_dir().ok_or(StorageError::DataDir)?;
    let app_dir = data_dir.join(APP_DATA_DIR);
    if !app_dir.exists() {
        std::fs::create_dir_all(&app_dir)?;
    }
    Ok(app_dir.join(STORAGE_FILE_NAME))
}

/// Creates the key/value table if it doesn't exist.
pub fn init_storage(conn: &Connection) -> StorageResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL
        )",
        [],
    )?;
    Ok(())
}

impl SqliteStorage {
    /// Opens (or creates) the storage file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> StorageResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    pub fn with_connection(conn: Connection) -> StorageResult<Self> {
        init_storage(&conn)?;
        Ok(Self { conn })
    }
}

impl StorageBackend for SqliteStorage {
    fn get_string(&self, key: &str) -> StorageResult<Option<String>> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = :key",
                named_params! { ":key": key },
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set_string(&self, key: &str, value: &str) -> StorageResult<()> {
        self.conn.execute(
            "INSERT INTO kv_store (key, value) VALUES (:key, :value)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            named_params! { ":key": key, ":value": value },
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.conn.execute(
            "DELETE FROM kv_store WHERE key = :key",
            named_params! { ":key": key },
        )?;
        Ok(())
    }
}

/// Serializes the whole list under `WORKOUTS_KEY`.
pub fn save_workouts(backend: &dyn StorageBackend, workouts: &[Workout]) -> StorageResult<()> {
    let json = serde_json::to_string(workouts)?;
    backend.set_string(WORKOUTS_KEY, &json)?;
    debug!(count = workouts.len(), "Saved workouts");
    Ok(())
}

/// Reads the list back. An absent or blank value means no workouts yet.
///
/// # Errors
/// `StorageError::Json` if the stored value is not a list of workout records
/// (including records with an unknown `type`).
pub fn load_workouts(backend: &dyn StorageBackend) -> StorageResult<Vec<Workout>> {
    match backend.get_string(WORKOUTS_KEY)? {
        Some(json) if !json.trim().is_empty() => {
            let workouts: Vec<Workout> = serde_json::from_str(&json)?;
            debug!(count = workouts.len(), "Loaded workouts");
            Ok(workouts)
        }
        _ => Ok(Vec::new()),
    }
}

pub fn clear_workouts(backend: &dyn StorageBackend) -> StorageResult<()> {
    backend.remove(WORKOUTS_KEY)
}
