//! SQLite-backed key/value storage.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::{LocalStorage, Namespace};
use crate::error::StorageError;

/// SQLite-based storage implementation.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open (or create) the storage file at `path`, or at the default location.
  pub fn open(path: Option<&Path>) -> Result<Self, StorageError> {
    let path = match path {
      Some(p) => p.to_path_buf(),
      None => Self::default_path()?,
    };

    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(&path).map_err(|source| StorageError::Open {
      path: path.display().to_string(),
      source,
    })?;

    Self::from_connection(conn)
  }

  /// In-memory database, mostly useful in tests.
  pub fn open_in_memory() -> Result<Self, StorageError> {
    Self::from_connection(Connection::open_in_memory()?)
  }

  fn from_connection(conn: Connection) -> Result<Self, StorageError> {
    conn.execute_batch(STORAGE_SCHEMA)?;
    Ok(Self {
      conn: Mutex::new(conn),
    })
  }

  /// Get the default database path.
  pub fn default_path() -> Result<PathBuf, StorageError> {
    let data_dir = dirs::data_dir()
      .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
      .ok_or(StorageError::NoDataDir)?;

    Ok(data_dir.join("storefront").join("storage.db"))
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StorageError> {
    self
      .conn
      .lock()
      .map_err(|e| StorageError::Poisoned(e.to_string()))
  }
}

const STORAGE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS kv_store (
    namespace TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    PRIMARY KEY (namespace, key)
);
"#;

impl LocalStorage for SqliteStorage {
  fn get(&self, namespace: Namespace, key: &str) -> Result<Option<String>, StorageError> {
    let conn = self.lock()?;
    let value = conn
      .query_row(
        "SELECT value FROM kv_store WHERE namespace = ? AND key = ?",
        params![namespace.as_str(), key],
        |row| row.get(0),
      )
      .optional()?;
    Ok(value)
  }

  fn set(&self, namespace: Namespace, key: &str, value: &str) -> Result<(), StorageError> {
    let conn = self.lock()?;
    conn.execute(
      "INSERT OR REPLACE INTO kv_store (namespace, key, value, updated_at)
       VALUES (?, ?, ?, ?)",
      params![namespace.as_str(), key, value, Utc::now().to_rfc3339()],
    )?;
    Ok(())
  }

  fn remove(&self, namespace: Namespace, key: &str) -> Result<(), StorageError> {
    let conn = self.lock()?;
    conn.execute(
      "DELETE FROM kv_store WHERE namespace = ? AND key = ?",
      params![namespace.as_str(), key],
    )?;
    Ok(())
  }
}
