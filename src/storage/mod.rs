//! Local persisted state: credentials, the signed-in user and the store
//! selection.
//!
//! Two namespaces are kept apart:
//! - `Secure` holds bearer and refresh tokens
//! - `Plain` holds the serialized user, store list, selected store and flags

mod auth;
mod sqlite;

use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::StorageError;

pub use auth::AuthStorage;
pub use sqlite::SqliteStorage;

/// Storage namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
  Secure,
  Plain,
}

impl Namespace {
  pub fn as_str(self) -> &'static str {
    match self {
      Namespace::Secure => "secure",
      Namespace::Plain => "plain",
    }
  }
}

/// Trait for key/value storage backends.
pub trait LocalStorage: Send + Sync {
  fn get(&self, namespace: Namespace, key: &str) -> Result<Option<String>, StorageError>;

  fn set(&self, namespace: Namespace, key: &str, value: &str) -> Result<(), StorageError>;

  fn remove(&self, namespace: Namespace, key: &str) -> Result<(), StorageError>;
}

/// Storage that lives only as long as the process.
#[derive(Default)]
pub struct MemoryStorage {
  values: Mutex<HashMap<(Namespace, String), String>>,
}

impl MemoryStorage {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(
    &self,
  ) -> Result<std::sync::MutexGuard<'_, HashMap<(Namespace, String), String>>, StorageError> {
    self
      .values
      .lock()
      .map_err(|e| StorageError::Poisoned(e.to_string()))
  }
}

impl LocalStorage for MemoryStorage {
  fn get(&self, namespace: Namespace, key: &str) -> Result<Option<String>, StorageError> {
    Ok(self.lock()?.get(&(namespace, key.to_string())).cloned())
  }

  fn set(&self, namespace: Namespace, key: &str, value: &str) -> Result<(), StorageError> {
    self
      .lock()?
      .insert((namespace, key.to_string()), value.to_string());
    Ok(())
  }

  fn remove(&self, namespace: Namespace, key: &str) -> Result<(), StorageError> {
    self.lock()?.remove(&(namespace, key.to_string()));
    Ok(())
  }
}
