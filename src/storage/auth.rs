//! Typed access to persisted authentication state.

use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

use super::{LocalStorage, MemoryStorage, Namespace};
use crate::error::StorageError;

const AUTH_TOKEN: &str = "auth_token";
const REFRESH_TOKEN: &str = "refresh_token";

const STORE_ID: &str = "current_store_id";
const STORE_SLUG: &str = "current_store_slug";
const USER: &str = "user_data";
const STORES: &str = "stores_data";
const ONBOARDED: &str = "has_onboarded";

/// Persisted authentication state shared by the request client and the
/// session.
#[derive(Clone)]
pub struct AuthStorage {
  inner: Arc<dyn LocalStorage>,
}

impl AuthStorage {
  pub fn new(inner: Arc<dyn LocalStorage>) -> Self {
    Self { inner }
  }

  /// Storage that is discarded with the process.
  pub fn in_memory() -> Self {
    Self::new(Arc::new(MemoryStorage::new()))
  }

  // Secure namespace

  pub fn save_auth_token(&self, token: &str) -> Result<(), StorageError> {
    self.inner.set(Namespace::Secure, AUTH_TOKEN, token)
  }

  pub fn auth_token(&self) -> Result<Option<String>, StorageError> {
    self.inner.get(Namespace::Secure, AUTH_TOKEN)
  }

  pub fn save_refresh_token(&self, token: &str) -> Result<(), StorageError> {
    self.inner.set(Namespace::Secure, REFRESH_TOKEN, token)
  }

  pub fn refresh_token(&self) -> Result<Option<String>, StorageError> {
    self.inner.get(Namespace::Secure, REFRESH_TOKEN)
  }

  fn clear_secure_auth(&self) -> Result<(), StorageError> {
    self.inner.remove(Namespace::Secure, AUTH_TOKEN)?;
    self.inner.remove(Namespace::Secure, REFRESH_TOKEN)
  }

  // Plain namespace

  pub fn save_store_id(&self, store_id: &str) -> Result<(), StorageError> {
    self.inner.set(Namespace::Plain, STORE_ID, store_id)
  }

  pub fn store_id(&self) -> Result<Option<String>, StorageError> {
    self.inner.get(Namespace::Plain, STORE_ID)
  }

  pub fn save_store_slug(&self, slug: &str) -> Result<(), StorageError> {
    self.inner.set(Namespace::Plain, STORE_SLUG, slug)
  }

  pub fn store_slug(&self) -> Result<Option<String>, StorageError> {
    self.inner.get(Namespace::Plain, STORE_SLUG)
  }

  pub fn save_user<T: Serialize>(&self, user: &T) -> Result<(), StorageError> {
    self.save_json(USER, user)
  }

  /// The persisted user, or `None` when absent or unparseable.
  pub fn user<T: DeserializeOwned>(&self) -> Result<Option<T>, StorageError> {
    self.load_json(USER)
  }

  pub fn save_stores<T: Serialize>(&self, stores: &[T]) -> Result<(), StorageError> {
    self.save_json(STORES, &stores)
  }

  /// The persisted store list, or `None` when absent or unparseable.
  pub fn stores<T: DeserializeOwned>(&self) -> Result<Option<Vec<T>>, StorageError> {
    self.load_json(STORES)
  }

  pub fn set_has_onboarded(&self, value: bool) -> Result<(), StorageError> {
    self
      .inner
      .set(Namespace::Plain, ONBOARDED, if value { "true" } else { "false" })
  }

  pub fn has_onboarded(&self) -> Result<bool, StorageError> {
    Ok(self.inner.get(Namespace::Plain, ONBOARDED)?.as_deref() == Some("true"))
  }

  /// Remove tokens, user, stores and the store selection.
  ///
  /// The onboarding flag survives.
  pub fn clear_all_auth(&self) -> Result<(), StorageError> {
    self.clear_secure_auth()?;
    for key in [STORE_ID, STORE_SLUG, USER, STORES] {
      self.inner.remove(Namespace::Plain, key)?;
    }
    Ok(())
  }

  fn save_json<T: Serialize + ?Sized>(&self, key: &'static str, value: &T) -> Result<(), StorageError> {
    let data =
      serde_json::to_string(value).map_err(|source| StorageError::Serialize { key, source })?;
    self.inner.set(Namespace::Plain, key, &data)
  }

  fn load_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
    let Some(data) = self.inner.get(Namespace::Plain, key)? else {
      return Ok(None);
    };
    match serde_json::from_str(&data) {
      Ok(value) => Ok(Some(value)),
      Err(e) => {
        tracing::warn!(key, error = %e, "discarding unparseable persisted value");
        Ok(None)
      }
    }
  }
}
