//! Authentication and tenant state, plus per-family refresh epochs.
//!
//! One `Session` is shared (behind an `Arc`) by the API facade and the
//! query layer. It mirrors what is persisted through [`AuthStorage`]; every
//! transition that changes persisted state writes storage first.

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{info, warn};

use crate::api::types::{Store, User};
use crate::cache::Family;
use crate::error::StorageError;
use crate::storage::AuthStorage;

#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
  pub is_authenticated: bool,
  pub is_loading: bool,
  pub user: Option<User>,
  pub stores: Vec<Store>,
  pub current_store: Option<Store>,
  epochs: [u64; 4],
}

impl Default for SessionState {
  fn default() -> Self {
    Self {
      is_authenticated: false,
      is_loading: true,
      user: None,
      stores: Vec::new(),
      current_store: None,
      epochs: [0; 4],
    }
  }
}

impl SessionState {
  fn signed_out() -> Self {
    Self {
      is_loading: false,
      ..Self::default()
    }
  }

  pub fn epoch(&self, family: Family) -> u64 {
    self.epochs[family.index()]
  }
}

pub struct Session {
  storage: AuthStorage,
  state: RwLock<SessionState>,
}

impl Session {
  pub fn new(storage: AuthStorage) -> Self {
    Self {
      storage,
      state: RwLock::new(SessionState::default()),
    }
  }

  pub fn storage(&self) -> &AuthStorage {
    &self.storage
  }

  fn read(&self) -> RwLockReadGuard<'_, SessionState> {
    self.state.read().unwrap_or_else(|e| e.into_inner())
  }

  fn write(&self) -> RwLockWriteGuard<'_, SessionState> {
    self.state.write().unwrap_or_else(|e| e.into_inner())
  }

  /// Copy of the current state.
  pub fn state(&self) -> SessionState {
    self.read().clone()
  }

  pub fn is_authenticated(&self) -> bool {
    self.read().is_authenticated
  }

  pub fn current_store(&self) -> Option<Store> {
    self.read().current_store.clone()
  }

  pub fn epoch(&self, family: Family) -> u64 {
    self.read().epoch(family)
  }

  /// Restore state from persisted storage.
  ///
  /// A token without a readable user and store list is treated as corrupt:
  /// all persisted auth is cleared and the session starts signed out.
  pub fn initialize(&self) -> Result<(), StorageError> {
    let restored = self.restore();
    let mut state = self.write();
    let epochs = state.epochs;

    match restored {
      Ok(Some((user, stores, current_store))) => {
        info!(user = %user.id, stores = stores.len(), "session restored");
        *state = SessionState {
          is_authenticated: true,
          is_loading: false,
          user: Some(user),
          stores,
          current_store,
          epochs,
        };
        Ok(())
      }
      Ok(None) => {
        *state = SessionState {
          epochs,
          ..SessionState::signed_out()
        };
        Ok(())
      }
      Err(e) => {
        warn!(error = %e, "failed to read persisted session, signing out");
        *state = SessionState {
          epochs,
          ..SessionState::signed_out()
        };
        self.storage.clear_all_auth()
      }
    }
  }

  #[allow(clippy::type_complexity)]
  fn restore(&self) -> Result<Option<(User, Vec<Store>, Option<Store>)>, StorageError> {
    if self.storage.auth_token()?.is_none() {
      return Ok(None);
    }

    let user = self.storage.user::<User>()?;
    let stores = self.storage.stores::<Store>()?;
    let (Some(user), Some(stores)) = (user, stores) else {
      warn!("persisted session is incomplete, clearing it");
      self.storage.clear_all_auth()?;
      return Ok(None);
    };

    let store_id = self.storage.store_id()?;
    let current_store = store_id
      .and_then(|id| stores.iter().find(|s| s.id == id).cloned())
      .or_else(|| stores.first().cloned());

    Ok(Some((user, stores, current_store)))
  }

  pub fn set_user(&self, user: User) {
    let mut state = self.write();
    state.user = Some(user);
    state.is_authenticated = true;
    state.is_loading = false;
  }

  /// Replace the store list, keeping the selected store when it is still
  /// present.
  ///
  /// With no prior selection a store is picked only when it is the sole
  /// choice; otherwise the caller must [`select_store`](Self::select_store).
  pub fn set_stores(&self, stores: Vec<Store>) {
    let mut state = self.write();
    let current_store = match &state.current_store {
      Some(current) => stores
        .iter()
        .find(|s| s.id == current.id)
        .or_else(|| stores.first())
        .cloned(),
      None if stores.len() == 1 => stores.first().cloned(),
      None => None,
    };
    state.stores = stores;
    state.current_store = current_store;
  }

  /// Persist and activate `store` as the request scope.
  pub fn select_store(&self, store: Store) -> Result<(), StorageError> {
    self.storage.save_store_id(&store.id)?;
    self.storage.save_store_slug(&store.slug)?;
    info!(store = %store.slug, "store selected");
    self.write().current_store = Some(store);
    Ok(())
  }

  /// Clear persisted auth and reset to signed-out defaults, epochs included.
  pub fn logout(&self) -> Result<(), StorageError> {
    let result = self.storage.clear_all_auth();
    *self.write() = SessionState::signed_out();
    info!("signed out");
    result
  }

  /// The server rejected the session. Storage was already cleared by the
  /// client; only the in-memory state is reset here.
  pub fn expire(&self) {
    let mut state = self.write();
    if state.is_authenticated {
      warn!("session expired");
    }
    *state = SessionState::signed_out();
  }

  /// Bump `family`'s refresh epoch; every epoch-bound read of it refetches.
  pub fn trigger_refresh(&self, family: Family) -> u64 {
    let mut state = self.write();
    let epoch = &mut state.epochs[family.index()];
    *epoch += 1;
    *epoch
  }

  pub fn trigger_orders_refresh(&self) -> u64 {
    self.trigger_refresh(Family::Orders)
  }

  pub fn trigger_products_refresh(&self) -> u64 {
    self.trigger_refresh(Family::Products)
  }

  pub fn trigger_customers_refresh(&self) -> u64 {
    self.trigger_refresh(Family::Customers)
  }

  pub fn trigger_dashboard_refresh(&self) -> u64 {
    self.trigger_refresh(Family::Dashboard)
  }
}
