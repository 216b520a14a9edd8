//! Storefront facade: cached reads and cache-aware writes per resource
//! family.
//!
//! Wraps the API client with the query layer the way the screens consume
//! it. Reads go through the cache with per-operation staleness windows;
//! writes go through the mutation protocol so that sibling cached reads stay
//! consistent.

mod auth;
mod customers;
mod dashboard;
mod orders;
mod products;

use color_eyre::Result;
use std::sync::Arc;
use std::time::Duration;

use crate::api::ApiClient;
use crate::cache::{CacheOptions, QueryClient};
use crate::config::{Config, DeviceConfig};
use crate::session::Session;
use crate::storage::{AuthStorage, SqliteStorage};

pub use auth::AuthActions;
pub use customers::Customers;
pub use dashboard::Dashboard;
pub use orders::Orders;
pub use products::Products;

const MINUTE: Duration = Duration::from_secs(60);

/// Staleness windows of the cached reads.
pub mod stale {
  use super::{Duration, MINUTE};

  pub const ORDER_DETAIL: Duration = MINUTE;
  pub const PRODUCT_DETAIL: Duration = Duration::from_secs(2 * 60);
  pub const CUSTOMER_DETAIL: Duration = Duration::from_secs(2 * 60);
  pub const LIST: Duration = Duration::from_secs(5 * 60);
  pub const STATS: Duration = Duration::from_secs(5 * 60);
  pub const CATEGORIES: Duration = Duration::from_secs(30 * 60);
  pub const BARCODE: Duration = Duration::from_secs(10 * 60);
  pub const DASHBOARD: Duration = Duration::from_secs(2 * 60);
  pub const DASHBOARD_REFETCH: Duration = Duration::from_secs(5 * 60);
  pub const REPORTS: Duration = Duration::from_secs(10 * 60);
}

/// Shortest code a barcode lookup is issued for.
pub const MIN_BARCODE_LEN: usize = 8;

/// Storefront client with transparent caching.
#[derive(Clone)]
pub struct Storefront {
  api: ApiClient,
  session: Arc<Session>,
  queries: QueryClient,
  device: DeviceConfig,
}

impl Storefront {
  /// Open persisted state, restore the session and build the clients.
  pub fn new(config: &Config) -> Result<Self> {
    let storage = SqliteStorage::open(config.storage.path.as_deref())?;
    let storage = AuthStorage::new(Arc::new(storage));
    let api = ApiClient::new(&config.api, storage)?;

    let storefront = Self::from_parts(api, config.device.clone(), config.cache.options());
    storefront.session.initialize()?;
    Ok(storefront)
  }

  /// Assemble from an existing client. The session shares the client's
  /// storage and starts uninitialized.
  pub fn from_parts(api: ApiClient, device: DeviceConfig, options: CacheOptions) -> Self {
    let session = Arc::new(Session::new(api.storage().clone()));
    let queries = QueryClient::new(session.clone(), options);
    Self {
      api,
      session,
      queries,
      device,
    }
  }

  pub fn api(&self) -> &ApiClient {
    &self.api
  }

  pub fn session(&self) -> &Arc<Session> {
    &self.session
  }

  pub fn queries(&self) -> &QueryClient {
    &self.queries
  }

  pub fn auth(&self) -> AuthActions<'_> {
    AuthActions::new(self)
  }

  pub fn orders(&self) -> Orders<'_> {
    Orders::new(self)
  }

  pub fn products(&self) -> Products<'_> {
    Products::new(self)
  }

  pub fn customers(&self) -> Customers<'_> {
    Customers::new(self)
  }

  pub fn dashboard(&self) -> Dashboard<'_> {
    Dashboard::new(self)
  }
}

#[cfg(test)]
pub(crate) mod test_support {
  use super::*;
  use crate::api::types::Store;
  use crate::config::ApiConfig;
  use serde_json::json;
  use wiremock::MockServer;

  pub fn storefront_for(server: &MockServer) -> Storefront {
    let config = ApiConfig {
      base_url: server.uri(),
      ..ApiConfig::default()
    };
    let api = ApiClient::new(&config, AuthStorage::in_memory()).unwrap();
    Storefront::from_parts(api, DeviceConfig::default(), CacheOptions::without_retries())
  }

  pub fn store(id: &str) -> Store {
    serde_json::from_value(json!({
      "id": id, "name": id, "slug": format!("shop-{}", id), "role": "owner"
    }))
    .unwrap()
  }

  pub fn order_json(id: &str, status: &str) -> serde_json::Value {
    json!({
      "id": id,
      "orderNumber": format!("#{}", id),
      "status": status,
      "financialStatus": "paid",
      "fulfillmentStatus": "unfulfilled",
      "total": 99.5,
      "isRead": false,
      "createdAt": "2024-03-01T10:00:00Z"
    })
  }

  pub fn orders_page(ids: &[&str], page: u32, total_pages: u32) -> serde_json::Value {
    json!({
      "orders": ids.iter().map(|id| order_json(id, "pending")).collect::<Vec<_>>(),
      "pagination": { "page": page, "limit": ids.len(), "total": 12, "totalPages": total_pages }
    })
  }
}
