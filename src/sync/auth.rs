use tracing::info;

use super::Storefront;
use crate::api::types::{LoginRequest, LoginResponse, Store};
use crate::error::ApiError;

const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Sign-in, sign-out and store selection.
pub struct AuthActions<'a> {
  sf: &'a Storefront,
}

impl<'a> AuthActions<'a> {
  pub(super) fn new(sf: &'a Storefront) -> Self {
    Self { sf }
  }

  /// Restore the session from persisted state.
  pub fn initialize(&self) -> Result<(), ApiError> {
    self.sf.session.initialize()?;
    Ok(())
  }

  /// Sign in with the configured device identity.
  ///
  /// `success: false` is not an error; the session stays signed out.
  pub async fn login(
    &self,
    email: &str,
    password: &str,
    push_token: Option<&str>,
  ) -> Result<LoginResponse, ApiError> {
    let request = LoginRequest {
      email: email.to_string(),
      password: password.to_string(),
      device_id: self.sf.device.id.clone(),
      push_token: push_token.map(String::from),
      platform: self.sf.device.platform.clone(),
      app_version: APP_VERSION.to_string(),
    };

    let response = self.sf.api.login(&request).await?;
    if response.success {
      self.sf.queries.clear();
      if let Some(user) = &response.user {
        self.sf.session.set_user(user.clone());
      }
      self.sf.session.set_stores(response.stores.clone());
    }
    Ok(response)
  }

  /// Sign out locally whatever the server answers.
  pub async fn logout(&self) -> Result<(), ApiError> {
    let result = self.sf.api.logout().await;
    let session = self.sf.session.logout();
    self.sf.queries.clear();
    result?;
    session?;
    Ok(())
  }

  /// Make `store` the request scope. Cached reads of the previous store are
  /// dropped.
  pub fn select_store(&self, store: Store) -> Result<(), ApiError> {
    let changed = self
      .sf
      .session
      .current_store()
      .map(|current| current.id != store.id)
      .unwrap_or(true);
    self.sf.session.select_store(store)?;
    if changed {
      self.sf.queries.clear();
    }
    Ok(())
  }

  /// Switch the server-side store, then select it locally.
  pub async fn switch_store(&self, store_id: &str) -> Result<Store, ApiError> {
    let response = self.sf.api.switch_store(store_id).await?;
    let store = response.store;
    self.select_store(store.clone())?;
    info!(store = %store.slug, "store switched");
    Ok(store)
  }
}

#[cfg(test)]
mod tests {
  use super::super::test_support::{orders_page, store, storefront_for};
  use super::*;
  use crate::api::params::OrdersListParams;
  use crate::cache::Family;
  use serde_json::json;
  use wiremock::matchers::{body_partial_json, header, method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn login_body(stores: &[&str]) -> serde_json::Value {
    json!({
      "success": true,
      "token": "tok-1",
      "refreshToken": "ref-1",
      "expiresAt": "2030-01-01T00:00:00Z",
      "user": { "id": "u1", "name": "Dana", "email": "dana@example.com", "role": "merchant" },
      "stores": stores.iter().map(|id| json!({
        "id": id, "name": id, "slug": format!("shop-{}", id), "role": "owner"
      })).collect::<Vec<_>>()
    })
  }

  #[tokio::test]
  async fn test_login_with_two_stores_then_select() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/mobile/auth/login"))
      .and(body_partial_json(json!({
        "deviceId": "unknown-device",
        "platform": "android",
        "appVersion": APP_VERSION
      })))
      .respond_with(ResponseTemplate::new(200).set_body_json(login_body(&["s1", "s2"])))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/mobile/orders"))
      .and(header("authorization", "Bearer tok-1"))
      .and(header("x-store-slug", "shop-s2"))
      .respond_with(ResponseTemplate::new(200).set_body_json(orders_page(&["o1"], 1, 1)))
      .expect(1)
      .mount(&server)
      .await;

    let sf = storefront_for(&server);
    let response = sf
      .auth()
      .login("dana@example.com", "secret", None)
      .await
      .unwrap();
    assert!(response.success);

    let state = sf.session().state();
    assert!(state.is_authenticated);
    assert_eq!(state.stores.len(), 2);
    assert_eq!(state.current_store, None);

    sf.auth().select_store(store("s2")).unwrap();
    assert_eq!(
      sf.api().storage().store_slug().unwrap().as_deref(),
      Some("shop-s2")
    );

    sf.orders().list(&OrdersListParams::default()).await.unwrap();
  }

  #[tokio::test]
  async fn test_single_store_is_selected_on_login() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/mobile/auth/login"))
      .respond_with(ResponseTemplate::new(200).set_body_json(login_body(&["s1"])))
      .mount(&server)
      .await;

    let sf = storefront_for(&server);
    sf.auth().login("dana@example.com", "secret", None).await.unwrap();
    assert_eq!(sf.session().current_store().unwrap().id, "s1");
  }

  #[tokio::test]
  async fn test_rejected_login_leaves_session_signed_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/mobile/auth/login"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": false })))
      .mount(&server)
      .await;

    let sf = storefront_for(&server);
    let response = sf.auth().login("dana@example.com", "nope", None).await.unwrap();
    assert!(!response.success);
    assert!(!sf.session().is_authenticated());
  }

  #[tokio::test]
  async fn test_logout_resets_epochs_and_cache() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/mobile/auth/login"))
      .respond_with(ResponseTemplate::new(200).set_body_json(login_body(&["s1"])))
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/mobile/orders"))
      .respond_with(ResponseTemplate::new(200).set_body_json(orders_page(&["o1"], 1, 1)))
      .mount(&server)
      .await;
    Mock::given(method("POST"))
      .and(path("/mobile/auth/logout"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
      .expect(1)
      .mount(&server)
      .await;

    let sf = storefront_for(&server);
    sf.auth().login("dana@example.com", "secret", None).await.unwrap();
    sf.orders().list(&OrdersListParams::default()).await.unwrap();
    sf.session().trigger_orders_refresh();

    sf.auth().logout().await.unwrap();
    assert!(sf.queries().cache().is_empty());
    assert_eq!(sf.session().epoch(Family::Orders), 0);
    assert!(!sf.session().is_authenticated());
    assert_eq!(sf.api().storage().auth_token().unwrap(), None);
  }

  #[tokio::test]
  async fn test_unauthorized_read_signs_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/mobile/auth/login"))
      .respond_with(ResponseTemplate::new(200).set_body_json(login_body(&["s1"])))
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/mobile/orders/stats"))
      .respond_with(ResponseTemplate::new(401))
      .expect(1)
      .mount(&server)
      .await;

    let sf = storefront_for(&server);
    sf.auth().login("dana@example.com", "secret", None).await.unwrap();

    let err = sf.orders().stats().await.unwrap_err();
    assert!(err.is_auth());
    assert!(!sf.session().is_authenticated());
    assert_eq!(sf.api().storage().auth_token().unwrap(), None);
  }
}
