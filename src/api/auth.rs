use serde_json::json;
use tracing::{debug, info};

use super::client::{ApiClient, RequestOptions};
use super::types::{
  Ack, CurrentStoreResponse, LoginRequest, LoginResponse, RefreshResponse, SwitchStoreResponse,
};
use crate::error::ApiError;

impl ApiClient {
  /// Sign in. On success the tokens, user and store list are persisted, and
  /// a sole store is selected.
  ///
  /// A response with `success: false` is returned as is, nothing persisted.
  pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
    let response: LoginResponse = self
      .post_with("/mobile/auth/login", request, RequestOptions::skip_auth())
      .await?;

    if response.success && !response.token.is_empty() {
      let storage = self.storage();
      storage.save_auth_token(&response.token)?;
      if let Some(refresh) = &response.refresh_token {
        storage.save_refresh_token(refresh)?;
      }
      if let Some(user) = &response.user {
        storage.save_user(user)?;
      }
      storage.save_stores(&response.stores)?;

      if let [store] = response.stores.as_slice() {
        storage.save_store_id(&store.id)?;
        storage.save_store_slug(&store.slug)?;
      }
      info!(stores = response.stores.len(), "signed in");
    }

    Ok(response)
  }

  /// Exchange the persisted refresh token for a new token pair.
  pub async fn refresh_token(&self) -> Result<RefreshResponse, ApiError> {
    let Some(refresh) = self.storage().refresh_token()? else {
      return Err(ApiError::auth());
    };

    let response: RefreshResponse = self
      .post_with(
        "/mobile/auth/refresh",
        &json!({ "refreshToken": refresh }),
        RequestOptions::skip_auth(),
      )
      .await?;

    if !response.token.is_empty() {
      self.storage().save_auth_token(&response.token)?;
      if let Some(refresh) = &response.refresh_token {
        self.storage().save_refresh_token(refresh)?;
      }
      debug!("auth token refreshed");
    }
    Ok(response)
  }

  /// Tell the server, then clear persisted auth whatever it answered.
  pub async fn logout(&self) -> Result<(), ApiError> {
    if let Err(e) = self.post::<_, Ack>("/mobile/auth/logout", &()).await {
      debug!(error = %e, "logout request failed, clearing local state anyway");
    }
    self.storage().clear_all_auth()?;
    Ok(())
  }

  pub async fn current_store(&self) -> Result<CurrentStoreResponse, ApiError> {
    self.get("/mobile/store").await
  }

  /// Switch the server-side store and persist it as the request scope.
  pub async fn switch_store(&self, store_id: &str) -> Result<SwitchStoreResponse, ApiError> {
    let response: SwitchStoreResponse = self
      .post("/mobile/store/switch", &json!({ "storeId": store_id }))
      .await?;
    if response.success {
      self.storage().save_store_id(&response.store.id)?;
      self.storage().save_store_slug(&response.store.slug)?;
    }
    Ok(response)
  }
}
