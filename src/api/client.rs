//! The single chokepoint for outbound requests.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::ApiConfig;
use crate::error::{ApiError, GENERIC_REQUEST_MESSAGE};
use crate::storage::AuthStorage;

pub const PLATFORM_HEADER: &str = "X-Platform";
pub const STORE_HEADER: &str = "X-Store-Slug";

#[derive(Debug, Clone, Copy, Default)]
pub struct RequestOptions {
  /// Send without bearer token and store scope (login, token refresh).
  pub skip_auth: bool,
}

impl RequestOptions {
  pub fn skip_auth() -> Self {
    Self { skip_auth: true }
  }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
  message: Option<String>,
  code: Option<String>,
}

/// Storefront API client
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: String,
  platform: String,
  storage: AuthStorage,
}

impl ApiClient {
  pub fn new(config: &ApiConfig, storage: AuthStorage) -> Result<Self, ApiError> {
    let http = reqwest::Client::builder()
      .timeout(config.timeout())
      .build()
      .map_err(|e| ApiError::Api {
        status: 0,
        message: format!("Failed to build HTTP client: {}", e),
        code: None,
      })?;

    Ok(Self {
      http,
      base_url: config.base_url.trim_end_matches('/').to_string(),
      platform: config.platform.clone(),
      storage,
    })
  }

  pub fn storage(&self) -> &AuthStorage {
    &self.storage
  }

  fn url(&self, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
      path.to_string()
    } else {
      format!("{}{}", self.base_url, path)
    }
  }

  /// Issue a request and decode the JSON response.
  ///
  /// - 401 clears all persisted auth state and fails with `ApiError::Auth`
  /// - other non-2xx responses fail with the server's `message`/`code`
  /// - no response at all (including timeout) fails with status 0
  /// - a 2xx body that is empty or not JSON decodes as `{}`
  #[instrument(skip_all, fields(method = %method, path = %path))]
  pub async fn request<T: DeserializeOwned>(
    &self,
    method: Method,
    path: &str,
    body: Option<Value>,
    options: RequestOptions,
  ) -> Result<T, ApiError> {
    let url = self.url(path);

    let mut request = self
      .http
      .request(method, &url)
      .header(CONTENT_TYPE, "application/json")
      .header(PLATFORM_HEADER, &self.platform);

    if !options.skip_auth {
      if let Some(token) = self.storage.auth_token()? {
        request = request.header(AUTHORIZATION, format!("Bearer {}", token));
      }
      if let Some(slug) = self.storage.store_slug()? {
        request = request.header(STORE_HEADER, slug);
      }
    }

    if let Some(body) = body {
      let bytes = serde_json::to_vec(&body).map_err(|e| ApiError::Decode(e.to_string()))?;
      request = request.body(bytes);
    }

    debug!(url = %url, "sending request");

    let response = match request.send().await {
      Ok(response) => response,
      Err(e) => {
        warn!(error = %e, timeout = e.is_timeout(), "request failed without response");
        return Err(ApiError::network());
      }
    };

    let status = response.status();

    if status == StatusCode::UNAUTHORIZED {
      warn!("session rejected by server, clearing local auth state");
      if let Err(e) = self.storage.clear_all_auth() {
        warn!(error = %e, "failed to clear auth state after 401");
      }
      return Err(ApiError::auth());
    }

    if !status.is_success() {
      let text = response.text().await.unwrap_or_default();
      let parsed = serde_json::from_str::<ErrorBody>(&text).ok();
      let (message, code) = match parsed {
        Some(body) => (body.message, body.code),
        None => (None, None),
      };
      debug!(status = status.as_u16(), "request rejected");
      return Err(ApiError::Api {
        status: status.as_u16(),
        message: message.unwrap_or_else(|| GENERIC_REQUEST_MESSAGE.to_string()),
        code,
      });
    }

    let is_json = response
      .headers()
      .get(CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .map(|v| v.contains("application/json"))
      .unwrap_or(false);

    let text = response.text().await.map_err(|e| {
      warn!(error = %e, "failed to read response body");
      ApiError::network()
    })?;

    let value = if !is_json || text.trim().is_empty() {
      Value::Object(serde_json::Map::new())
    } else {
      serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))?
    };

    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
  }

  pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
    self
      .request(Method::GET, path, None, RequestOptions::default())
      .await
  }

  pub async fn post<B: Serialize, T: DeserializeOwned>(
    &self,
    path: &str,
    body: &B,
  ) -> Result<T, ApiError> {
    self
      .post_with(path, body, RequestOptions::default())
      .await
  }

  pub async fn post_with<B: Serialize, T: DeserializeOwned>(
    &self,
    path: &str,
    body: &B,
    options: RequestOptions,
  ) -> Result<T, ApiError> {
    let body = to_body(body)?;
    self.request(Method::POST, path, body, options).await
  }

  pub async fn patch<B: Serialize, T: DeserializeOwned>(
    &self,
    path: &str,
    body: &B,
  ) -> Result<T, ApiError> {
    let body = to_body(body)?;
    self
      .request(Method::PATCH, path, body, RequestOptions::default())
      .await
  }
}

/// `None` serializes to no body at all.
fn to_body<B: Serialize>(body: &B) -> Result<Option<Value>, ApiError> {
  let value = serde_json::to_value(body).map_err(|e| ApiError::Decode(e.to_string()))?;
  Ok(if value.is_null() { None } else { Some(value) })
}
