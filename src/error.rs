//! Error taxonomy shared by the request client, the query layer and the
//! session state.

use thiserror::Error;

/// Message shown when the server rejects the session.
pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired, please sign in again";

/// Message used when the server error body carries no message of its own.
pub const GENERIC_REQUEST_MESSAGE: &str = "The server could not process the request";

/// Message used when no response was received at all.
pub const NETWORK_MESSAGE: &str = "No internet connection or the server is unavailable";

/// Failure of a remote request, as seen by queries and mutations.
///
/// `Clone` so that a single in-flight fetch can hand the same outcome to
/// every caller that joined it.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
  /// HTTP 401. Local authentication state has already been cleared.
  #[error("{message}")]
  Auth { message: String },

  /// Any other non-2xx response, or `status == 0` when no response arrived.
  #[error("{message} (status {status})")]
  Api {
    status: u16,
    message: String,
    code: Option<String>,
  },

  /// A 2xx JSON body that does not match the declared response shape.
  #[error("Failed to decode response: {0}")]
  Decode(String),

  /// Local persistence failed while preparing or finishing a request.
  #[error("Local storage error: {0}")]
  Storage(String),
}

impl ApiError {
  pub fn auth() -> Self {
    ApiError::Auth {
      message: SESSION_EXPIRED_MESSAGE.to_string(),
    }
  }

  pub fn network() -> Self {
    ApiError::Api {
      status: 0,
      message: NETWORK_MESSAGE.to_string(),
      code: None,
    }
  }

  pub fn status(&self) -> Option<u16> {
    match self {
      ApiError::Auth { .. } => Some(401),
      ApiError::Api { status, .. } => Some(*status),
      _ => None,
    }
  }

  pub fn code(&self) -> Option<&str> {
    match self {
      ApiError::Api { code, .. } => code.as_deref(),
      _ => None,
    }
  }

  pub fn is_auth(&self) -> bool {
    matches!(self, ApiError::Auth { .. })
  }

  pub fn is_network(&self) -> bool {
    matches!(self, ApiError::Api { status: 0, .. })
  }

  /// Whether an automatic retry can change the outcome.
  ///
  /// Connectivity failures, throttling and server-side errors qualify.
  /// Auth failures never do: local state is already gone.
  pub fn is_retryable(&self) -> bool {
    match self {
      ApiError::Api { status, .. } => {
        *status == 0 || *status == 408 || *status == 429 || *status >= 500
      }
      _ => false,
    }
  }
}

impl From<StorageError> for ApiError {
  fn from(err: StorageError) -> Self {
    ApiError::Storage(err.to_string())
  }
}

/// Failure of the local persisted state.
#[derive(Debug, Error)]
pub enum StorageError {
  #[error("Failed to open storage at {path}: {source}")]
  Open {
    path: String,
    #[source]
    source: rusqlite::Error,
  },

  #[error("Storage query failed: {0}")]
  Query(#[from] rusqlite::Error),

  #[error("Failed to create storage directory: {0}")]
  Io(#[from] std::io::Error),

  #[error("Failed to serialize value for {key}: {source}")]
  Serialize {
    key: &'static str,
    #[source]
    source: serde_json::Error,
  },

  #[error("Lock poisoned: {0}")]
  Poisoned(String),

  #[error("Could not determine data directory")]
  NoDataDir,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_network_error_has_status_zero() {
    let err = ApiError::network();
    assert_eq!(err.status(), Some(0));
    assert!(err.is_network());
    assert!(err.is_retryable());
  }

  #[test]
  fn test_auth_is_never_retryable() {
    assert!(!ApiError::auth().is_retryable());
    assert!(ApiError::auth().is_auth());
  }

  #[test]
  fn test_client_errors_are_not_retryable() {
    let err = ApiError::Api {
      status: 422,
      message: "Invalid inventory".to_string(),
      code: Some("VALIDATION".to_string()),
    };
    assert!(!err.is_retryable());
    assert_eq!(err.code(), Some("VALIDATION"));

    let err = ApiError::Api {
      status: 503,
      message: "Unavailable".to_string(),
      code: None,
    };
    assert!(err.is_retryable());
  }
}
