//! Writes and their effect on cached reads.

use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use tracing::{debug, warn};

use super::client::QueryClient;
use super::key::QueryKey;
use crate::error::ApiError;

impl QueryClient {
  /// Run a write with the mutation retry policy.
  ///
  /// A 401 resets the session and empties the cache, like it does for reads.
  pub async fn mutate<R, F, Fut>(&self, mutation: F) -> Result<R, ApiError>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<R, ApiError>>,
  {
    let result = self.mutation_retry().run(mutation).await;
    if let Err(e) = &result {
      if e.is_auth() {
        self.expire_session();
      }
    }
    result
  }

  /// Optimistic write against one cached entry.
  ///
  /// 1. cancel any in-flight read of `key`
  /// 2. snapshot the cached value
  /// 3. write `patch` into it before the request is sent
  /// 4. on failure restore the snapshot; on success apply `confirm` with the
  ///    server's response and bump the refresh epoch of the key's family
  ///
  /// Steps 1-3 happen before the first suspension point. When nothing is
  /// cached under `key` the write is skipped and only the request runs.
  pub async fn mutate_optimistic<T, R, P, F, Fut, C>(
    &self,
    key: &QueryKey,
    patch: P,
    mutation: F,
    confirm: C,
  ) -> Result<R, ApiError>
  where
    T: Serialize + DeserializeOwned,
    P: FnOnce(&mut T),
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<R, ApiError>>,
    C: FnOnce(&R, &mut T),
  {
    let snapshot = self.cache().apply_optimistic::<T, _>(key, patch)?;

    match self.mutate(mutation).await {
      Ok(response) => {
        if let Err(e) = self
          .cache()
          .settle::<T, _>(snapshot, |value| confirm(&response, value))
        {
          warn!(key = %key.description(), error = %e, "could not apply confirmed fields");
        }
        let epoch = self.session().trigger_refresh(key.family());
        debug!(key = %key.description(), epoch, "mutation confirmed");
        Ok(response)
      }
      Err(e) => {
        self.cache().restore(snapshot);
        warn!(key = %key.description(), error = %e, "mutation failed, optimistic write rolled back");
        Err(e)
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{CacheOptions, Family, Operation};
  use crate::session::Session;
  use crate::storage::AuthStorage;
  use serde::Deserialize;
  use serde_json::json;
  use std::sync::atomic::{AtomicU32, Ordering};
  use std::sync::Arc;
  use std::time::Duration;
  use tokio::sync::oneshot;

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  struct Detail {
    order: OrderDoc,
  }

  #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
  #[serde(rename_all = "camelCase")]
  struct OrderDoc {
    id: String,
    status: String,
    is_read: bool,
    total: f64,
  }

  fn client(options: CacheOptions) -> QueryClient {
    let session = Arc::new(Session::new(AuthStorage::in_memory()));
    QueryClient::new(session, options)
  }

  fn detail_key() -> QueryKey {
    QueryKey::new(Family::Orders, Operation::Detail("o1".into()))
  }

  async fn seeded(options: CacheOptions) -> QueryClient {
    let client = client(options);
    client
      .fetch_query(&detail_key(), Duration::from_secs(60), false, || async {
        Ok(json!({ "order": { "id": "o1", "status": "pending", "isRead": false, "total": 99.5 } }))
      })
      .await
      .unwrap();
    client
  }

  fn set_status(status: &'static str) -> impl FnOnce(&mut Detail) {
    move |d| d.order.status = status.to_string()
  }

  #[tokio::test]
  async fn test_failed_mutation_restores_snapshot_exactly() {
    let client = seeded(CacheOptions::without_retries()).await;
    let before = client.cache().get(&detail_key()).unwrap();

    let err = client
      .mutate_optimistic(
        &detail_key(),
        set_status("processing"),
        || async { Err::<(), _>(ApiError::network()) },
        |_, _: &mut Detail| {},
      )
      .await
      .unwrap_err();

    assert!(err.is_network());
    assert_eq!(client.cache().get(&detail_key()).unwrap(), before);
    assert_eq!(client.session().epoch(Family::Orders), 0);
  }

  #[tokio::test]
  async fn test_optimistic_value_is_visible_before_response() {
    let client = seeded(CacheOptions::without_retries()).await;
    let (release, gate) = oneshot::channel::<()>();

    let task = {
      let client = client.clone();
      tokio::spawn(async move {
        let mut gate = Some(gate);
        client
          .mutate_optimistic(
            &detail_key(),
            set_status("processing"),
            move || {
              let gate = gate.take();
              async move {
                if let Some(gate) = gate {
                  let _ = gate.await;
                }
                Ok::<_, ApiError>(json!({ "success": true }))
              }
            },
            |_, _: &mut Detail| {},
          )
          .await
      })
    };

    tokio::task::yield_now().await;
    let during: Detail = client.cache().get_as(&detail_key()).unwrap();
    assert_eq!(during.order.status, "processing");

    release.send(()).unwrap();
    task.await.unwrap().unwrap();

    let after: Detail = client.cache().get_as(&detail_key()).unwrap();
    assert_eq!(after.order.status, "processing");
    assert_eq!(client.session().epoch(Family::Orders), 1);
  }

  #[tokio::test]
  async fn test_confirmed_fields_replace_optimistic_ones() {
    let client = seeded(CacheOptions::without_retries()).await;

    client
      .mutate_optimistic(
        &detail_key(),
        |d: &mut Detail| d.order.total = 0.0,
        || async { Ok::<_, ApiError>(120.0_f64) },
        |total, d: &mut Detail| d.order.total = *total,
      )
      .await
      .unwrap();

    let after: Detail = client.cache().get_as(&detail_key()).unwrap();
    assert_eq!(after.order.total, 120.0);
  }

  #[tokio::test]
  async fn test_rollback_keeps_earlier_concurrent_write() {
    let client = seeded(CacheOptions::without_retries()).await;
    let (release_first, first_gate) = oneshot::channel::<()>();

    let first = {
      let client = client.clone();
      tokio::spawn(async move {
        let mut gate = Some(first_gate);
        client
          .mutate_optimistic(
            &detail_key(),
            |d: &mut Detail| d.order.is_read = true,
            move || {
              let gate = gate.take();
              async move {
                if let Some(gate) = gate {
                  let _ = gate.await;
                }
                Ok::<_, ApiError>(())
              }
            },
            |_, _| {},
          )
          .await
      })
    };
    tokio::task::yield_now().await;

    // Second mutation snapshots after the first one's write, then fails.
    let err = client
      .mutate_optimistic(
        &detail_key(),
        set_status("cancelled"),
        || async { Err::<(), _>(ApiError::network()) },
        |_, _: &mut Detail| {},
      )
      .await
      .unwrap_err();
    assert!(err.is_network());

    let after: Detail = client.cache().get_as(&detail_key()).unwrap();
    assert!(after.order.is_read);
    assert_eq!(after.order.status, "pending");

    release_first.send(()).unwrap();
    first.await.unwrap().unwrap();
  }

  #[tokio::test]
  async fn test_mutation_cancels_in_flight_read() {
    let client = seeded(CacheOptions::without_retries()).await;
    let (release, gate) = oneshot::channel::<()>();

    // Background refetch that will answer with stale data.
    let read = {
      let client = client.clone();
      let gate = Arc::new(tokio::sync::Mutex::new(Some(gate)));
      tokio::spawn(async move {
        client
          .fetch_query(&detail_key(), Duration::ZERO, true, move || {
            let gate = gate.clone();
            async move {
              if let Some(gate) = gate.lock().await.take() {
                let _ = gate.await;
              }
              Ok(json!({ "order": { "id": "o1", "status": "pending", "isRead": false, "total": 99.5 } }))
            }
          })
          .await
      })
    };
    tokio::task::yield_now().await;

    client
      .mutate_optimistic(
        &detail_key(),
        set_status("shipped"),
        || async { Ok::<_, ApiError>(()) },
        |_, _: &mut Detail| {},
      )
      .await
      .unwrap();

    release.send(()).unwrap();
    let _ = read.await.unwrap();

    let after: Detail = client.cache().get_as(&detail_key()).unwrap();
    assert_eq!(after.order.status, "shipped");
  }

  #[tokio::test(start_paused = true)]
  async fn test_mutation_retries_once_but_never_on_auth() {
    let client = client(CacheOptions::default());
    let calls = Arc::new(AtomicU32::new(0));

    let counter = calls.clone();
    let result = client
      .mutate(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Err::<(), _>(ApiError::network()) }
      })
      .await;
    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    calls.store(0, Ordering::SeqCst);
    let counter = calls.clone();
    let result = client
      .mutate(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Err::<(), _>(ApiError::auth()) }
      })
      .await;
    assert!(result.unwrap_err().is_auth());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }
}
