use futures::FutureExt;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use super::key::QueryKey;
use super::retry::RetryPolicy;
use super::store::{Lookup, QueryCache};
use super::traits::{CacheResult, CacheSource};
use super::CacheOptions;
use crate::error::ApiError;
use crate::session::Session;

/// Entry point of the query layer; cheap to clone.
#[derive(Clone)]
pub struct QueryClient {
  cache: QueryCache,
  session: Arc<Session>,
  options: CacheOptions,
}

impl QueryClient {
  pub fn new(session: Arc<Session>, options: CacheOptions) -> Self {
    Self {
      cache: QueryCache::new(),
      session,
      options,
    }
  }

  pub fn cache(&self) -> &QueryCache {
    &self.cache
  }

  pub fn session(&self) -> &Arc<Session> {
    &self.session
  }

  pub fn options(&self) -> &CacheOptions {
    &self.options
  }

  pub(crate) fn query_retry(&self) -> RetryPolicy {
    RetryPolicy::new(self.options.query_retries, self.options.retry_delay)
  }

  pub(crate) fn mutation_retry(&self) -> RetryPolicy {
    RetryPolicy::new(self.options.mutation_retries, self.options.retry_delay)
  }

  /// Fold the current refresh epoch of the key's family into `key`.
  pub fn with_epoch(&self, key: QueryKey) -> QueryKey {
    let epoch = self.session.epoch(key.family());
    key.with_epoch(epoch)
  }

  /// Sign-out side of a 401: reset the session and drop every cached read.
  pub(crate) fn expire_session(&self) {
    expire(&self.session, &self.cache);
  }

  /// Read `key` through the cache.
  ///
  /// A value younger than `stale_time` is returned without a request. A
  /// fetch already in flight for the key is joined rather than duplicated.
  /// `force` abandons any in-flight fetch and starts a new one.
  ///
  /// The returned value is the cache's view after the fetch settles, so an
  /// optimistic write made meanwhile stays visible.
  pub async fn fetch_query<F, Fut>(
    &self,
    key: &QueryKey,
    stale_time: Duration,
    force: bool,
    fetcher: F,
  ) -> Result<CacheResult<Value>, ApiError>
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, ApiError>> + Send + 'static,
  {
    self.cache.gc(self.options.gc_time);

    let policy = self.query_retry();
    let cache = self.cache.clone();
    let session = self.session.clone();
    let commit_key = key.clone();

    let lookup = self.cache.lookup_or_start(key, stale_time, force, move |generation| {
      async move {
        let result = policy.run(&fetcher).await;
        match &result {
          Err(e) if e.is_auth() => expire(&session, &cache),
          _ => {
            cache.commit(&commit_key, generation, &result);
          }
        }
        result
      }
      .boxed()
      .shared()
    });

    let (future, source) = match lookup {
      Lookup::Fresh(value) => return Ok(CacheResult::new(value, CacheSource::CacheFresh)),
      Lookup::Joined(future) => (future, CacheSource::Shared),
      Lookup::Started(future) => {
        // Runs to completion even if every reader goes away.
        tokio::spawn(future.clone());
        (future, CacheSource::Network)
      }
    };

    let fetched = future.await?;
    let value = self.cache.get(key).unwrap_or(fetched);
    Ok(CacheResult::new(value, source))
  }

  /// Typed form of [`fetch_query`](Self::fetch_query).
  pub async fn fetch<T, F, Fut>(
    &self,
    key: &QueryKey,
    stale_time: Duration,
    force: bool,
    fetcher: F,
  ) -> Result<CacheResult<T>, ApiError>
  where
    T: Serialize + DeserializeOwned + Send + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    let result = self
      .fetch_query(key, stale_time, force, move || {
        let request = fetcher();
        async move {
          let data = request.await?;
          serde_json::to_value(data).map_err(|e| ApiError::Decode(e.to_string()))
        }
      })
      .await?;

    let data = serde_json::from_value(result.data).map_err(|e| ApiError::Decode(e.to_string()))?;
    Ok(CacheResult::new(data, result.source))
  }

  /// Evict entries unused for longer than the configured GC time.
  pub fn gc(&self) -> usize {
    self.cache.gc(self.options.gc_time)
  }

  /// Drop every cached read.
  pub fn clear(&self) {
    self.cache.clear();
  }
}

fn expire(session: &Session, cache: &QueryCache) {
  warn!("request rejected as unauthenticated, resetting session");
  session.expire();
  cache.clear();
}
