//! Observer over one cached read, for event-loop style consumers.
//!
//! Inspired by TanStack Query, a `Query<T>` tracks loading, success and
//! error states for one [`QueryKey`] while the data itself lives in the
//! shared cache.
//!
//! # Example
//!
//! ```ignore
//! let mut query = storefront.orders().stats_query();
//!
//! // Start fetching
//! query.fetch();
//!
//! // In event loop tick
//! if query.tick() {
//!     // State changed, redraw
//! }
//!
//! match query.state() {
//!     QueryState::Loading { .. } => render_spinner(),
//!     QueryState::Success(stats) => render_stats(stats),
//!     QueryState::Error { error, data } => render_error(error, data.as_ref()),
//!     QueryState::Idle => {}
//! }
//! ```

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;

use super::client::QueryClient;
use super::key::QueryKey;
use super::traits::CacheResult;
use crate::error::ApiError;

/// The state of a query
#[derive(Debug, Clone, PartialEq)]
pub enum QueryState<T> {
  /// Query has not been started, or is disabled
  Idle,
  /// Query is fetching; `data` is what was cached before
  Loading { data: Option<T> },
  /// Query completed successfully
  Success(T),
  /// Query failed; the last good value stays available
  Error { error: ApiError, data: Option<T> },
}

impl<T> QueryState<T> {
  pub fn is_loading(&self) -> bool {
    matches!(self, QueryState::Loading { .. })
  }

  pub fn is_success(&self) -> bool {
    matches!(self, QueryState::Success(_))
  }

  pub fn is_error(&self) -> bool {
    matches!(self, QueryState::Error { .. })
  }

  pub fn data(&self) -> Option<&T> {
    match self {
      QueryState::Success(data) => Some(data),
      QueryState::Loading { data } | QueryState::Error { data, .. } => data.as_ref(),
      QueryState::Idle => None,
    }
  }

  pub fn error(&self) -> Option<&ApiError> {
    match self {
      QueryState::Error { error, .. } => Some(error),
      _ => None,
    }
  }

  fn into_data(self) -> Option<T> {
    match self {
      QueryState::Success(data) => Some(data),
      QueryState::Loading { data } | QueryState::Error { data, .. } => data,
      QueryState::Idle => None,
    }
  }
}

/// Per-query behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryOptions {
  /// Age after which the cached value is refetched on the next read
  pub stale_time: Duration,
  /// A disabled query never issues a request
  pub enabled: bool,
  /// Refetch on `tick()` this often, fresh or not
  pub refetch_interval: Option<Duration>,
}

impl Default for QueryOptions {
  fn default() -> Self {
    Self {
      stale_time: Duration::ZERO,
      enabled: true,
      refetch_interval: None,
    }
  }
}

impl QueryOptions {
  pub fn stale_after(stale_time: Duration) -> Self {
    Self {
      stale_time,
      ..Self::default()
    }
  }

  pub fn enabled(mut self, enabled: bool) -> Self {
    self.enabled = enabled;
    self
  }

  pub fn refetch_every(mut self, interval: Duration) -> Self {
    self.refetch_interval = Some(interval);
    self
  }
}

/// A factory function that creates futures for fetching data
type FetcherFn<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, ApiError>> + Send + Sync>;

type Outcome<T> = Result<CacheResult<T>, ApiError>;

/// Async query for data fetching with state management.
pub struct Query<T> {
  client: QueryClient,
  key: QueryKey,
  epoch_bound: bool,
  fetcher: FetcherFn<T>,
  options: QueryOptions,
  state: QueryState<T>,
  receiver: Option<oneshot::Receiver<Outcome<T>>>,
  /// Key the current state belongs to
  active_key: Option<QueryKey>,
  /// Start of the last read, successful or not; the refetch interval runs from here
  attempted_at: Option<Instant>,
}

impl<T> Query<T>
where
  T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
  /// Create a new query for `key`. The fetcher is called each time the
  /// cache decides a request is needed.
  pub fn new<F, Fut>(client: QueryClient, key: QueryKey, options: QueryOptions, fetcher: F) -> Self
  where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
  {
    Self {
      client,
      key,
      epoch_bound: false,
      fetcher: Arc::new(move || fetcher().boxed()),
      options,
      state: QueryState::Idle,
      receiver: None,
      active_key: None,
      attempted_at: None,
    }
  }

  /// Fold the family's refresh epoch into the key at every read, so a
  /// refresh trigger moves the query onto a fresh cache entry.
  pub fn epoch_bound(mut self) -> Self {
    self.epoch_bound = true;
    self
  }

  /// The key a read would use right now.
  pub fn key(&self) -> QueryKey {
    if self.epoch_bound {
      self.client.with_epoch(self.key.clone())
    } else {
      self.key.clone()
    }
  }

  pub fn options(&self) -> &QueryOptions {
    &self.options
  }

  pub fn state(&self) -> &QueryState<T> {
    &self.state
  }

  pub fn data(&self) -> Option<&T> {
    self.state.data()
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  pub fn is_success(&self) -> bool {
    self.state.is_success()
  }

  pub fn is_error(&self) -> bool {
    self.state.is_error()
  }

  pub fn error(&self) -> Option<&ApiError> {
    self.state.error()
  }

  /// True when the next `fetch()` would go to the network.
  pub fn is_stale(&self) -> bool {
    !self.client.cache().is_fresh(&self.key(), self.options.stale_time)
  }

  /// Start fetching unless disabled or already loading. A fresh cached
  /// value resolves immediately without a request.
  pub fn fetch(&mut self) {
    if !self.options.enabled || self.state.is_loading() {
      return;
    }
    self.start_fetch(false);
  }

  /// Fetch even if the cached value is fresh, abandoning a pending fetch.
  pub fn refetch(&mut self) {
    if !self.options.enabled {
      return;
    }
    self.receiver = None;
    self.start_fetch(true);
  }

  /// Poll for results from a pending fetch.
  ///
  /// Returns `true` if the state changed.
  pub fn poll(&mut self) -> bool {
    let Some(receiver) = &mut self.receiver else {
      return false;
    };
    match receiver.try_recv() {
      Ok(outcome) => {
        self.receiver = None;
        self.resolve(outcome);
        true
      }
      Err(oneshot::error::TryRecvError::Empty) => false,
      Err(oneshot::error::TryRecvError::Closed) => {
        self.receiver = None;
        self.abandon();
        true
      }
    }
  }

  /// Wait for the pending fetch, if any, and apply its result.
  pub async fn settled(&mut self) -> &QueryState<T> {
    if let Some(receiver) = self.receiver.take() {
      match receiver.await {
        Ok(outcome) => self.resolve(outcome),
        Err(_) => self.abandon(),
      }
    }
    &self.state
  }

  /// Event-loop hook.
  ///
  /// Picks up fetch results, follows key changes (refresh epochs),
  /// invalidation and the refetch interval, and reflects writes made to the
  /// cache by mutations. Returns `true` if the state changed.
  ///
  /// After a failed read only a key change, the next interval or an explicit
  /// `refetch()` issues another request.
  pub fn tick(&mut self) -> bool {
    if !self.options.enabled {
      return false;
    }
    if self.state.is_loading() {
      return self.poll();
    }
    let Some(active_key) = self.active_key.clone() else {
      return false;
    };

    let key = self.key();
    let invalidated = self
      .client
      .cache()
      .state(&key)
      .map(|s| s.invalidated)
      .unwrap_or(false);
    let interval_due = match (self.options.refetch_interval, self.attempted_at) {
      (Some(interval), Some(at)) => at.elapsed() >= interval,
      _ => false,
    };

    if key != active_key || (invalidated && !self.state.is_error()) {
      self.start_fetch(false);
      return true;
    }
    if interval_due {
      self.start_fetch(true);
      return true;
    }
    self.sync_from_cache()
  }

  fn start_fetch(&mut self, force: bool) {
    let key = self.key();
    self.active_key = Some(key.clone());
    self.attempted_at = Some(Instant::now());
    let previous = std::mem::replace(&mut self.state, QueryState::Idle).into_data();

    if !force && self.client.cache().is_fresh(&key, self.options.stale_time) {
      if let Some(data) = self.client.cache().get_as::<T>(&key) {
        self.state = QueryState::Success(data);
        return;
      }
    }

    let data = self.client.cache().get_as::<T>(&key).or(previous);
    self.state = QueryState::Loading { data };

    let (tx, rx) = oneshot::channel();
    self.receiver = Some(rx);

    let client = self.client.clone();
    let fetcher = self.fetcher.clone();
    let stale_time = self.options.stale_time;
    tokio::spawn(async move {
      let result = client
        .fetch(&key, stale_time, force, move || fetcher())
        .await;
      // Ignore send errors - receiver may have been dropped
      let _ = tx.send(result);
    });
  }

  fn resolve(&mut self, outcome: Outcome<T>) {
    let previous = std::mem::replace(&mut self.state, QueryState::Idle).into_data();
    self.state = match outcome {
      Ok(result) => QueryState::Success(result.data),
      Err(error) => QueryState::Error {
        error,
        data: previous,
      },
    };
  }

  fn abandon(&mut self) {
    let previous = std::mem::replace(&mut self.state, QueryState::Idle).into_data();
    if let Some(data) = previous {
      self.state = QueryState::Success(data);
    }
  }

  fn sync_from_cache(&mut self) -> bool {
    let Some(key) = &self.active_key else {
      return false;
    };
    let Some(cached) = self.client.cache().get(key) else {
      return false;
    };
    let current = self
      .state
      .data()
      .and_then(|data| serde_json::to_value(data).ok());
    if current.as_ref() == Some(&cached) {
      return false;
    }
    match serde_json::from_value::<T>(cached) {
      Ok(data) => {
        self.state = match std::mem::replace(&mut self.state, QueryState::Idle) {
          QueryState::Error { error, .. } => QueryState::Error {
            error,
            data: Some(data),
          },
          _ => QueryState::Success(data),
        };
        true
      }
      Err(_) => false,
    }
  }
}

// Query is not Clone because the receiver is owned.
// If you need to share a query, wrap it in Arc<Mutex<Query<T>>>.

impl<T: std::fmt::Debug> std::fmt::Debug for Query<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Query")
      .field("key", &self.key.description())
      .field("state", &self.state)
      .field("options", &self.options)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::{CacheOptions, Family, Operation};
  use crate::session::Session;
  use crate::storage::AuthStorage;
  use std::sync::atomic::{AtomicU32, Ordering};

  fn client() -> QueryClient {
    let session = Arc::new(Session::new(AuthStorage::in_memory()));
    QueryClient::new(session, CacheOptions::without_retries())
  }

  fn counter_query(client: &QueryClient, options: QueryOptions) -> (Arc<AtomicU32>, Query<u32>) {
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let query = Query::new(
      client.clone(),
      QueryKey::new(Family::Orders, Operation::Stats),
      options,
      move || {
        let counter = counter.clone();
        async move { Ok(counter.fetch_add(1, Ordering::SeqCst) + 1) }
      },
    );
    (calls, query)
  }

  #[tokio::test]
  async fn test_query_success() {
    let client = client();
    let (_, mut query) = counter_query(&client, QueryOptions::default());

    assert!(matches!(query.state(), QueryState::Idle));

    query.fetch();
    assert!(query.is_loading());

    query.settled().await;
    assert!(query.is_success());
    assert_eq!(query.data(), Some(&1));
  }

  #[tokio::test]
  async fn test_query_error_keeps_last_data() {
    let client = client();
    let (_, mut ok) = counter_query(&client, QueryOptions::default());
    ok.fetch();
    ok.settled().await;

    let mut failing: Query<u32> = Query::new(
      client.clone(),
      QueryKey::new(Family::Orders, Operation::Stats),
      QueryOptions::default(),
      || async { Err(ApiError::network()) },
    );
    failing.fetch();
    assert_eq!(failing.data(), Some(&1));
    failing.settled().await;

    assert!(failing.is_error());
    assert!(failing.error().unwrap().is_network());
    assert_eq!(failing.data(), Some(&1));
  }

  #[tokio::test]
  async fn test_fresh_cache_resolves_without_request() {
    let client = client();
    let options = QueryOptions::stale_after(Duration::from_secs(60));
    let (calls, mut first) = counter_query(&client, options);
    first.fetch();
    first.settled().await;

    let (other_calls, mut second) = counter_query(&client, options);
    second.fetch();
    assert!(second.is_success());
    assert_eq!(second.data(), Some(&1));
    assert!(!second.is_stale());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(other_calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn test_fetch_while_loading_is_noop() {
    let client = client();
    let (calls, mut query) = counter_query(&client, QueryOptions::default());

    query.fetch();
    query.fetch();
    query.settled().await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn test_refetch_ignores_freshness() {
    let client = client();
    let (calls, mut query) = counter_query(&client, QueryOptions::stale_after(Duration::from_secs(60)));

    query.fetch();
    query.settled().await;
    query.refetch();
    query.settled().await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(query.data(), Some(&2));
  }

  #[tokio::test]
  async fn test_disabled_query_never_fetches() {
    let client = client();
    let (calls, mut query) = counter_query(&client, QueryOptions::default().enabled(false));

    query.fetch();
    query.refetch();
    assert!(!query.tick());
    query.settled().await;

    assert!(matches!(query.state(), QueryState::Idle));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn test_epoch_bump_moves_to_new_key() {
    let client = client();
    let (calls, query) = counter_query(&client, QueryOptions::stale_after(Duration::from_secs(300)));
    let mut query = query.epoch_bound();

    query.fetch();
    query.settled().await;
    assert!(!query.tick());

    client.session().trigger_orders_refresh();
    assert!(query.is_stale());
    assert!(query.tick());
    query.settled().await;

    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(query.data(), Some(&2));
  }

  #[tokio::test]
  async fn test_invalidation_refetches_on_tick() {
    let client = client();
    let (calls, mut query) = counter_query(&client, QueryOptions::stale_after(Duration::from_secs(300)));

    query.fetch();
    query.settled().await;
    client.cache().invalidate(&query.key());

    assert!(query.tick());
    query.settled().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_refetch_interval() {
    let client = client();
    let options = QueryOptions::stale_after(Duration::from_secs(120)).refetch_every(Duration::from_secs(300));
    let (calls, mut query) = counter_query(&client, options);

    query.fetch();
    query.settled().await;

    tokio::time::advance(Duration::from_secs(200)).await;
    assert!(!query.tick());
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tokio::time::advance(Duration::from_secs(100)).await;
    assert!(query.tick());
    query.settled().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test]
  async fn test_failed_refetch_after_invalidation_is_not_retried_on_tick() {
    let client = client();
    let options = QueryOptions::stale_after(Duration::from_secs(300));
    let (_, mut seed) = counter_query(&client, options);
    seed.fetch();
    seed.settled().await;

    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let mut query: Query<u32> = Query::new(
      client.clone(),
      QueryKey::new(Family::Orders, Operation::Stats),
      options,
      move || {
        counter.fetch_add(1, Ordering::SeqCst);
        async { Err(ApiError::network()) }
      },
    );
    query.fetch();
    assert_eq!(query.data(), Some(&1));
    client.cache().invalidate(&query.key());

    for _ in 0..5 {
      query.tick();
      query.settled().await;
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(query.is_error());
    assert_eq!(query.data(), Some(&1));

    query.refetch();
    query.settled().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
  }

  #[tokio::test(start_paused = true)]
  async fn test_failed_interval_refetch_waits_for_next_interval() {
    let client = client();
    let calls = Arc::new(AtomicU32::new(0));
    let counter = calls.clone();
    let options = QueryOptions::stale_after(Duration::from_secs(120)).refetch_every(Duration::from_secs(300));
    let mut query: Query<u32> = Query::new(
      client.clone(),
      QueryKey::new(Family::Orders, Operation::Stats),
      options,
      move || {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        async move {
          if n == 1 {
            Ok(n)
          } else {
            Err(ApiError::network())
          }
        }
      },
    );
    query.fetch();
    query.settled().await;

    tokio::time::advance(Duration::from_secs(300)).await;
    assert!(query.tick());
    query.settled().await;
    assert!(query.is_error());
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    for _ in 0..5 {
      query.tick();
      query.settled().await;
    }
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    tokio::time::advance(Duration::from_secs(300)).await;
    assert!(query.tick());
    query.settled().await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(query.data(), Some(&1));
  }

  #[tokio::test]
  async fn test_tick_reflects_cache_writes() {
    let client = client();
    let (_, mut query) = counter_query(&client, QueryOptions::stale_after(Duration::from_secs(300)));
    query.fetch();
    query.settled().await;

    let snapshot = client
      .cache()
      .apply_optimistic::<u32, _>(&query.key(), |n| *n = 42)
      .unwrap();
    assert!(query.tick());
    assert_eq!(query.data(), Some(&42));

    client.cache().restore(snapshot);
    assert!(query.tick());
    assert_eq!(query.data(), Some(&1));
  }
}
