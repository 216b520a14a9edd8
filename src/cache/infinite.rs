//! Paginated lists accumulated page by page in one cache entry.
//!
//! Pages are requested strictly forward: page N+1 is only requested after
//! page N has been merged, and never while another fetch for the same key
//! is in flight. The merged item list is a fold over the pages in request
//! order.

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::client::QueryClient;
use super::key::QueryKey;
use super::traits::Cacheable;
use crate::api::types::ListPage;
use crate::error::ApiError;

/// Pages fetched so far, with the page number each one was requested with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfiniteData<T, S> {
  pub pages: Vec<ListPage<T, S>>,
  pub page_params: Vec<u32>,
}

impl<T, S> Default for InfiniteData<T, S> {
  fn default() -> Self {
    Self {
      pages: Vec::new(),
      page_params: Vec::new(),
    }
  }
}

impl<T: Cacheable, S: Clone> InfiniteData<T, S> {
  /// Page to request next, if the last page reports more.
  pub fn next_page_param(&self) -> Option<u32> {
    let last = self.pages.last()?;
    let requested = self.page_params.last().copied().unwrap_or(0);
    let next = last.pagination.page + 1;
    (last.pagination.has_next() && next > requested).then_some(next)
  }

  pub fn has_next_page(&self) -> bool {
    self.next_page_param().is_some()
  }

  /// Items of every page in order. An item repeated on a later page
  /// (shifted by inserts on the server) keeps its first position.
  pub fn items(&self) -> Vec<T> {
    let mut seen = HashSet::new();
    self
      .pages
      .iter()
      .flat_map(|page| page.items.iter())
      .filter(|item| seen.insert(item.cache_key()))
      .cloned()
      .collect()
  }

  /// Aggregates travel with the first page only.
  pub fn stats(&self) -> Option<&S> {
    self.pages.first().and_then(|page| page.stats.as_ref())
  }

  /// Total reported by the most recent page.
  pub fn total(&self) -> Option<u64> {
    self.pages.last().map(|page| page.pagination.total)
  }

  fn push(&mut self, param: u32, page: ListPage<T, S>) {
    self.page_params.push(param);
    self.pages.push(page);
  }
}

type PageFetcher<T, S> =
  Arc<dyn Fn(u32) -> BoxFuture<'static, Result<ListPage<T, S>, ApiError>> + Send + Sync>;

pub struct InfiniteQuery<T, S> {
  client: QueryClient,
  key: QueryKey,
  stale_time: Duration,
  fetch_page: PageFetcher<T, S>,
}

impl<T, S> Clone for InfiniteQuery<T, S> {
  fn clone(&self) -> Self {
    Self {
      client: self.client.clone(),
      key: self.key.clone(),
      stale_time: self.stale_time,
      fetch_page: self.fetch_page.clone(),
    }
  }
}

impl<T, S> InfiniteQuery<T, S>
where
  T: Cacheable + 'static,
  S: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
  /// `key` is epoch-bound: a refresh trigger for its family restarts the
  /// sequence at page 1.
  pub fn new<F, Fut>(client: QueryClient, key: QueryKey, stale_time: Duration, fetch_page: F) -> Self
  where
    F: Fn(u32) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ListPage<T, S>, ApiError>> + Send + 'static,
  {
    Self {
      client,
      key,
      stale_time,
      fetch_page: Arc::new(move |page| fetch_page(page).boxed()),
    }
  }

  pub fn key(&self) -> QueryKey {
    self.client.with_epoch(self.key.clone())
  }

  /// Cached pages, if any.
  pub fn data(&self) -> Option<InfiniteData<T, S>> {
    self.client.cache().get_as(&self.key())
  }

  pub fn items(&self) -> Vec<T> {
    self.data().map(|data| data.items()).unwrap_or_default()
  }

  pub fn has_next_page(&self) -> bool {
    self.data().map(|data| data.has_next_page()).unwrap_or(false)
  }

  pub fn is_fetching(&self) -> bool {
    self
      .client
      .cache()
      .state(&self.key())
      .map(|state| state.fetching)
      .unwrap_or(false)
  }

  /// Load page 1, or revalidate every loaded page in order when the cached
  /// sequence is stale.
  pub async fn fetch(&self) -> Result<InfiniteData<T, S>, ApiError> {
    self.load(false).await
  }

  /// Revalidate every loaded page, fresh or not.
  pub async fn refetch(&self) -> Result<InfiniteData<T, S>, ApiError> {
    self.load(true).await
  }

  async fn load(&self, force: bool) -> Result<InfiniteData<T, S>, ApiError> {
    let key = self.key();
    let loaded = self
      .client
      .cache()
      .get_as::<InfiniteData<T, S>>(&key)
      .map(|data| data.page_params)
      .unwrap_or_default();
    let fetch_page = self.fetch_page.clone();

    let result = self
      .client
      .fetch(&key, self.stale_time, force, move || {
        let fetch_page = fetch_page.clone();
        let params = if loaded.is_empty() { vec![1] } else { loaded.clone() };
        async move {
          let mut data = InfiniteData::default();
          for param in params {
            let page = fetch_page(param).await?;
            let more = page.pagination.has_next();
            data.push(param, page);
            if !more {
              break;
            }
          }
          Ok(data)
        }
      })
      .await?;
    Ok(result.data)
  }

  /// Append the next page.
  ///
  /// Returns `false` without a request when the last page reports no more
  /// or a fetch for this list is already in flight.
  pub async fn fetch_next_page(&self) -> Result<bool, ApiError> {
    let key = self.key();
    let Some(current) = self.client.cache().get_as::<InfiniteData<T, S>>(&key) else {
      self.fetch().await?;
      return Ok(true);
    };
    if self.is_fetching() {
      debug!(key = %key.description(), "page fetch already in flight");
      return Ok(false);
    }
    let Some(next) = current.next_page_param() else {
      return Ok(false);
    };

    let fetch_page = self.fetch_page.clone();
    self
      .client
      .fetch(&key, Duration::ZERO, false, move || {
        let mut data = current.clone();
        let request = fetch_page(next);
        async move {
          let page = request.await?;
          data.push(next, page);
          Ok(data)
        }
      })
      .await?;
    debug!(key = %key.description(), page = next, item_type = T::entity_type(), "page appended");
    Ok(true)
  }
}
