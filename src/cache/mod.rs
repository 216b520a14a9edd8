//! Cache-coordinated query layer.
//!
//! Reads go through [`QueryClient`], which keys them with [`QueryKey`],
//! serves fresh values from the shared [`QueryCache`], de-duplicates
//! concurrent fetches and retries transient failures. Writes go through the
//! mutation helpers, which implement the optimistic snapshot/write/restore
//! protocol.

mod client;
mod infinite;
mod key;
mod mutation;
mod query;
mod retry;
mod store;
mod traits;

pub use client::QueryClient;
pub use infinite::{InfiniteData, InfiniteQuery};
pub use key::{canonical_json, Family, Operation, QueryKey};
pub use query::{Query, QueryOptions, QueryState};
pub use retry::RetryPolicy;
pub use store::{EntryState, QueryCache, Snapshot};
pub use traits::{CacheResult, CacheSource, Cacheable};

use std::time::Duration;

/// Tunables shared by every query and mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
  pub query_retries: u32,
  pub mutation_retries: u32,
  /// Base delay of the exponential retry backoff
  pub retry_delay: Duration,
  /// How long an unused entry survives
  pub gc_time: Duration,
}

impl Default for CacheOptions {
  fn default() -> Self {
    Self {
      query_retries: 2,
      mutation_retries: 1,
      retry_delay: Duration::from_secs(1),
      gc_time: Duration::from_secs(5 * 60),
    }
  }
}

impl CacheOptions {
  /// No retries and no backoff; used by tests.
  pub fn without_retries() -> Self {
    Self {
      query_retries: 0,
      mutation_retries: 0,
      retry_delay: Duration::ZERO,
      ..Self::default()
    }
  }
}
