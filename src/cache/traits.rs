//! Core traits and types for the caching system.

use serde::{de::DeserializeOwned, Serialize};

/// Trait for entities that can be cached.
///
/// Implementors provide an identity that is unique within the resource
/// family; paginated lists use it to drop duplicates when pages are merged.
pub trait Cacheable: Clone + Send + Sync + Serialize + DeserializeOwned {
  /// Unique identifier for this entity (e.g., order id)
  fn cache_key(&self) -> String;

  /// Entity type name for logs (e.g., "order", "product")
  fn entity_type() -> &'static str;
}

/// Result from a cache read, including data and where it came from.
#[derive(Debug, Clone)]
pub struct CacheResult<T> {
  /// The actual data
  pub data: T,
  /// Where the data came from
  pub source: CacheSource,
}

impl<T> CacheResult<T> {
  pub fn new(data: T, source: CacheSource) -> Self {
    Self { data, source }
  }
}

/// Indicates where cached data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  /// A network fetch started by this read
  Network,
  /// Another reader's in-flight fetch for the same key
  Shared,
  /// Data from cache, still within its staleness window
  CacheFresh,
}
