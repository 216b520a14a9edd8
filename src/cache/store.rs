//! The shared in-memory query cache.
//!
//! Every entry is addressed by a [`QueryKey`]. Screen-facing code never
//! writes entries directly: values land through committed fetches, the
//! optimistic write/restore pair, or invalidation.

use futures::future::{BoxFuture, Shared};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

use super::key::QueryKey;
use crate::error::ApiError;

/// A fetch that any number of readers may await.
pub type FetchFuture = Shared<BoxFuture<'static, Result<Value, ApiError>>>;

struct InFlight {
  generation: u64,
  future: FetchFuture,
}

struct Entry {
  description: String,
  value: Option<Value>,
  updated_at: Option<Instant>,
  invalidated: bool,
  /// Bumped on cancel/invalidate; a fetch only commits if it still matches.
  generation: u64,
  in_flight: Option<InFlight>,
  last_accessed: Instant,
  pending_mutations: u32,
  last_error: Option<ApiError>,
}

impl Entry {
  fn new(key: &QueryKey) -> Self {
    Self {
      description: key.description(),
      value: None,
      updated_at: None,
      invalidated: false,
      generation: 0,
      in_flight: None,
      last_accessed: Instant::now(),
      pending_mutations: 0,
      last_error: None,
    }
  }

  fn is_fresh(&self, stale_time: Duration) -> bool {
    match (&self.value, self.updated_at) {
      (Some(_), Some(at)) => !self.invalidated && at.elapsed() < stale_time,
      _ => false,
    }
  }

  fn cancel(&mut self) {
    self.generation += 1;
    self.in_flight = None;
  }
}

/// Outcome of [`QueryCache::lookup_or_start`].
pub enum Lookup {
  Fresh(Value),
  /// Joined a fetch somebody else started
  Joined(FetchFuture),
  /// Started a new fetch; the caller must drive it
  Started(FetchFuture),
}

/// Point-in-time view of one entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryState {
  pub has_value: bool,
  pub invalidated: bool,
  pub fetching: bool,
  pub pending_mutations: u32,
  pub updated_at: Option<Instant>,
  pub last_error: Option<ApiError>,
}

/// Pre-mutation state of one entry, taken by [`QueryCache::apply_optimistic`].
#[derive(Debug, Clone)]
pub struct Snapshot {
  hash: String,
  description: String,
  previous: Option<Value>,
  previous_updated_at: Option<Instant>,
}

impl Snapshot {
  pub fn previous(&self) -> Option<&Value> {
    self.previous.as_ref()
  }
}

#[derive(Clone, Default)]
pub struct QueryCache {
  entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl QueryCache {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
    // Entries stay consistent under every panic point, so a poisoned map is still usable.
    self.entries.lock().unwrap_or_else(|e| e.into_inner())
  }

  /// Return a fresh value, join the in-flight fetch, or start a new one.
  ///
  /// `start` receives the generation the new fetch must commit under. With
  /// `force` set, any in-flight fetch is abandoned and a new one started.
  pub fn lookup_or_start(
    &self,
    key: &QueryKey,
    stale_time: Duration,
    force: bool,
    start: impl FnOnce(u64) -> FetchFuture,
  ) -> Lookup {
    let mut entries = self.lock();
    let entry = entries
      .entry(key.cache_hash())
      .or_insert_with(|| Entry::new(key));
    entry.last_accessed = Instant::now();

    if !force {
      if entry.is_fresh(stale_time) {
        if let Some(value) = &entry.value {
          trace!(key = %entry.description, "cache hit");
          return Lookup::Fresh(value.clone());
        }
      }
      if let Some(in_flight) = &entry.in_flight {
        trace!(key = %entry.description, "joining in-flight fetch");
        return Lookup::Joined(in_flight.future.clone());
      }
    } else if entry.in_flight.is_some() {
      entry.cancel();
    }

    let generation = entry.generation;
    let future = start(generation);
    entry.in_flight = Some(InFlight {
      generation,
      future: future.clone(),
    });
    debug!(key = %entry.description, generation, "fetch started");
    Lookup::Started(future)
  }

  /// Record a fetch result. Ignored if the fetch was cancelled or
  /// invalidated after it started.
  ///
  /// Data is not written while an optimistic mutation on the entry is
  /// pending, so a background refetch can't clobber the speculative value.
  pub fn commit(&self, key: &QueryKey, generation: u64, result: &Result<Value, ApiError>) -> bool {
    let mut entries = self.lock();
    let Some(entry) = entries.get_mut(&key.cache_hash()) else {
      return false;
    };
    if entry.generation != generation {
      debug!(key = %entry.description, generation, "discarding result of cancelled fetch");
      return false;
    }
    if matches!(&entry.in_flight, Some(f) if f.generation == generation) {
      entry.in_flight = None;
    }

    match result {
      Ok(value) => {
        if entry.pending_mutations > 0 {
          debug!(key = %entry.description, "mutation pending, keeping optimistic value");
          return false;
        }
        entry.value = Some(value.clone());
        entry.updated_at = Some(Instant::now());
        entry.invalidated = false;
        entry.last_error = None;
      }
      Err(e) => {
        entry.last_error = Some(e.clone());
      }
    }
    true
  }

  /// Current value, if any.
  pub fn get(&self, key: &QueryKey) -> Option<Value> {
    let mut entries = self.lock();
    let entry = entries.get_mut(&key.cache_hash())?;
    entry.last_accessed = Instant::now();
    entry.value.clone()
  }

  /// Typed read; a value that no longer matches `T` reads as absent.
  pub fn get_as<T: DeserializeOwned>(&self, key: &QueryKey) -> Option<T> {
    self
      .get(key)
      .and_then(|value| serde_json::from_value(value).ok())
  }

  pub fn state(&self, key: &QueryKey) -> Option<EntryState> {
    let entries = self.lock();
    entries.get(&key.cache_hash()).map(|entry| EntryState {
      has_value: entry.value.is_some(),
      invalidated: entry.invalidated,
      fetching: entry.in_flight.is_some(),
      pending_mutations: entry.pending_mutations,
      updated_at: entry.updated_at,
      last_error: entry.last_error.clone(),
    })
  }

  pub fn is_fresh(&self, key: &QueryKey, stale_time: Duration) -> bool {
    let entries = self.lock();
    entries
      .get(&key.cache_hash())
      .map(|entry| entry.is_fresh(stale_time))
      .unwrap_or(false)
  }

  /// Patch an existing value in place with server-confirmed data.
  ///
  /// Returns `false` when there is nothing cached under `key`.
  pub fn update<T, F>(&self, key: &QueryKey, patch: F) -> Result<bool, ApiError>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce(&mut T),
  {
    let mut entries = self.lock();
    let Some(entry) = entries.get_mut(&key.cache_hash()) else {
      return Ok(false);
    };
    let Some(value) = entry.value.take() else {
      return Ok(false);
    };
    let patched = patch_value(value.clone(), patch);
    match patched {
      Ok(patched) => {
        entry.value = Some(patched);
        Ok(true)
      }
      Err(e) => {
        entry.value = Some(value);
        Err(e)
      }
    }
  }

  /// Snapshot the entry and write the speculative value, under one lock.
  ///
  /// Any in-flight read of the entry is cancelled first. Snapshots of
  /// concurrent mutations chain: each one sees the previous one's write.
  pub fn apply_optimistic<T, F>(&self, key: &QueryKey, patch: F) -> Result<Snapshot, ApiError>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce(&mut T),
  {
    let mut entries = self.lock();
    let hash = key.cache_hash();
    let entry = entries.entry(hash.clone()).or_insert_with(|| Entry::new(key));
    entry.cancel();

    let snapshot = Snapshot {
      hash,
      description: entry.description.clone(),
      previous: entry.value.clone(),
      previous_updated_at: entry.updated_at,
    };

    if let Some(value) = entry.value.clone() {
      entry.value = Some(patch_value(value, patch)?);
    }
    entry.pending_mutations += 1;
    debug!(key = %entry.description, "optimistic write applied");
    Ok(snapshot)
  }

  /// Put back exactly what the snapshot saw. A snapshot of an empty entry
  /// leaves the entry as it is.
  pub fn restore(&self, snapshot: Snapshot) {
    let mut entries = self.lock();
    let Some(entry) = entries.get_mut(&snapshot.hash) else {
      return;
    };
    entry.pending_mutations = entry.pending_mutations.saturating_sub(1);
    if let Some(previous) = snapshot.previous {
      entry.value = Some(previous);
      entry.updated_at = snapshot.previous_updated_at;
      debug!(key = %snapshot.description, "optimistic write rolled back");
    }
  }

  /// Finish a successful optimistic mutation, applying server-confirmed
  /// fields only when no other mutation on the entry is still pending.
  pub fn settle<T, F>(&self, snapshot: Snapshot, confirm: F) -> Result<(), ApiError>
  where
    T: Serialize + DeserializeOwned,
    F: FnOnce(&mut T),
  {
    let mut entries = self.lock();
    let Some(entry) = entries.get_mut(&snapshot.hash) else {
      return Ok(());
    };
    entry.pending_mutations = entry.pending_mutations.saturating_sub(1);
    if entry.pending_mutations > 0 {
      return Ok(());
    }
    if let Some(value) = entry.value.clone() {
      entry.value = Some(patch_value(value, confirm)?);
    }
    Ok(())
  }

  /// Mark an entry stale and abandon its in-flight fetch. The value stays
  /// readable until the next fetch replaces it.
  pub fn invalidate(&self, key: &QueryKey) {
    let mut entries = self.lock();
    if let Some(entry) = entries.get_mut(&key.cache_hash()) {
      entry.invalidated = true;
      entry.cancel();
      debug!(key = %entry.description, "invalidated");
    }
  }

  /// Ignore the result of any in-flight fetch for `key`.
  pub fn cancel(&self, key: &QueryKey) {
    let mut entries = self.lock();
    if let Some(entry) = entries.get_mut(&key.cache_hash()) {
      entry.cancel();
    }
  }

  pub fn clear(&self) {
    let mut entries = self.lock();
    let count = entries.len();
    entries.clear();
    debug!(count, "query cache cleared");
  }

  /// Evict entries idle for longer than `max_idle` with nothing in flight.
  pub fn gc(&self, max_idle: Duration) -> usize {
    let mut entries = self.lock();
    let before = entries.len();
    entries.retain(|_, entry| {
      entry.in_flight.is_some()
        || entry.pending_mutations > 0
        || entry.last_accessed.elapsed() < max_idle
    });
    let evicted = before - entries.len();
    if evicted > 0 {
      debug!(evicted, "evicted idle cache entries");
    }
    evicted
  }

  pub fn len(&self) -> usize {
    self.lock().len()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}

fn patch_value<T, F>(value: Value, patch: F) -> Result<Value, ApiError>
where
  T: Serialize + DeserializeOwned,
  F: FnOnce(&mut T),
{
  let mut typed: T = serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))?;
  patch(&mut typed);
  serde_json::to_value(&typed).map_err(|e| ApiError::Decode(e.to_string()))
}
