//! A small TTL cache with remember-or-compute semantics.
//!
//! Concurrent misses for the same key may both run the computation; last
//! writer wins. The read path never holds a map guard across an await.

use std::{
  future::Future,
  hash::Hash,
  time::{Duration, Instant},
};

use dashmap::DashMap;

#[derive(Debug, Clone)]
struct Entry<V> {
  stored_at: Instant,
  ttl:       Duration,
  value:     V,
}

impl<V> Entry<V> {
  fn is_fresh(&self) -> bool { self.stored_at.elapsed() < self.ttl }
}

/// Keyed TTL cache.
pub struct TtlCache<K, V> {
  entries: DashMap<K, Entry<V>>,
}

impl<K, V> TtlCache<K, V>
where
  K: Eq + Hash + Clone,
  V: Clone,
{
  pub fn new() -> Self { Self { entries: DashMap::new() } }

  /// Return the cached value for `key` if still fresh, otherwise run
  /// `compute`, store its result under `ttl`, and return it.
  pub async fn remember<E, F, Fut>(
    &self,
    key: K,
    ttl: Duration,
    compute: F,
  ) -> Result<V, E>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, E>>,
  {
    if let Some(entry) = self.entries.get(&key)
      && entry.is_fresh()
    {
      return Ok(entry.value.clone());
    }

    let value = compute().await?;
    self.entries.insert(
      key,
      Entry { stored_at: Instant::now(), ttl, value: value.clone() },
    );
    Ok(value)
  }

  /// Drop one key's entry, forcing the next `remember` to recompute.
  pub fn invalidate(&self, key: &K) { self.entries.remove(key); }

  /// Drop every entry.
  pub fn clear(&self) { self.entries.clear(); }
}
