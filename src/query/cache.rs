//! Keyed async cache with staleness windows, request deduplication, and
//! stale-while-revalidate.
//!
//! Each map owns entries for one resource kind. A read within the staleness
//! window is served from memory. A stale entry is returned immediately while
//! a background task revalidates it. Concurrent reads for the same key share
//! a single underlying fetch; followers receive the leader's result over a
//! broadcast channel. Retryable (network) failures get one transparent
//! retry. Mut-driven invalidation simply removes entries, forcing the next
//! read over the network.

use dashmap::DashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

use crate::api::ApiError;

struct CacheEntry<V> {
    value: V,
    fetched_at: Instant,
    stale: bool,
}

impl<V> CacheEntry<V> {
    fn is_fresh(&self, ttl: Duration) -> bool {
        !self.stale && self.fetched_at.elapsed() < ttl
    }
}

type FlightMap<K, V> = DashMap<K, broadcast::Sender<Result<V, ApiError>>>;

/// Removes the in-flight marker if the leader never completed, so waiters
/// see a closed channel instead of hanging.
struct FlightGuard<'a, K: Eq + Hash, V> {
    map: &'a FlightMap<K, V>,
    key: Option<K>,
}

impl<K: Eq + Hash, V> Drop for FlightGuard<'_, K, V> {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.map.remove(&key);
        }
    }
}

pub(crate) struct CacheMap<K, V> {
    name: &'static str,
    ttl: Duration,
    entries: DashMap<K, CacheEntry<V>>,
    in_flight: FlightMap<K, V>,
    /// Bumped on every purge. A fetch started before a purge must not write
    /// its result back, or logged-out data would resurface.
    epoch: AtomicU64,
}

impl<K, V> CacheMap<K, V>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str, ttl: Duration) -> Self {
        Self {
            name,
            ttl,
            entries: DashMap::new(),
            in_flight: DashMap::new(),
            epoch: AtomicU64::new(0),
        }
    }

    /// Resolve `key`, going to the network only when there is no fresh
    /// cached value and no identical request already in flight.
    pub async fn get_or_fetch<F, Fut>(self: &Arc<Self>, key: K, fetch: F) -> Result<V, ApiError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<V, ApiError>> + Send + 'static,
    {
        if let Some(entry) = self.entries.get(&key) {
            let fresh = entry.is_fresh(self.ttl);
            let value = entry.value.clone();
            drop(entry);

            if fresh {
                tracing::debug!(cache = self.name, "cache hit");
                return Ok(value);
            }

            // Stale-while-revalidate: hand back the stale value now and
            // refresh behind the caller's back.
            tracing::debug!(cache = self.name, "stale hit, revalidating in background");
            if !self.in_flight.contains_key(&key) {
                let this = Arc::clone(self);
                tokio::spawn(async move {
                    if let Err(err) = this.revalidate(key, &fetch).await {
                        tracing::warn!(cache = this.name, error = %err, "background revalidation failed");
                    }
                });
            }
            return Ok(value);
        }

        tracing::debug!(cache = self.name, "cache miss");
        self.revalidate(key, &fetch).await
    }

    /// Fetch `key` with singleflight semantics and store the result.
    async fn revalidate<F, Fut>(&self, key: K, fetch: &F) -> Result<V, ApiError>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<V, ApiError>> + Send,
    {
        let epoch = self.epoch.load(Ordering::Acquire);

        let waiter = match self.in_flight.entry(key.clone()) {
            dashmap::mapref::entry::Entry::Occupied(occupied) => Some(occupied.get().subscribe()),
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                let (tx, _) = broadcast::channel(1);
                vacant.insert(tx);
                None
            }
        };

        if let Some(mut rx) = waiter {
            tracing::debug!(cache = self.name, "joining in-flight request");
            match rx.recv().await {
                Ok(result) => return result,
                // The leader went away without answering; fetch ourselves.
                Err(_) => return self.fetch_and_store(key, fetch, epoch).await,
            }
        }

        let mut guard = FlightGuard {
            map: &self.in_flight,
            key: Some(key.clone()),
        };
        let result = self.fetch_and_store(key.clone(), fetch, epoch).await;
        if let Some((_, tx)) = self.in_flight.remove(&key) {
            guard.key = None;
            let _ = tx.send(result.clone());
        }
        result
    }

    async fn fetch_and_store<F, Fut>(&self, key: K, fetch: &F, epoch: u64) -> Result<V, ApiError>
    where
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<V, ApiError>> + Send,
    {
        let result = match fetch().await {
            Err(err) if err.is_retryable() => {
                tracing::debug!(cache = self.name, error = %err, "read failed, retrying once");
                fetch().await
            }
            other => other,
        };

        if let Ok(value) = &result {
            if self.epoch.load(Ordering::Acquire) == epoch {
                self.entries.insert(
                    key,
                    CacheEntry {
                        value: value.clone(),
                        fetched_at: Instant::now(),
                        stale: false,
                    },
                );
            } else {
                tracing::debug!(cache = self.name, "cache purged mid-fetch, result not stored");
            }
        }
        result
    }

    /// Drop one key, forcing the next read over the network.
    pub fn invalidate(&self, key: &K) {
        self.entries.remove(key);
    }

    /// Drop every key.
    pub fn invalidate_all(&self) {
        self.entries.clear();
    }

    /// Keep entries but mark them stale so the next read serves-then-refreshes.
    pub fn mark_all_stale(&self) {
        self.entries.alter_all(|_, mut entry| {
            entry.stale = true;
            entry
        });
    }

    /// Purge everything and fence out in-flight writers.
    pub fn clear(&self) {
        self.epoch.fetch_add(1, Ordering::Release);
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
