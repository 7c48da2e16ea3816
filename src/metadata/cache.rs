//! In-memory response cache for metadata services.
//!
//! Caches catalogue responses per query so that resolving every file of a
//! season does not re-fetch the same episode list. Concurrent identical
//! queries share one in-flight fetch; failed fetches are not cached.

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::time::{Duration, Instant};

use animatch_common::{
    EpisodeId, EpisodeRecord, EpisodeType, RelatedSubject, Result, Subject, SubjectId,
};
use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::trace;

use crate::metadata::provider::MetadataService;

/// Entry in a response cache.
struct CacheEntry<V> {
    cell: Arc<OnceCell<V>>,
    created: Instant,
}

impl<V> CacheEntry<V> {
    fn fresh() -> Self {
        Self {
            cell: Arc::new(OnceCell::new()),
            created: Instant::now(),
        }
    }
}

/// Thread-safe TTL cache with at-most-one fetch in flight per key.
pub struct ResponseCache<K, V> {
    entries: DashMap<K, CacheEntry<V>>,
    max_entries: usize,
    ttl: Duration,
}

impl<K, V> ResponseCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Create a new cache. A zero TTL or capacity disables caching.
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            max_entries,
            ttl,
        }
    }

    fn enabled(&self) -> bool {
        self.max_entries > 0 && !self.ttl.is_zero()
    }

    /// Get a cached value or fetch it.
    ///
    /// Callers racing on the same key wait for the first fetch instead of
    /// issuing their own. If the fetch fails the error is returned and the
    /// next caller fetches again.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V>>,
    {
        if !self.enabled() {
            return fetch().await;
        }

        let cell = self.cell_for(key);
        let value = cell.get_or_try_init(fetch).await?;
        Ok(value.clone())
    }

    fn cell_for(&self, key: K) -> Arc<OnceCell<V>> {
        // Eviction locks every shard, so it must run before `entry` takes one.
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(&key) {
            self.cleanup_expired();
            if self.entries.len() >= self.max_entries {
                self.evict_oldest();
            }
        }

        let mut entry = self.entries.entry(key).or_insert_with(CacheEntry::fresh);
        if entry.created.elapsed() >= self.ttl {
            trace!("Replacing expired cache entry");
            *entry = CacheEntry::fresh();
        }
        Arc::clone(&entry.cell)
    }

    /// Get the number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all entries.
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Remove expired entries.
    pub fn cleanup_expired(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, entry| entry.created.elapsed() < ttl);
    }

    fn evict_oldest(&self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|entry| entry.created)
            .map(|entry| entry.key().clone());

        if let Some(key) = oldest {
            self.entries.remove(&key);
        }
    }
}

/// Key of an episode list query. Providers return the whole list whatever
/// the index hint, so the hint is not part of the key.
type EpisodeListKey = (SubjectId, Option<EpisodeType>);

/// [`MetadataService`] decorator that caches every query.
pub struct CachedMetadataService<S> {
    inner: S,
    episode_lists: ResponseCache<EpisodeListKey, Vec<EpisodeRecord>>,
    episodes: ResponseCache<EpisodeId, Option<EpisodeRecord>>,
    subjects: ResponseCache<SubjectId, Option<Subject>>,
    related: ResponseCache<SubjectId, Vec<RelatedSubject>>,
}

impl<S: MetadataService> CachedMetadataService<S> {
    /// Wrap `inner`, keeping each response for `ttl`.
    pub fn new(inner: S, max_entries: usize, ttl: Duration) -> Self {
        Self {
            inner,
            episode_lists: ResponseCache::new(max_entries, ttl),
            episodes: ResponseCache::new(max_entries, ttl),
            subjects: ResponseCache::new(max_entries, ttl),
            related: ResponseCache::new(max_entries, ttl),
        }
    }

    /// The wrapped service.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Drop every cached response.
    pub fn clear(&self) {
        self.episode_lists.clear();
        self.episodes.clear();
        self.subjects.clear();
        self.related.clear();
    }
}

#[async_trait]
impl<S: MetadataService> MetadataService for CachedMetadataService<S> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn list_episodes(
        &self,
        subject_id: SubjectId,
        type_filter: Option<EpisodeType>,
        index_hint: f64,
    ) -> Result<Vec<EpisodeRecord>> {
        self.episode_lists
            .get_or_fetch((subject_id, type_filter), || {
                self.inner.list_episodes(subject_id, type_filter, index_hint)
            })
            .await
    }

    async fn get_episode(&self, episode_id: EpisodeId) -> Result<Option<EpisodeRecord>> {
        self.episodes
            .get_or_fetch(episode_id, || self.inner.get_episode(episode_id))
            .await
    }

    async fn get_subject(&self, subject_id: SubjectId) -> Result<Option<Subject>> {
        self.subjects
            .get_or_fetch(subject_id, || self.inner.get_subject(subject_id))
            .await
    }

    async fn get_related_subjects(&self, subject_id: SubjectId) -> Result<Vec<RelatedSubject>> {
        self.related
            .get_or_fetch(subject_id, || self.inner.get_related_subjects(subject_id))
            .await
    }
}
