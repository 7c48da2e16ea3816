//! Shared test harness for integration tests.
//!
//! Provides [`FakeCatalogue`], an in-memory [`MetadataService`] with call
//! counters and failure injection, and helpers that build seasons, sequel
//! chains and resolvers on top of it.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use animatch::config::ResolverConfig;
use animatch::metadata::MetadataService;
use animatch::naming::ReleaseNameTokenizer;
use animatch::overrides::LocalOverride;
use animatch::Resolver;
use animatch_common::{
    EpisodeId, EpisodeRecord, EpisodeType, Error, RelatedSubject, RelationKind, Result, Subject,
    SubjectId,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// Resolver over the fake catalogue with an in-memory override map.
pub type TestResolver =
    Resolver<Arc<FakeCatalogue>, HashMap<PathBuf, LocalOverride>, ReleaseNameTokenizer>;

/// Catalogue episode with a predictable id: `subject * 1000 + order`.
pub fn episode(subject: u64, episode_type: EpisodeType, order: f64, title: &str) -> EpisodeRecord {
    EpisodeRecord {
        id: EpisodeId::new(subject * 1000 + order as u64),
        original_title: title.to_string(),
        ..EpisodeRecord::synthesized(SubjectId::new(subject), episode_type, order)
    }
}

pub fn subject(id: u64, name: &str, air_date: Option<&str>) -> Subject {
    Subject {
        id: SubjectId::new(id),
        original_name: name.to_string(),
        localized_name: None,
        air_date: air_date.map(String::from),
        episode_count: None,
        summary: None,
    }
}

/// In-memory catalogue.
#[derive(Default)]
pub struct FakeCatalogue {
    episodes: Mutex<HashMap<SubjectId, Vec<EpisodeRecord>>>,
    unlisted: Mutex<HashMap<EpisodeId, EpisodeRecord>>,
    subjects: Mutex<HashMap<SubjectId, Subject>>,
    relations: Mutex<HashMap<SubjectId, Vec<RelatedSubject>>>,
    fail: AtomicBool,
    delay: Mutex<Option<Duration>>,
    cancel_on_related: Mutex<Option<CancellationToken>>,
    pub list_calls: AtomicUsize,
    pub episode_calls: AtomicUsize,
    pub subject_calls: AtomicUsize,
    pub related_calls: AtomicUsize,
}

impl FakeCatalogue {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Add Normal episodes `1..=count` titled `Episode N`.
    pub fn add_season(&self, subject_id: u64, count: u32) {
        for n in 1..=count {
            self.add_episode(episode(
                subject_id,
                EpisodeType::Normal,
                f64::from(n),
                &format!("Episode {n}"),
            ));
        }
    }

    pub fn add_episode(&self, record: EpisodeRecord) {
        self.episodes
            .lock()
            .entry(record.parent_subject_id)
            .or_default()
            .push(record);
    }

    /// An episode reachable by id but absent from every list.
    pub fn add_unlisted_episode(&self, record: EpisodeRecord) {
        self.unlisted.lock().insert(record.id, record);
    }

    pub fn add_subject(&self, subject: Subject) {
        self.subjects.lock().insert(subject.id, subject);
    }

    pub fn add_sequel(&self, from: u64, to: u64) {
        self.add_relation(from, to, RelationKind::Sequel);
    }

    pub fn add_relation(&self, from: u64, to: u64, relation: RelationKind) {
        self.relations
            .lock()
            .entry(SubjectId::new(from))
            .or_default()
            .push(RelatedSubject {
                id: SubjectId::new(to),
                relation,
            });
    }

    /// Make every call fail with a retryable remote error.
    pub fn fail_with_remote_error(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Delay every call.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    /// Fire `token` as soon as a related-subject lookup is made.
    pub fn cancel_on_related_lookup(&self, token: CancellationToken) {
        *self.cancel_on_related.lock() = Some(token);
    }

    pub fn calls(&self, counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    async fn enter(&self, counter: &AtomicUsize) -> Result<()> {
        counter.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::remote("503 Service Unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl MetadataService for FakeCatalogue {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn list_episodes(
        &self,
        subject_id: SubjectId,
        type_filter: Option<EpisodeType>,
        _index_hint: f64,
    ) -> Result<Vec<EpisodeRecord>> {
        self.enter(&self.list_calls).await?;
        Ok(self
            .episodes
            .lock()
            .get(&subject_id)
            .map(|records| {
                records
                    .iter()
                    .filter(|r| type_filter.map_or(true, |t| r.episode_type == t))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn get_episode(&self, episode_id: EpisodeId) -> Result<Option<EpisodeRecord>> {
        self.enter(&self.episode_calls).await?;
        if let Some(record) = self.unlisted.lock().get(&episode_id) {
            return Ok(Some(record.clone()));
        }
        Ok(self
            .episodes
            .lock()
            .values()
            .flatten()
            .find(|r| r.id == episode_id)
            .cloned())
    }

    async fn get_subject(&self, subject_id: SubjectId) -> Result<Option<Subject>> {
        self.enter(&self.subject_calls).await?;
        Ok(self.subjects.lock().get(&subject_id).cloned())
    }

    async fn get_related_subjects(&self, subject_id: SubjectId) -> Result<Vec<RelatedSubject>> {
        self.enter(&self.related_calls).await?;
        if let Some(token) = self.cancel_on_related.lock().as_ref() {
            token.cancel();
        }
        Ok(self
            .relations
            .lock()
            .get(&subject_id)
            .cloned()
            .unwrap_or_default())
    }
}

/// Resolver with default options and no directory overrides.
pub fn resolver(catalogue: &Arc<FakeCatalogue>) -> TestResolver {
    resolver_with(catalogue, ResolverConfig::default(), HashMap::new())
}

pub fn resolver_with(
    catalogue: &Arc<FakeCatalogue>,
    config: ResolverConfig,
    overrides: HashMap<PathBuf, LocalOverride>,
) -> TestResolver {
    Resolver::new(catalogue.clone(), overrides, ReleaseNameTokenizer, config)
}
