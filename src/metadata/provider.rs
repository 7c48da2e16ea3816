//! Trait definition for the remote metadata catalogue.
//!
//! The resolution engine talks to the catalogue only through
//! [`MetadataService`]. The Bangumi HTTP client, the response cache and the
//! in-memory catalogue used by tests all implement it.

use std::sync::Arc;

use animatch_common::{
    EpisodeId, EpisodeRecord, EpisodeType, RelatedSubject, Result, Subject, SubjectId,
};
use async_trait::async_trait;

// ---------------------------------------------------------------------------
// Service trait
// ---------------------------------------------------------------------------

/// Async access to a remote anime catalogue.
///
/// Not-found is not an error: lookups return `Ok(None)` or an empty list.
/// Transport and server failures surface as retryable
/// [`animatch_common::Error`]s.
#[async_trait]
pub trait MetadataService: Send + Sync {
    /// Short, lowercase identifier for this service (e.g. `"bangumi"`).
    fn name(&self) -> &'static str;

    /// Episodes of a subject, optionally restricted to one type.
    ///
    /// `index_hint` is the episode the caller is looking for; implementations
    /// may use it to narrow the query but must not rely on it for
    /// correctness. The returned order is not guaranteed.
    async fn list_episodes(
        &self,
        subject_id: SubjectId,
        type_filter: Option<EpisodeType>,
        index_hint: f64,
    ) -> Result<Vec<EpisodeRecord>>;

    /// A single episode by id.
    async fn get_episode(&self, episode_id: EpisodeId) -> Result<Option<EpisodeRecord>>;

    /// A subject by id.
    async fn get_subject(&self, subject_id: SubjectId) -> Result<Option<Subject>>;

    /// Subjects related to `subject_id` (sequels, prequels...), in the
    /// catalogue's listing order.
    async fn get_related_subjects(&self, subject_id: SubjectId) -> Result<Vec<RelatedSubject>>;
}

#[async_trait]
impl<T: MetadataService + ?Sized> MetadataService for Arc<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn list_episodes(
        &self,
        subject_id: SubjectId,
        type_filter: Option<EpisodeType>,
        index_hint: f64,
    ) -> Result<Vec<EpisodeRecord>> {
        (**self).list_episodes(subject_id, type_filter, index_hint).await
    }

    async fn get_episode(&self, episode_id: EpisodeId) -> Result<Option<EpisodeRecord>> {
        (**self).get_episode(episode_id).await
    }

    async fn get_subject(&self, subject_id: SubjectId) -> Result<Option<Subject>> {
        (**self).get_subject(subject_id).await
    }

    async fn get_related_subjects(&self, subject_id: SubjectId) -> Result<Vec<RelatedSubject>> {
        (**self).get_related_subjects(subject_id).await
    }
}
