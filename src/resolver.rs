//! The resolution pipeline.
//!
//! For one file: classify the name, extract the index, apply the directory
//! override, match against the catalogue, chase sequels when the index runs
//! past the season, and fall back to a synthesized placeholder when nothing
//! matches.

use std::path::{Path, PathBuf};

use animatch_common::{
    EpisodeId, EpisodeRecord, EpisodeType, Subject, SubjectId, TitlePreference,
};
use chrono::NaiveDate;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::classifier::{self, Classification};
use crate::config::ResolverConfig;
use crate::continuity::ContinuityResolver;
use crate::error::Result;
use crate::extractor::IndexExtractor;
use crate::guard::CallGuard;
use crate::matcher::{self, MatchQuery, Matcher};
use crate::metadata::MetadataService;
use crate::naming::{NameTokenizer, ReleaseNameTokenizer};
use crate::overrides::{IniOverrideStore, LocalOverride, OverrideStore};
use crate::title::synthesize_title;

// ---------------------------------------------------------------------------
// Request and result
// ---------------------------------------------------------------------------

/// A file to resolve, with what the host library already knows about it.
#[derive(Debug, Clone, Default)]
pub struct ResolveRequest {
    /// Full path of the media file.
    pub path: PathBuf,
    /// Subject id of the series, as assigned by the host.
    pub series_subject_id: Option<SubjectId>,
    /// Subject id of the season folder, as assigned by the host.
    pub season_subject_id: Option<SubjectId>,
    /// Episode index the host has already assigned.
    pub known_index: Option<f64>,
    /// Episode id from a previous resolution.
    pub cached_episode_id: Option<EpisodeId>,
}

impl ResolveRequest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_series_subject(mut self, id: SubjectId) -> Self {
        self.series_subject_id = Some(id);
        self
    }

    pub fn with_season_subject(mut self, id: SubjectId) -> Self {
        self.season_subject_id = Some(id);
        self
    }

    pub fn with_known_index(mut self, index: f64) -> Self {
        self.known_index = Some(index);
        self
    }

    pub fn with_cached_episode(mut self, id: EpisodeId) -> Self {
        self.cached_episode_id = Some(id);
        self
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn directory(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }
}

/// Where a non-Normal episode sits relative to its season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    BeforeSeason,
    AfterSeason,
}

/// The episode a file resolved to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedEpisode {
    /// Catalogue record, or a placeholder with id 0.
    pub record: EpisodeRecord,
    /// Absolute index to display.
    pub index: f64,
    pub episode_type: EpisodeType,
    pub title: String,
    pub original_title: String,
    /// `true` when the record exists in the catalogue.
    pub remote_backed: bool,
    pub is_special: bool,
    pub premiere_date: Option<NaiveDate>,
    pub production_year: Option<i32>,
    /// Set for non-Normal episodes whose season is known.
    pub placement: Option<Placement>,
}

/// Per-call state shared by the pipeline steps.
struct Context<'a> {
    guard: CallGuard,
    file_name: String,
    subject_id: SubjectId,
    classification: Classification,
    tokens: animatch_parser::ReleaseTokens,
    stripped: String,
    /// Offset subtracted from the index before lookup; 0 for non-Normal files.
    applied_offset: f64,
    request: &'a ResolveRequest,
}

// ---------------------------------------------------------------------------
// Resolver
// ---------------------------------------------------------------------------

/// Resolves local files to catalogue episodes.
///
/// Holds no state between calls; one resolver may serve many concurrent
/// resolutions.
pub struct Resolver<S, O = IniOverrideStore, T = ReleaseNameTokenizer> {
    service: S,
    overrides: O,
    tokenizer: T,
    config: ResolverConfig,
    extractor: IndexExtractor,
    matcher: Matcher,
    continuity: ContinuityResolver,
}

impl<S: MetadataService> Resolver<S> {
    /// Resolver reading `bangumi.ini` overrides and tokenizing with
    /// `animatch-parser`.
    pub fn with_defaults(service: S, config: ResolverConfig) -> Self {
        Self::new(service, IniOverrideStore::new(), ReleaseNameTokenizer, config)
    }
}

impl<S, O, T> Resolver<S, O, T>
where
    S: MetadataService,
    O: OverrideStore,
    T: NameTokenizer,
{
    pub fn new(service: S, overrides: O, tokenizer: T, config: ResolverConfig) -> Self {
        Self {
            extractor: IndexExtractor::new(&config),
            matcher: Matcher::default(),
            continuity: ContinuityResolver::new(config.max_season_hops),
            service,
            overrides,
            tokenizer,
            config,
        }
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve one file.
    ///
    /// Returns `Ok(None)` when no subject id is known for the file. A file
    /// that matches nothing in the catalogue resolves to a placeholder with
    /// `remote_backed == false`. Errors are limited to cancellation and
    /// remote failures.
    pub async fn resolve(
        &self,
        request: &ResolveRequest,
        cancel: &CancellationToken,
    ) -> Result<Option<ResolvedEpisode>> {
        let guard = CallGuard::new(cancel.clone(), self.config.request_timeout());
        guard.check()?;

        let file_name = request.file_name();
        let directory = request.directory();
        let local = directory
            .map(|dir| self.overrides.resolve_override(dir))
            .unwrap_or_default();

        let Some(subject_id) = Self::subject_for(request, &local) else {
            info!(file_name = %file_name, "No subject id known, skipping");
            return Ok(None);
        };

        let directory_name = directory
            .and_then(|d| d.file_name())
            .map(|n| n.to_string_lossy().into_owned());
        let classification = classifier::classify(&file_name, directory_name.as_deref());
        let tokens = self.tokenizer.tokenize(&file_name);
        let stripped = classifier::strip_noise(&file_name);

        let applied_offset = if classification.is_normal_or_unknown() {
            f64::from(local.offset)
        } else {
            0.0
        };

        let ctx = Context {
            guard,
            file_name,
            subject_id,
            classification,
            tokens,
            stripped,
            applied_offset,
            request,
        };

        let index = self.initial_index(&ctx);
        info!(
            file_name = %ctx.file_name,
            subject_id = %subject_id,
            index,
            episode_type = ?ctx.classification.episode_type,
            offset = ctx.applied_offset,
            "Resolving episode"
        );

        if self.config.trust_existing_remote_id {
            if let Some(id) = request.cached_episode_id {
                if let Some(record) = matcher::fetch_cached(&self.service, &ctx.guard, id).await? {
                    info!(episode_id = %id, "Trusting cached episode id");
                    return self.finish(&ctx, record).await.map(Some);
                }
            }
        }

        let type_hint = ctx.classification.episode_type;
        let candidates =
            matcher::fetch_candidates(&self.service, &ctx.guard, subject_id, type_hint, index)
                .await?;

        let index = self.refine_index(&ctx, index, &candidates);
        let query = MatchQuery {
            index,
            alternate: ctx.tokens.episode_alt_number(),
        };

        if let Some(record) = self.matcher.select(&candidates, &query) {
            return self.finish(&ctx, record).await.map(Some);
        }

        if let Some(id) = request.cached_episode_id {
            if let Some(record) = matcher::fetch_cached(&self.service, &ctx.guard, id).await? {
                if matcher::validate_cached(&record, subject_id, index, &ctx.file_name) {
                    info!(episode_id = %id, "Accepted cached episode id");
                    return self.finish(&ctx, record).await.map(Some);
                }
                debug!(episode_id = %id, order = record.order, index, "Cached episode does not fit");
            }
        }

        if ctx.classification.is_normal_or_unknown() {
            let across = self
                .continuity
                .resolve(
                    &self.service,
                    &ctx.guard,
                    subject_id,
                    &candidates,
                    index,
                    query.alternate,
                )
                .await?;
            if let Some(record) = across {
                return self.finish(&ctx, record).await.map(Some);
            }
        }

        warn!(
            file_name = %ctx.file_name,
            subject_id = %subject_id,
            index,
            "No catalogue episode matched, synthesizing placeholder"
        );
        Ok(Some(self.placeholder(&ctx, index)))
    }

    fn subject_for(request: &ResolveRequest, local: &LocalOverride) -> Option<SubjectId> {
        [
            local.explicit_subject_id,
            request.season_subject_id,
            request.series_subject_id,
        ]
        .into_iter()
        .flatten()
        .find(|id| !id.is_unset())
    }

    /// Index used for the lookup, offset already removed.
    fn initial_index(&self, ctx: &Context<'_>) -> f64 {
        let known = ctx.request.known_index;
        let index = if self.config.always_replace_episode_number || known.map_or(true, |i| i == 0.0)
        {
            self.extractor
                .extract(&ctx.stripped, known, None, ctx.tokens.episode_number())
        } else {
            known.unwrap_or(0.0)
        };

        if ctx.applied_offset != 0.0 {
            debug!(offset = ctx.applied_offset, index, "Applying directory offset");
        }
        index - ctx.applied_offset
    }

    /// Re-check the index against the highest order the subject lists.
    fn refine_index(&self, ctx: &Context<'_>, index: f64, candidates: &[EpisodeRecord]) -> f64 {
        if !ctx.classification.is_normal_or_unknown() {
            return index;
        }
        let Some(max) = matcher::max_order(candidates) else {
            return index;
        };

        let refined = self.extractor.extract(
            &ctx.stripped,
            Some(index + ctx.applied_offset),
            Some(max + ctx.applied_offset),
            ctx.tokens.episode_number(),
        ) - ctx.applied_offset;

        if refined != index {
            info!(index, refined, max, "Index beyond the season, using file name");
        }
        refined
    }

    fn synthesized_title(&self, ctx: &Context<'_>) -> String {
        let title = synthesize_title(&ctx.tokens, ctx.classification.raw_token.as_deref());
        if title.is_empty() {
            animatch_common::paths::strip_media_extension(&ctx.file_name).to_string()
        } else {
            title
        }
    }

    fn placeholder(&self, ctx: &Context<'_>, index: f64) -> ResolvedEpisode {
        let episode_type = ctx
            .classification
            .episode_type
            .filter(|t| *t != EpisodeType::Normal)
            .unwrap_or(EpisodeType::Special);
        let title = self.synthesized_title(ctx);

        let mut record =
            EpisodeRecord::synthesized(ctx.subject_id, episode_type, index + ctx.applied_offset);
        record.original_title = title.clone();

        ResolvedEpisode {
            index: record.order,
            episode_type,
            original_title: title.clone(),
            title,
            remote_backed: false,
            is_special: true,
            premiere_date: None,
            production_year: None,
            placement: None,
            record,
        }
    }

    async fn parent_subject(&self, ctx: &Context<'_>, record: &EpisodeRecord) -> Result<Option<Subject>> {
        let parent = if record.parent_subject_id.is_unset() {
            ctx.subject_id
        } else {
            record.parent_subject_id
        };
        ctx.guard.call(self.service.get_subject(parent)).await
    }

    async fn finish(&self, ctx: &Context<'_>, record: EpisodeRecord) -> Result<ResolvedEpisode> {
        let pref = self.config.title_preference;
        let episode_type = record.episode_type;
        let is_normal = episode_type == EpisodeType::Normal;

        let subject = if is_normal {
            None
        } else {
            self.parent_subject(ctx, &record).await?
        };

        let (title, original_title) = if record.has_title() {
            let title = match record.title(pref).trim() {
                "" => record.localized_title.clone().unwrap_or_default(),
                title => title.to_string(),
            };
            let original = match record.original_title.trim() {
                "" => title.clone(),
                original => original.to_string(),
            };
            (title, original)
        } else if let Some(name) = subject.as_ref().and_then(|s| subject_title(s, pref)) {
            (name.clone(), name)
        } else {
            let synthesized = self.synthesized_title(ctx);
            (synthesized.clone(), synthesized)
        };

        let index = if is_normal {
            record.order + ctx.applied_offset
        } else {
            record.order
        };

        let placement = subject.as_ref().map(|s| placement(&record, s));

        info!(
            episode_id = %record.id,
            index,
            episode_type = %episode_type,
            title = %title,
            "Resolved episode"
        );

        Ok(ResolvedEpisode {
            index,
            episode_type,
            title,
            original_title,
            remote_backed: record.is_remote(),
            is_special: !is_normal || classifier::has_special_marker(&ctx.file_name),
            premiere_date: record.premiere_date(),
            production_year: record.production_year(),
            placement,
            record,
        })
    }
}

fn subject_title(subject: &Subject, pref: TitlePreference) -> Option<String> {
    let name = subject.name(pref).trim();
    (!name.is_empty()).then(|| name.to_string())
}

fn placement(record: &EpisodeRecord, subject: &Subject) -> Placement {
    let aired_before = match (record.premiere_date(), subject.premiere_date()) {
        (Some(episode), Some(season)) => episode < season,
        _ => match (record.air_date.as_deref(), subject.air_date.as_deref()) {
            (Some(episode), Some(season)) => episode < season,
            _ => false,
        },
    };
    if aired_before {
        Placement::BeforeSeason
    } else {
        Placement::AfterSeason
    }
}
