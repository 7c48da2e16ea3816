//! Cross-season index continuity.
//!
//! Local collections often number a show contiguously (1 to 50) while the
//! catalogue splits it into season subjects that each restart at 1. When an
//! index lies beyond the current season, [`ContinuityResolver`] walks the
//! sequel chain, lays every season on one absolute axis and matches the
//! index there.
//!
//! With per-season counts `[25, 22, 30]` the cumulative bases are
//! `25, 47, 77`: index 40 lands in season two at local order 15 and index
//! 60 in season three at local order 13.

use std::collections::HashSet;

use animatch_common::{EpisodeRecord, EpisodeType, RelationKind, SubjectId};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::guard::CallGuard;
use crate::matcher::{find_order, max_order, sort_candidates, ORDER_EPSILON};
use crate::metadata::MetadataService;

/// Walk state, scoped to one resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeasonCursor {
    /// Season the walk currently stands on.
    pub subject_id: SubjectId,
    /// Episodes of every season up to and including this one.
    pub cumulative_base: f64,
    /// Highest absolute order of this season.
    pub last_season_max_order: f64,
}

/// Resolves indices that run past the end of a season.
#[derive(Debug, Clone, Copy)]
pub struct ContinuityResolver {
    max_hops: usize,
}

impl ContinuityResolver {
    pub fn new(max_hops: usize) -> Self {
        Self { max_hops }
    }

    /// Find the record for `index` (or `alternate`) in a later season.
    ///
    /// `current` is the candidate list already fetched for `subject_id`; its
    /// Normal episodes set the starting base. Returns `Ok(None)` when the
    /// index is within the current season, when the chain ends, on a cycle,
    /// or when the hop limit is reached. The returned record's order is the
    /// absolute index that matched.
    pub async fn resolve<S: MetadataService + ?Sized>(
        &self,
        service: &S,
        guard: &CallGuard,
        subject_id: SubjectId,
        current: &[EpisodeRecord],
        index: f64,
        alternate: Option<f64>,
    ) -> Result<Option<EpisodeRecord>> {
        let normal: Vec<EpisodeRecord> = current
            .iter()
            .filter(|r| r.episode_type == EpisodeType::Normal)
            .cloned()
            .collect();
        let season_max = match max_order(&normal) {
            Some(max) => max,
            None => {
                let listed = guard
                    .call(service.list_episodes(subject_id, Some(EpisodeType::Normal), index))
                    .await?;
                match max_order(&listed) {
                    Some(max) => max,
                    None => return Ok(None),
                }
            }
        };

        // Both numberings must lie past the season, or the direct match
        // missed for another reason.
        if index <= season_max || alternate.is_some_and(|alt| alt <= season_max) {
            debug!(index, ?alternate, season_max, "Index within current season");
            return Ok(None);
        }

        let mut cursor = SeasonCursor {
            subject_id,
            cumulative_base: season_max,
            last_season_max_order: season_max,
        };
        let mut visited = HashSet::from([subject_id]);

        for hop in 0..self.max_hops {
            guard.check()?;

            let related = guard
                .call(service.get_related_subjects(cursor.subject_id))
                .await?;
            let Some(sequel) = related.iter().find(|r| r.relation == RelationKind::Sequel) else {
                info!(subject_id = %cursor.subject_id, "No sequel, continuity walk ends");
                return Ok(None);
            };
            let sequel_id = sequel.id;

            if !visited.insert(sequel_id) {
                warn!(
                    subject_id = %cursor.subject_id,
                    sequel_id = %sequel_id,
                    "Sequel relations form a cycle"
                );
                return Ok(None);
            }

            let mut season = guard
                .call(service.list_episodes(sequel_id, Some(EpisodeType::Normal), index))
                .await?;
            season.retain(|r| r.episode_type == EpisodeType::Normal);
            let Some(first) = season.iter().map(|r| r.order).reduce(f64::min) else {
                info!(subject_id = %sequel_id, "Sequel has no episodes");
                return Ok(None);
            };

            let previous_base = cursor.cumulative_base;
            if (first - 1.0).abs() < ORDER_EPSILON {
                for record in &mut season {
                    record.order += previous_base;
                }
            }
            sort_candidates(&mut season);

            let renumbered_first = season.iter().map(|r| r.order).reduce(f64::min).unwrap_or(first);
            let renumbered_max = max_order(&season).unwrap_or(renumbered_first);
            cursor = SeasonCursor {
                subject_id: sequel_id,
                cumulative_base: previous_base + renumbered_max - renumbered_first + 1.0,
                last_season_max_order: renumbered_max,
            };
            debug!(hop, ?cursor, "Advanced to sequel season");

            let beyond = |value: f64| value > cursor.cumulative_base;
            if beyond(index) || alternate.is_some_and(beyond) {
                continue;
            }

            return Ok(Self::match_in_season(&season, index, alternate, previous_base));
        }

        warn!(max_hops = self.max_hops, index, "Continuity walk hit the hop limit");
        Ok(None)
    }

    fn match_in_season(
        season: &[EpisodeRecord],
        index: f64,
        alternate: Option<f64>,
        previous_base: f64,
    ) -> Option<EpisodeRecord> {
        let attempts = std::iter::once(index).chain(alternate);
        for wanted in attempts {
            let found =
                find_order(season, wanted).or_else(|| find_order(season, wanted - previous_base));
            if let Some(record) = found {
                info!(
                    episode_id = %record.id,
                    subject_id = %record.parent_subject_id,
                    index = wanted,
                    "Matched across seasons"
                );
                let mut record = record.clone();
                record.order = wanted;
                return Some(record);
            }
        }
        None
    }
}
