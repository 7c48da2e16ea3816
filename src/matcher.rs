//! Remote candidate matching.
//!
//! Candidates are sorted by type (Normal first, stable) and handed to a fixed
//! list of [`MatchRule`]s. The first rule that picks a record wins, so a
//! Normal episode always beats a Special with the same order.

use animatch_common::{EpisodeId, EpisodeRecord, EpisodeType, SubjectId};
use tracing::{debug, info};

use crate::classifier::is_special_file_name;
use crate::error::Result;
use crate::guard::CallGuard;
use crate::metadata::MetadataService;

/// Two orders closer than this are equal.
pub const ORDER_EPSILON: f64 = 1e-9;

/// Largest drift between a cached episode's order and the index for which
/// the cached id is still accepted.
pub const CACHED_ORDER_TOLERANCE: f64 = 0.1;

/// What the rules look for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchQuery {
    pub index: f64,
    /// Index from a secondary numbering scheme, e.g. the `48` of `12 (48)`.
    pub alternate: Option<f64>,
}

/// First record whose order equals `order`.
pub fn find_order(sorted: &[EpisodeRecord], order: f64) -> Option<&EpisodeRecord> {
    sorted
        .iter()
        .find(|record| (record.order - order).abs() < ORDER_EPSILON)
}

/// Stable sort by type priority.
pub fn sort_candidates(candidates: &mut [EpisodeRecord]) {
    candidates.sort_by_key(|record| record.episode_type);
}

/// Highest order among the candidates.
pub fn max_order(candidates: &[EpisodeRecord]) -> Option<f64> {
    candidates.iter().map(|record| record.order).reduce(f64::max)
}

/// One step of candidate selection.
pub trait MatchRule: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Pick a record from type-sorted candidates, or `None` when the rule
    /// does not apply.
    fn pick<'a>(&self, sorted: &'a [EpisodeRecord], query: &MatchQuery)
        -> Option<&'a EpisodeRecord>;
}

/// The order equals the index.
pub struct ExactOrder;

impl MatchRule for ExactOrder {
    fn name(&self) -> &'static str {
        "exact_order"
    }

    fn pick<'a>(&self, sorted: &'a [EpisodeRecord], query: &MatchQuery) -> Option<&'a EpisodeRecord> {
        find_order(sorted, query.index)
    }
}

/// Index 0 means "unset": take episode 1.
pub struct ZeroMeansFirst;

impl MatchRule for ZeroMeansFirst {
    fn name(&self) -> &'static str {
        "zero_means_first"
    }

    fn pick<'a>(&self, sorted: &'a [EpisodeRecord], query: &MatchQuery) -> Option<&'a EpisodeRecord> {
        if query.index != 0.0 {
            return None;
        }
        find_order(sorted, 1.0)
    }
}

/// The order equals the alternate index.
pub struct AlternateIndex;

impl MatchRule for AlternateIndex {
    fn name(&self) -> &'static str {
        "alternate_index"
    }

    fn pick<'a>(&self, sorted: &'a [EpisodeRecord], query: &MatchQuery) -> Option<&'a EpisodeRecord> {
        find_order(sorted, query.alternate?)
    }
}

/// Runs the match rules in their fixed order.
pub struct Matcher {
    rules: Vec<Box<dyn MatchRule>>,
}

impl Default for Matcher {
    fn default() -> Self {
        Self {
            rules: vec![
                Box::new(ExactOrder),
                Box::new(ZeroMeansFirst),
                Box::new(AlternateIndex),
            ],
        }
    }
}

impl Matcher {
    /// Names of the rules, in evaluation order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Select the best candidate for the query.
    pub fn select(&self, candidates: &[EpisodeRecord], query: &MatchQuery) -> Option<EpisodeRecord> {
        let mut sorted = candidates.to_vec();
        sort_candidates(&mut sorted);

        for rule in &self.rules {
            if let Some(record) = rule.pick(&sorted, query) {
                debug!(
                    rule = rule.name(),
                    episode_id = %record.id,
                    order = record.order,
                    episode_type = %record.episode_type,
                    "Match rule applied"
                );
                return Some(record.clone());
            }
        }
        None
    }
}

/// Fetch candidates for a subject.
///
/// A Special query that comes back empty is retried once without a type
/// filter, since the catalogue sometimes files specials as untyped.
pub async fn fetch_candidates<S: MetadataService + ?Sized>(
    service: &S,
    guard: &CallGuard,
    subject_id: SubjectId,
    type_hint: Option<EpisodeType>,
    index: f64,
) -> Result<Vec<EpisodeRecord>> {
    let candidates = guard
        .call(service.list_episodes(subject_id, type_hint, index))
        .await?;

    if candidates.is_empty() && type_hint == Some(EpisodeType::Special) {
        info!(
            subject_id = %subject_id,
            index,
            "No specials listed, retrying without type filter"
        );
        return guard.call(service.list_episodes(subject_id, None, index)).await;
    }

    Ok(candidates)
}

/// Fetch the record behind a previously assigned episode id.
pub async fn fetch_cached<S: MetadataService + ?Sized>(
    service: &S,
    guard: &CallGuard,
    episode_id: EpisodeId,
) -> Result<Option<EpisodeRecord>> {
    if episode_id.is_unset() {
        return Ok(None);
    }
    let record = guard.call(service.get_episode(episode_id)).await?;
    if record.is_none() {
        debug!(episode_id = %episode_id, "Cached episode id no longer exists");
    }
    Ok(record)
}

/// Whether a cached record may stand in for a failed match.
///
/// Non-Normal records, and files whose name carries a special marker, are
/// accepted as is; their numbering is unreliable. Anything else must belong
/// to the subject and sit within [`CACHED_ORDER_TOLERANCE`] of the index.
pub fn validate_cached(
    record: &EpisodeRecord,
    subject_id: SubjectId,
    index: f64,
    file_name: &str,
) -> bool {
    if record.episode_type != EpisodeType::Normal || is_special_file_name(file_name) {
        return true;
    }
    record.parent_subject_id == subject_id && (record.order - index).abs() < CACHED_ORDER_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, episode_type: EpisodeType, order: f64) -> EpisodeRecord {
        EpisodeRecord {
            id: EpisodeId::new(id),
            original_title: format!("ep {id}"),
            ..EpisodeRecord::synthesized(SubjectId::new(1), episode_type, order)
        }
    }

    fn query(index: f64) -> MatchQuery {
        MatchQuery {
            index,
            alternate: None,
        }
    }

    #[test]
    fn test_normal_beats_special_with_same_order() {
        let candidates = vec![
            record(10, EpisodeType::Special, 1.0),
            record(11, EpisodeType::Normal, 1.0),
            record(12, EpisodeType::Normal, 2.0),
        ];
        let matched = Matcher::default().select(&candidates, &query(1.0)).unwrap();
        assert_eq!(matched.id, EpisodeId::new(11));
    }

    #[test]
    fn test_unsorted_input() {
        let candidates = vec![
            record(3, EpisodeType::Normal, 3.0),
            record(1, EpisodeType::Normal, 1.0),
            record(2, EpisodeType::Normal, 2.0),
        ];
        let matched = Matcher::default().select(&candidates, &query(2.0)).unwrap();
        assert_eq!(matched.id, EpisodeId::new(2));
    }

    #[test]
    fn test_fractional_order() {
        let candidates = vec![
            record(12, EpisodeType::Normal, 12.0),
            record(125, EpisodeType::Normal, 12.5),
        ];
        let matched = Matcher::default().select(&candidates, &query(12.5)).unwrap();
        assert_eq!(matched.id, EpisodeId::new(125));
    }

    #[test]
    fn test_zero_means_first() {
        let candidates = vec![record(1, EpisodeType::Opening, 1.0)];
        let matched = Matcher::default().select(&candidates, &query(0.0)).unwrap();
        assert_eq!(matched.id, EpisodeId::new(1));

        let with_zero = vec![
            record(1, EpisodeType::Normal, 1.0),
            record(100, EpisodeType::Normal, 0.0),
        ];
        let matched = Matcher::default().select(&with_zero, &query(0.0)).unwrap();
        assert_eq!(matched.id, EpisodeId::new(100));
    }

    #[test]
    fn test_alternate_index() {
        let candidates = vec![record(48, EpisodeType::Normal, 48.0)];
        let matched = Matcher::default()
            .select(
                &candidates,
                &MatchQuery {
                    index: 12.0,
                    alternate: Some(48.0),
                },
            )
            .unwrap();
        assert_eq!(matched.id, EpisodeId::new(48));
    }

    #[test]
    fn test_no_match() {
        let candidates = vec![record(1, EpisodeType::Normal, 1.0)];
        assert!(Matcher::default().select(&candidates, &query(5.0)).is_none());
        assert!(Matcher::default().select(&[], &query(0.0)).is_none());
    }

    #[test]
    fn test_rule_order() {
        assert_eq!(
            Matcher::default().rule_names(),
            vec!["exact_order", "zero_means_first", "alternate_index"]
        );
    }

    #[test]
    fn test_validate_cached() {
        let subject = SubjectId::new(1);
        let normal = record(7, EpisodeType::Normal, 7.0);
        assert!(validate_cached(&normal, subject, 7.05, "Show - 07.mkv"));
        assert!(!validate_cached(&normal, subject, 8.0, "Show - 08.mkv"));
        assert!(!validate_cached(&normal, SubjectId::new(2), 7.0, "Show - 07.mkv"));
        // Special markers in the name skip the numeric check
        assert!(validate_cached(&normal, subject, 8.0, "Show - NCOP.mkv"));

        let special = record(8, EpisodeType::Special, 1.0);
        assert!(validate_cached(&special, SubjectId::new(2), 9.0, "Show - 09.mkv"));
    }

    #[test]
    fn test_max_order() {
        let candidates = vec![
            record(1, EpisodeType::Normal, 1.0),
            record(2, EpisodeType::Normal, 25.0),
            record(3, EpisodeType::Special, 2.0),
        ];
        assert_eq!(max_order(&candidates), Some(25.0));
        assert_eq!(max_order(&[]), None);
    }
}
