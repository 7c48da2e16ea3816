//! Core type definitions for catalogue episodes, subjects and relations.
//!
//! Enums serialize in lowercase for the CLI's JSON output; the numeric
//! codes used by the remote catalogue are exposed separately through
//! [`EpisodeType::from_code`] and [`EpisodeType::code`].

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ids::{EpisodeId, SubjectId};

/// Classification of a catalogue episode.
///
/// The declaration order is the canonical priority used when several
/// candidates share the same order: `Normal` sorts first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeType {
    /// Main-run episode.
    #[default]
    Normal,
    /// Special, OVA or OAD.
    Special,
    /// Opening sequence.
    Opening,
    /// Ending sequence.
    Ending,
    /// Preview, trailer or commercial.
    Preview,
    /// Anything else the catalogue lists (MADs, extras).
    Other,
}

impl EpisodeType {
    /// Map the catalogue's numeric episode type.
    ///
    /// Unknown codes fold into [`EpisodeType::Other`].
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Normal,
            1 => Self::Special,
            2 => Self::Opening,
            3 => Self::Ending,
            4 => Self::Preview,
            _ => Self::Other,
        }
    }

    /// The catalogue's numeric code for this type.
    pub fn code(self) -> u8 {
        match self {
            Self::Normal => 0,
            Self::Special => 1,
            Self::Opening => 2,
            Self::Ending => 3,
            Self::Preview => 4,
            Self::Other => 6,
        }
    }

    /// `true` for everything except [`EpisodeType::Normal`].
    pub fn is_extra(self) -> bool {
        self != Self::Normal
    }
}

impl fmt::Display for EpisodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::Special => write!(f, "special"),
            Self::Opening => write!(f, "opening"),
            Self::Ending => write!(f, "ending"),
            Self::Preview => write!(f, "preview"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Which title to present when both are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TitlePreference {
    /// The catalogue's original-language title.
    #[default]
    Original,
    /// The localized title, falling back to the original when empty.
    Localized,
}

fn pick_title<'a>(original: &'a str, localized: Option<&'a str>, pref: TitlePreference) -> &'a str {
    match (pref, localized) {
        (TitlePreference::Localized, Some(local)) if !local.trim().is_empty() => local,
        _ => original,
    }
}

fn parse_air_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(raw, "%Y/%m/%d"))
        .ok()
}

fn air_year(raw: &str) -> Option<i32> {
    if let Some(date) = parse_air_date(raw) {
        return Some(date.year());
    }
    let head = raw.trim().get(..4)?;
    head.parse().ok()
}

/// A single episode of the remote catalogue.
///
/// `order` is the sort and match key. It is unique within a
/// (subject, type) pair but not across seasons. `index_within_subject` is
/// informational and only meaningful for [`EpisodeType::Normal`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeRecord {
    /// Catalogue id; zero for a synthesized record.
    pub id: EpisodeId,
    /// Subject (series or season) the episode belongs to.
    pub parent_subject_id: SubjectId,
    /// The catalogue's own type for this episode.
    pub episode_type: EpisodeType,
    /// Fractional display order within the type.
    pub order: f64,
    /// Position within the subject, Normal episodes only.
    pub index_within_subject: f64,
    /// Original-language title. May be empty for minimally catalogued extras.
    pub original_title: String,
    /// Localized title, if any.
    pub localized_title: Option<String>,
    /// Air date as provided by the catalogue (usually `YYYY-MM-DD`).
    pub air_date: Option<String>,
    /// Synopsis.
    pub description: Option<String>,
}

impl EpisodeRecord {
    /// A record with no remote backing, used for placeholders.
    pub fn synthesized(parent_subject_id: SubjectId, episode_type: EpisodeType, order: f64) -> Self {
        Self {
            id: EpisodeId::default(),
            parent_subject_id,
            episode_type,
            order,
            index_within_subject: 0.0,
            original_title: String::new(),
            localized_title: None,
            air_date: None,
            description: None,
        }
    }

    /// `true` when the record exists in the remote catalogue.
    pub fn is_remote(&self) -> bool {
        !self.id.is_unset()
    }

    /// `true` when either the original or the localized title has text.
    pub fn has_title(&self) -> bool {
        !self.original_title.trim().is_empty()
            || self
                .localized_title
                .as_deref()
                .is_some_and(|t| !t.trim().is_empty())
    }

    /// The title to display under the given preference.
    pub fn title(&self, pref: TitlePreference) -> &str {
        pick_title(&self.original_title, self.localized_title.as_deref(), pref)
    }

    /// Parsed air date, when the catalogue gives a full date.
    pub fn premiere_date(&self) -> Option<NaiveDate> {
        self.air_date.as_deref().and_then(parse_air_date)
    }

    /// Air year, also available when the catalogue only lists a year.
    pub fn production_year(&self) -> Option<i32> {
        self.air_date.as_deref().and_then(air_year)
    }
}

impl fmt::Display for EpisodeRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<Episode #{}: {}>", self.id, self.original_title)
    }
}

/// A catalogued series, season or movie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    /// Catalogue id.
    pub id: SubjectId,
    /// Original-language name.
    pub original_name: String,
    /// Localized name, if any.
    pub localized_name: Option<String>,
    /// First air date.
    pub air_date: Option<String>,
    /// Number of main-run episodes, when known.
    pub episode_count: Option<u32>,
    /// Synopsis.
    pub summary: Option<String>,
}

impl Subject {
    /// The name to display under the given preference.
    pub fn name(&self, pref: TitlePreference) -> &str {
        pick_title(&self.original_name, self.localized_name.as_deref(), pref)
    }

    /// Parsed first air date.
    pub fn premiere_date(&self) -> Option<NaiveDate> {
        self.air_date.as_deref().and_then(parse_air_date)
    }
}

/// Kind of link between two subjects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationKind {
    /// The related subject continues this one.
    Sequel,
    /// The related subject precedes this one.
    Prequel,
    /// Any other relation, with the catalogue's label.
    Other(String),
}

impl RelationKind {
    /// Map a catalogue relation label. Chinese and English labels are accepted.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "续集" | "Sequel" | "sequel" => Self::Sequel,
            "前传" | "Prequel" | "prequel" => Self::Prequel,
            other => Self::Other(other.to_string()),
        }
    }
}

/// An entry of a subject's related-subject list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelatedSubject {
    /// Id of the related subject.
    pub id: SubjectId,
    /// How it relates to the subject the list was fetched for.
    pub relation: RelationKind,
}
