//! Bangumi (bgm.tv) metadata service.
//!
//! Implements [`MetadataService`] against the bgm.tv v0 REST API.
//!
//! Features:
//! - Token-bucket rate limiting via [`governor`] (default 4 requests / second).
//! - Automatic retry on HTTP 429 with `Retry-After` header support (max 3 retries).
//! - Episode lists are paginated until the reported `total` is reached.
//! - 404 maps to `None` / an empty list; 5xx and transport failures are
//!   retryable [`Error::Remote`]s.

use std::num::NonZeroU32;
use std::time::Duration;

use animatch_common::{
    EpisodeId, EpisodeRecord, EpisodeType, Error, RelatedSubject, RelationKind, Result, Subject,
    SubjectId,
};
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::BangumiConfig;
use crate::metadata::provider::MetadataService;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MAX_RETRIES: u32 = 3;
const PAGE_SIZE: usize = 100;

// ---------------------------------------------------------------------------
// Bangumi API response types (private)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct BgmPaged<T> {
    #[serde(default)]
    total: usize,
    #[serde(default)]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct BgmEpisode {
    id: u64,
    #[serde(default)]
    subject_id: Option<u64>,
    #[serde(rename = "type", default)]
    episode_type: u8,
    #[serde(default)]
    name: String,
    #[serde(default)]
    name_cn: Option<String>,
    /// Usually a number; kept raw so a bad value only drops this episode.
    #[serde(default)]
    sort: serde_json::Value,
    #[serde(default)]
    ep: Option<f64>,
    #[serde(default)]
    airdate: Option<String>,
    #[serde(default)]
    desc: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BgmSubject {
    id: u64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    name_cn: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    eps: Option<u32>,
    #[serde(default)]
    total_episodes: Option<u32>,
    #[serde(default)]
    summary: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BgmRelatedSubject {
    id: u64,
    #[serde(default)]
    relation: String,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

fn sort_value(raw: &serde_json::Value) -> Option<f64> {
    let value: Option<f64> = match raw {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    value.filter(|n| n.is_finite())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Decode the HTML entities the catalogue leaves in names.
pub(crate) fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }

    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(start) = rest.find('&') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let decoded = tail.find(';').filter(|end| *end <= 10).and_then(|end| {
            let entity = &tail[1..end];
            let ch = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some('\u{a0}'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|dec| dec.parse().ok()))
                    .and_then(char::from_u32),
            };
            ch.map(|c| (c, end))
        });
        match decoded {
            Some((ch, end)) => {
                out.push(ch);
                rest = &tail[end + 1..];
            }
            None => {
                out.push('&');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

impl BgmEpisode {
    fn into_record(self, fallback_subject: SubjectId) -> Option<EpisodeRecord> {
        let Some(order) = sort_value(&self.sort) else {
            warn!(
                episode_id = self.id,
                sort = %self.sort,
                "Skipping episode with non-numeric sort"
            );
            return None;
        };

        Some(EpisodeRecord {
            id: EpisodeId::new(self.id),
            parent_subject_id: self
                .subject_id
                .map(SubjectId::new)
                .unwrap_or(fallback_subject),
            episode_type: EpisodeType::from_code(self.episode_type),
            order,
            index_within_subject: self.ep.unwrap_or(0.0),
            original_title: decode_entities(&self.name),
            localized_title: non_empty(self.name_cn).map(|n| decode_entities(&n)),
            air_date: non_empty(self.airdate),
            description: non_empty(self.desc),
        })
    }
}

impl From<BgmSubject> for Subject {
    fn from(s: BgmSubject) -> Self {
        Self {
            id: SubjectId::new(s.id),
            original_name: decode_entities(&s.name),
            localized_name: non_empty(s.name_cn).map(|n| decode_entities(&n)),
            air_date: non_empty(s.date),
            episode_count: s.total_episodes.or(s.eps).filter(|n| *n > 0),
            summary: non_empty(s.summary),
        }
    }
}

// ---------------------------------------------------------------------------
// Client implementation
// ---------------------------------------------------------------------------

/// Bangumi catalogue client.
///
/// # Examples
///
/// ```no_run
/// use animatch::config::BangumiConfig;
/// use animatch::metadata::BangumiClient;
/// use std::time::Duration;
///
/// let client = BangumiClient::new(&BangumiConfig::default(), Duration::from_secs(30)).unwrap();
/// ```
pub struct BangumiClient {
    client: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
    timeout: Duration,
    rate_limiter: governor::RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl BangumiClient {
    /// Create a client from the `[bangumi]` configuration.
    ///
    /// `timeout` bounds each HTTP request, including retries' individual
    /// attempts.
    pub fn new(config: &BangumiConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::invalid_input(format!("failed to build HTTP client: {e}")))?;

        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(per_second));

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone().filter(|t| !t.is_empty()),
            timeout,
            rate_limiter,
        })
    }

    /// Build a full API URL with query parameters.
    fn url(&self, path: &str, params: &[(&str, String)]) -> String {
        let mut url = format!("{}{path}", self.base_url);
        for (i, (key, value)) in params.iter().enumerate() {
            url.push(if i == 0 { '?' } else { '&' });
            url.push_str(key);
            url.push('=');
            url.push_str(value);
        }
        url
    }

    /// Execute a GET request with rate limiting and 429-retry logic.
    ///
    /// Returns `None` on 404.
    async fn get(&self, url: &str) -> Result<Option<reqwest::Response>> {
        let mut retries = 0u32;
        loop {
            self.rate_limiter.until_ready().await;

            let mut request = self.client.get(url);
            if let Some(ref token) = self.access_token {
                request = request.bearer_auth(token);
            }

            let resp = request.send().await.map_err(|e| self.transport_error(url, e))?;
            let status = resp.status();

            if status == StatusCode::TOO_MANY_REQUESTS && retries < MAX_RETRIES {
                retries += 1;
                let wait = resp
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(1);
                warn!(
                    retry = retries,
                    wait_secs = wait,
                    "Bangumi returned 429, backing off"
                );
                tokio::time::sleep(Duration::from_secs(wait)).await;
                continue;
            }

            if status == StatusCode::NOT_FOUND {
                debug!(url = %url, "Bangumi returned 404");
                return Ok(None);
            }

            if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                return Err(Error::remote(format!("{status} from {url}")));
            }

            if !status.is_success() {
                return Err(Error::invalid_input(format!("{status} from {url}")));
            }

            return Ok(Some(resp));
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<Option<T>> {
        let Some(resp) = self.get(url).await? else {
            return Ok(None);
        };
        let body = resp.bytes().await.map_err(|e| self.transport_error(url, e))?;
        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|e| Error::malformed(format!("{url}: {e}")))
    }

    fn transport_error(&self, url: &str, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            warn!(url = %url, "Bangumi request timed out");
            Error::Timeout(self.timeout.as_millis() as u64)
        } else {
            Error::remote(format!("request failed: {url}: {e}"))
        }
    }
}

#[async_trait]
impl MetadataService for BangumiClient {
    fn name(&self) -> &'static str {
        "bangumi"
    }

    async fn list_episodes(
        &self,
        subject_id: SubjectId,
        type_filter: Option<EpisodeType>,
        index_hint: f64,
    ) -> Result<Vec<EpisodeRecord>> {
        let mut records = Vec::new();
        let mut offset = 0usize;

        loop {
            let mut params = vec![("subject_id", subject_id.to_string())];
            if let Some(episode_type) = type_filter {
                params.push(("type", episode_type.code().to_string()));
            }
            params.push(("limit", PAGE_SIZE.to_string()));
            params.push(("offset", offset.to_string()));

            let url = self.url("/v0/episodes", &params);
            debug!(url = %url, index_hint, "Bangumi list episodes");

            let Some(page) = self.get_json::<BgmPaged<BgmEpisode>>(&url).await? else {
                break;
            };
            let fetched = page.data.len();
            records.extend(
                page.data
                    .into_iter()
                    .filter_map(|e| e.into_record(subject_id)),
            );

            offset += fetched;
            if fetched == 0 || offset >= page.total {
                break;
            }
        }

        Ok(records)
    }

    async fn get_episode(&self, episode_id: EpisodeId) -> Result<Option<EpisodeRecord>> {
        let url = self.url(&format!("/v0/episodes/{episode_id}"), &[]);
        debug!(url = %url, "Bangumi get episode");

        let episode: Option<BgmEpisode> = self.get_json(&url).await?;
        Ok(episode.and_then(|e| e.into_record(SubjectId::default())))
    }

    async fn get_subject(&self, subject_id: SubjectId) -> Result<Option<Subject>> {
        let url = self.url(&format!("/v0/subjects/{subject_id}"), &[]);
        debug!(url = %url, "Bangumi get subject");

        let subject: Option<BgmSubject> = self.get_json(&url).await?;
        Ok(subject.map(Subject::from))
    }

    async fn get_related_subjects(&self, subject_id: SubjectId) -> Result<Vec<RelatedSubject>> {
        let url = self.url(&format!("/v0/subjects/{subject_id}/subjects"), &[]);
        debug!(url = %url, "Bangumi get related subjects");

        let related: Option<Vec<BgmRelatedSubject>> = self.get_json(&url).await?;
        Ok(related
            .unwrap_or_default()
            .into_iter()
            .map(|r| RelatedSubject {
                id: SubjectId::new(r.id),
                relation: RelationKind::from_label(&r.relation),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sort_values() {
        assert_eq!(sort_value(&serde_json::json!(3)), Some(3.0));
        assert_eq!(sort_value(&serde_json::json!(12.5)), Some(12.5));
        assert_eq!(sort_value(&serde_json::json!("7")), Some(7.0));
        assert_eq!(sort_value(&serde_json::json!("SP")), None);
        assert_eq!(sort_value(&serde_json::Value::Null), None);
    }

    #[test]
    fn entities_are_decoded() {
        assert_eq!(decode_entities("Fate&#x2F;Zero"), "Fate/Zero");
        assert_eq!(decode_entities("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(decode_entities("&quot;Hi&quot; &#39;there&#39;"), "\"Hi\" 'there'");
        assert_eq!(decode_entities("R&D"), "R&D");
        assert_eq!(decode_entities("plain"), "plain");
    }

    #[test]
    fn episode_conversion() {
        let raw: BgmEpisode = serde_json::from_value(serde_json::json!({
            "id": 1001,
            "type": 0,
            "name": "WHITE ALBUM",
            "name_cn": "",
            "sort": 1,
            "ep": 1,
            "airdate": "2013-10-06",
            "desc": ""
        }))
        .unwrap();
        let record = raw.into_record(SubjectId::new(69496)).unwrap();
        assert_eq!(record.id, EpisodeId::new(1001));
        assert_eq!(record.parent_subject_id, SubjectId::new(69496));
        assert_eq!(record.episode_type, EpisodeType::Normal);
        assert_eq!(record.order, 1.0);
        assert_eq!(record.localized_title, None);
        assert_eq!(record.description, None);
    }

    #[test]
    fn url_building() {
        let client = BangumiClient::new(&BangumiConfig::default(), Duration::from_secs(1)).unwrap();
        assert_eq!(
            client.url("/v0/episodes", &[("subject_id", "1".into()), ("limit", "100".into())]),
            "https://api.bgm.tv/v0/episodes?subject_id=1&limit=100"
        );
        assert_eq!(
            client.url("/v0/subjects/1", &[]),
            "https://api.bgm.tv/v0/subjects/1"
        );
    }
}
