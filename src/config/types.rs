use animatch_common::TitlePreference;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub resolver: ResolverConfig,

    #[serde(default)]
    pub bangumi: BangumiConfig,
}

/// Options passed into every resolution call.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    /// The file name's episode number always wins over a known index
    #[serde(default)]
    pub always_replace_episode_number: bool,

    /// Take the naming tokenizer's episode number before the pattern cascade
    #[serde(default)]
    pub always_get_episode_by_tokenizer: bool,

    /// Accept a cached remote episode id without validating it
    #[serde(default)]
    pub trust_existing_remote_id: bool,

    /// Deadline for a single remote call in milliseconds (default: 30000)
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Which catalogue title to present
    #[serde(default)]
    pub title_preference: TitlePreference,

    /// Upper bound on sequel hops during continuity resolution (default: 16)
    #[serde(default = "default_max_season_hops")]
    pub max_season_hops: usize,
}

impl ResolverConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            always_replace_episode_number: false,
            always_get_episode_by_tokenizer: false,
            trust_existing_remote_id: false,
            request_timeout_ms: default_request_timeout_ms(),
            title_preference: TitlePreference::default(),
            max_season_hops: default_max_season_hops(),
        }
    }
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_max_season_hops() -> usize {
    16
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BangumiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Personal access token, sent as a bearer token when set
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,

    /// Seconds a cached response stays fresh (0 disables caching)
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    #[serde(default = "default_cache_max_entries")]
    pub cache_max_entries: usize,
}

impl Default for BangumiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_agent: default_user_agent(),
            access_token: None,
            requests_per_second: default_requests_per_second(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_max_entries: default_cache_max_entries(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.bgm.tv".to_string()
}

fn default_user_agent() -> String {
    format!(
        "animatch/{} (https://github.com/animatch/animatch)",
        env!("CARGO_PKG_VERSION")
    )
}

fn default_requests_per_second() -> u32 {
    4
}

fn default_cache_ttl_secs() -> u64 {
    600
}

fn default_cache_max_entries() -> usize {
    1024
}
