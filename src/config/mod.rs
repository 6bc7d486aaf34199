//! Environment-backed configuration, loaded once at startup.
//!
//! Catalog credentials use the `SPOTIFY_*` names the session provider
//! exports; engine tuning knobs use `MOODLIST_*`.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use dotenvy::dotenv;

use crate::error::{Error, Result};
use crate::spotify::SourceStrategy;

#[derive(Debug, Clone)]
pub struct Config {
    /// Bearer token issued by the authentication collaborator. Required.
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Catalog user id owning the created playlists. Required.
    pub user_id: String,

    pub api_base: String,
    pub page_size: u32,
    pub desired_count: usize,
    pub strategy: SourceStrategy,
    /// Strict mode rejects moods outside the taxonomy; permissive mode
    /// turns free text into a wildcard mood.
    pub strict: bool,
    /// Disable for catalogs without the batched audio-features endpoint;
    /// the fetcher then fans out per-id requests instead.
    pub batched_features: bool,
    pub request_timeout: Duration,
    /// Optional JSON file replacing the built-in mood table.
    pub mood_table: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            access_token: String::new(),
            refresh_token: None,
            user_id: String::new(),
            api_base: "https://api.spotify.com/v1".to_string(),
            page_size: 50,
            desired_count: 20,
            strategy: SourceStrategy::Search,
            strict: true,
            batched_features: true,
            request_timeout: Duration::from_secs(10),
            mood_table: None,
        }
    }
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| Error::Config(format!("{key} is missing from .env or environment")))
}

fn parsed<T: FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| Error::Config(format!("{key} has invalid value {raw:?}"))),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenv().ok(); // .env is optional; env vars may be set directly

        let defaults = Config::default();
        Ok(Config {
            access_token: required("SPOTIFY_ACCESS_TOKEN")?,
            refresh_token: std::env::var("SPOTIFY_REFRESH_TOKEN").ok(),
            user_id: required("SPOTIFY_USER_ID")?,
            api_base: std::env::var("MOODLIST_API_BASE").unwrap_or(defaults.api_base),
            page_size: parsed("MOODLIST_PAGE_SIZE", defaults.page_size)?,
            desired_count: parsed("MOODLIST_DESIRED_COUNT", defaults.desired_count)?,
            strategy: parsed("MOODLIST_STRATEGY", defaults.strategy)?,
            strict: parsed("MOODLIST_STRICT", defaults.strict)?,
            batched_features: parsed("MOODLIST_BATCH_FEATURES", defaults.batched_features)?,
            request_timeout: Duration::from_secs(parsed(
                "MOODLIST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
            mood_table: std::env::var("MOODLIST_MOOD_FILE").ok().map(PathBuf::from),
        })
    }
}
