//! Spotify Web API layer: one shared HTTP client plus per-concern wrappers
//! ([`search::Search`], [`features::Features`], [`playlist::Playlists`]).
//!
//! All calls carry a bearer token and an explicit timeout. Transport
//! failures and 429/5xx responses get exactly one retry with exponential
//! backoff; everything else surfaces immediately as a typed error.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::mood::{AudioFeatureSet, MoodProfile};

pub mod auth;
pub mod features;
pub mod models;
pub mod playlist;
pub mod search;

pub use auth::AccessToken;
pub use models::{Playlist, Track};
pub use playlist::PlaylistDraft;
pub use search::SourceStrategy;

const USER_AGENT: &str = concat!("moodlist/", env!("CARGO_PKG_VERSION"));

/// Bounded retry for transport and throttle failures.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 1,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (zero-based): base * 2^attempt.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt)
    }
}

/// Shared HTTP client for the catalog. Holds no per-request state.
pub struct SpotifyClient {
    http: reqwest::Client,
    base_url: String,
    page_size: u32,
    batched_features: bool,
    retry: RetryPolicy,
}

impl SpotifyClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| Error::Transport(e.to_string()))?;

        Ok(SpotifyClient {
            http,
            base_url: config.api_base.trim_end_matches('/').to_string(),
            page_size: config.page_size,
            batched_features: config.batched_features,
            retry: RetryPolicy::default(),
        })
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub(crate) fn batched_features(&self) -> bool {
        self.batched_features
    }

    pub(crate) fn endpoint(&self, path_and_query: &str) -> String {
        format!("{}/{}", self.base_url, path_and_query)
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        token: &AccessToken,
        url: &str,
    ) -> Result<T> {
        self.request_json(token, Method::GET, url, None::<&()>).await
    }

    pub(crate) async fn post_json<B, T>(&self, token: &AccessToken, url: &str, body: &B) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        self.request_json(token, Method::POST, url, Some(body)).await
    }

    async fn request_json<B, T>(
        &self,
        token: &AccessToken,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let mut attempt = 0u32;
        loop {
            match self.execute(token, method.clone(), url, body).await {
                Err(e) if e.is_retryable() && attempt < self.retry.max_retries => {
                    let delay = self.retry.backoff(attempt);
                    warn!(%url, error = %e, ?delay, "catalog call failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    async fn execute<B, T>(
        &self,
        token: &AccessToken,
        method: Method,
        url: &str,
        body: Option<&B>,
    ) -> Result<T>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.http.request(method, url).bearer_auth(token.secret());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthorized);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        // Decode separately from the transfer so a schema mismatch surfaces
        // as Decode, not as a transport failure.
        let raw = response
            .text()
            .await
            .map_err(|e| Error::Transport(e.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| Error::Decode(e.to_string()))
    }
}

/// Retrieves the bounded, ordered candidate list for a mood.
#[async_trait]
pub trait TrackSource: Send + Sync {
    async fn fetch_candidates(
        &self,
        token: &AccessToken,
        mood: &MoodProfile,
        strategy: SourceStrategy,
    ) -> Result<Vec<Track>>;
}

/// Retrieves acoustic features for a list of track ids. The output is
/// aligned with the input: same length, same order, `None` where the
/// catalog has no features for an id.
#[async_trait]
pub trait FeatureSource: Send + Sync {
    async fn fetch_features(
        &self,
        token: &AccessToken,
        ids: &[String],
    ) -> Result<Vec<Option<AudioFeatureSet>>>;
}

/// Creates playlists and appends tracks. The two writes are independent and
/// not transactional.
#[async_trait]
pub trait PlaylistStore: Send + Sync {
    async fn create(
        &self,
        token: &AccessToken,
        owner_id: &str,
        draft: &PlaylistDraft,
    ) -> Result<Playlist>;

    async fn add_tracks(&self, token: &AccessToken, playlist_id: &str, uris: &[String]) -> Result<()>;

    /// Create-then-append. A failure after the create succeeded surfaces as
    /// [`Error::Publish`] carrying the created playlist id, so a caller can
    /// retry the append alone. A zero-track selection skips the append and
    /// the empty playlist stands as the result.
    async fn publish(
        &self,
        token: &AccessToken,
        owner_id: &str,
        draft: &PlaylistDraft,
        uris: &[String],
    ) -> Result<Playlist> {
        let mut playlist = self.create(token, owner_id, draft).await.map_err(|e| Error::Publish {
            playlist_id: None,
            source: Box::new(e),
        })?;

        if !uris.is_empty() {
            self.add_tracks(token, &playlist.id, uris)
                .await
                .map_err(|e| Error::Publish {
                    playlist_id: Some(playlist.id.clone()),
                    source: Box::new(e),
                })?;
        }

        playlist.track_uris = uris.to_vec();
        Ok(playlist)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Store whose create always succeeds and whose append always fails;
    /// exercises the default `publish` bookkeeping.
    struct HalfBrokenStore;

    #[async_trait]
    impl PlaylistStore for HalfBrokenStore {
        async fn create(
            &self,
            _token: &AccessToken,
            _owner_id: &str,
            draft: &PlaylistDraft,
        ) -> Result<Playlist> {
            Ok(Playlist {
                id: "p1".to_string(),
                name: draft.name.clone(),
                description: draft.description.clone(),
                public: draft.public,
                track_uris: Vec::new(),
            })
        }

        async fn add_tracks(
            &self,
            _token: &AccessToken,
            _playlist_id: &str,
            _uris: &[String],
        ) -> Result<()> {
            Err(Error::Upstream {
                status: 502,
                message: "bad gateway".to_string(),
            })
        }
    }

    fn draft() -> PlaylistDraft {
        PlaylistDraft {
            name: "Calm Mood Playlist".to_string(),
            description: "A playlist for your calm mood".to_string(),
            public: false,
        }
    }

    #[test]
    fn test_publish_wraps_append_failure_with_created_id() {
        let token = AccessToken::new("t");
        let uris = vec!["spotify:track:a".to_string()];
        let err = tokio_test::block_on(HalfBrokenStore.publish(&token, "user-1", &draft(), &uris))
            .unwrap_err();
        match err {
            Error::Publish { playlist_id, source } => {
                assert_eq!(playlist_id.as_deref(), Some("p1"));
                assert!(matches!(*source, Error::Upstream { status: 502, .. }));
            }
            other => panic!("expected Publish, got {other:?}"),
        }
    }

    #[test]
    fn test_publish_skips_the_append_for_an_empty_selection() {
        // add_tracks always fails here, so success proves it was never called.
        let token = AccessToken::new("t");
        let playlist =
            tokio_test::block_on(HalfBrokenStore.publish(&token, "user-1", &draft(), &[])).unwrap();
        assert_eq!(playlist.id, "p1");
        assert!(playlist.track_uris.is_empty());
    }

    #[test]
    fn test_backoff_doubles_from_base_delay() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::from_millis(500));
        assert_eq!(policy.backoff(1), Duration::from_millis(1000));
        assert_eq!(policy.backoff(2), Duration::from_millis(2000));
    }

    #[test]
    fn test_endpoint_joins_without_doubled_slash() {
        let config = Config {
            api_base: "https://api.spotify.com/v1/".to_string(),
            ..Config::default()
        };
        let client = SpotifyClient::new(&config).unwrap();
        assert_eq!(
            client.endpoint("search?q=calm"),
            "https://api.spotify.com/v1/search?q=calm"
        );
    }
}
