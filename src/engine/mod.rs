//! Request orchestration: one generate() call walks the pipeline
//! resolve mood -> fetch candidates -> fetch features -> select -> publish.
//!
//! Each arrow is one component call. The engine never retries a stage (the
//! HTTP layer owns the bounded retry) and never reclassifies an error; it
//! only records which stage failed.

use std::sync::Arc;

use strum_macros::Display;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::mood::MoodCatalog;
use crate::selector;
use crate::spotify::features::Features;
use crate::spotify::playlist::Playlists;
use crate::spotify::search::Search;
use crate::spotify::{
    AccessToken, FeatureSource, Playlist, PlaylistDraft, PlaylistStore, SourceStrategy,
    SpotifyClient, TrackSource,
};

/// Per-request knobs. One value per request; the engine itself is reusable
/// across requests.
#[derive(Debug, Clone, Copy)]
pub struct GenerateOptions {
    pub desired_count: usize,
    pub strict: bool,
    pub strategy: SourceStrategy,
    pub public: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        GenerateOptions {
            desired_count: 20,
            strict: true,
            strategy: SourceStrategy::Search,
            public: false,
        }
    }
}

impl GenerateOptions {
    pub fn from_config(config: &Config) -> Self {
        GenerateOptions {
            desired_count: config.desired_count,
            strict: config.strict,
            strategy: config.strategy,
            public: false,
        }
    }
}

/// Pipeline stage a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Stage {
    ResolveMood,
    FetchCandidates,
    FetchFeatures,
    Select,
    Publish,
}

/// A typed engine error plus the stage it happened in. The kind is carried
/// through unchanged so callers can decide whether a retry is safe.
#[derive(Debug, Error)]
#[error("generation failed at {stage}: {source}")]
pub struct GenerateError {
    pub stage: Stage,
    #[source]
    pub source: Error,
}

fn at(stage: Stage) -> impl Fn(Error) -> GenerateError {
    move |source| GenerateError { stage, source }
}

/// The mood-to-playlist pipeline over abstract collaborators. Production
/// wires the Spotify implementations (see [`Engine::with_spotify`]); tests
/// substitute in-process doubles.
pub struct Engine<S, F, P> {
    catalog: MoodCatalog,
    source: S,
    features: F,
    playlists: P,
}

impl<S, F, P> Engine<S, F, P>
where
    S: TrackSource,
    F: FeatureSource,
    P: PlaylistStore,
{
    pub fn new(catalog: MoodCatalog, source: S, features: F, playlists: P) -> Self {
        Engine {
            catalog,
            source,
            features,
            playlists,
        }
    }

    /// Generate and publish a playlist for a mood descriptor.
    ///
    /// Success may carry zero tracks (an empty candidate pool is not an
    /// error). On a publish failure after the create write, the error
    /// carries the already-created playlist id; the playlist is never
    /// deleted by this engine.
    pub async fn generate(
        &self,
        mood_input: &str,
        token: &AccessToken,
        owner_id: &str,
        options: &GenerateOptions,
    ) -> std::result::Result<Playlist, GenerateError> {
        if token.is_expired() {
            // Not pre-empted: the catalog's 401 is authoritative.
            warn!("access token past its expiry; expecting the catalog to reject it");
        }

        let mood = self
            .catalog
            .resolve(mood_input, options.strict)
            .map_err(at(Stage::ResolveMood))?;
        info!(mood = %mood.display_name, strategy = %options.strategy, "mood resolved");

        let candidates = self
            .source
            .fetch_candidates(token, &mood, options.strategy)
            .await
            .map_err(at(Stage::FetchCandidates))?;
        info!(candidates = candidates.len(), "candidate pool fetched");

        let ids: Vec<String> = candidates.iter().map(|t| t.id.clone()).collect();
        let features = self
            .features
            .fetch_features(token, &ids)
            .await
            .map_err(at(Stage::FetchFeatures))?;

        let picked = selector::select(&mood, &candidates, &features, options.desired_count)
            .map_err(at(Stage::Select))?;
        info!(
            selected = picked.len(),
            desired = options.desired_count,
            "tracks selected"
        );

        let draft = PlaylistDraft {
            name: format!("{} Mood Playlist", mood.display_name),
            description: format!(
                "A playlist for your {} mood",
                mood.display_name.to_lowercase()
            ),
            public: options.public,
        };
        let uris: Vec<String> = picked.iter().map(|t| t.uri.clone()).collect();
        let playlist = self
            .playlists
            .publish(token, owner_id, &draft, &uris)
            .await
            .map_err(at(Stage::Publish))?;
        info!(
            playlist_id = %playlist.id,
            tracks = playlist.track_uris.len(),
            "playlist published"
        );

        Ok(playlist)
    }
}

/// Engine wired to the Spotify Web API implementations.
pub type SpotifyEngine = Engine<Search, Features, Playlists>;

impl SpotifyEngine {
    pub fn with_spotify(catalog: MoodCatalog, config: &Config) -> Result<Self> {
        let client = Arc::new(SpotifyClient::new(config)?);
        Ok(Engine::new(
            catalog,
            Search::new(Arc::clone(&client)),
            Features::new(Arc::clone(&client)),
            Playlists::new(client),
        ))
    }
}
