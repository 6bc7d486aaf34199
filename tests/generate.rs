//! End-to-end pipeline tests: the engine wired to in-process doubles.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use moodlist::engine::{Engine, GenerateOptions, Stage};
use moodlist::mood::{AudioFeatureSet, MoodCatalog, MoodProfile};
use moodlist::spotify::{
    AccessToken, FeatureSource, Playlist, PlaylistDraft, PlaylistStore, SourceStrategy, Track,
    TrackSource,
};
use moodlist::Error;

// ── Doubles ──────────────────────────────────────────────────────────────

struct StubSource {
    tracks: Vec<Track>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl TrackSource for StubSource {
    async fn fetch_candidates(
        &self,
        _token: &AccessToken,
        _mood: &MoodProfile,
        _strategy: SourceStrategy,
    ) -> moodlist::Result<Vec<Track>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.tracks.clone())
    }
}

struct StubFeatures {
    rows: HashMap<String, AudioFeatureSet>,
    fail_with_status: Option<u16>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl FeatureSource for StubFeatures {
    async fn fetch_features(
        &self,
        _token: &AccessToken,
        ids: &[String],
    ) -> moodlist::Result<Vec<Option<AudioFeatureSet>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = self.fail_with_status {
            return Err(Error::Upstream {
                status,
                message: "stubbed failure".to_string(),
            });
        }
        Ok(ids.iter().map(|id| self.rows.get(id).copied()).collect())
    }
}

#[derive(Default)]
struct PlaylistState {
    creates: AtomicUsize,
    adds: AtomicUsize,
    fail_next_adds: AtomicUsize,
    appended: Mutex<Vec<Vec<String>>>,
}

#[derive(Clone, Default)]
struct StubPlaylists {
    state: Arc<PlaylistState>,
}

#[async_trait]
impl PlaylistStore for StubPlaylists {
    async fn create(
        &self,
        _token: &AccessToken,
        _owner_id: &str,
        draft: &PlaylistDraft,
    ) -> moodlist::Result<Playlist> {
        let n = self.state.creates.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(Playlist {
            id: format!("p{n}"),
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
        uris: &[String],
    ) -> moodlist::Result<()> {
        self.state.adds.fetch_add(1, Ordering::SeqCst);
        let remaining = self.state.fail_next_adds.load(Ordering::SeqCst);
        if remaining > 0 {
            self.state.fail_next_adds.store(remaining - 1, Ordering::SeqCst);
            return Err(Error::Upstream {
                status: 502,
                message: "bad gateway".to_string(),
            });
        }
        self.state.appended.lock().unwrap().push(uris.to_vec());
        Ok(())
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

fn track(id: &str) -> Track {
    Track {
        id: id.to_string(),
        uri: format!("spotify:track:{id}"),
        name: format!("Track {id}"),
        artists: vec!["Artist".to_string()],
    }
}

fn row(energy: f64, valence: f64, danceability: f64) -> AudioFeatureSet {
    AudioFeatureSet {
        energy,
        valence,
        danceability,
        acousticness: 0.5,
        instrumentalness: 0.5,
    }
}

fn token() -> AccessToken {
    AccessToken::new("test-token")
}

fn options(desired_count: usize, strict: bool) -> GenerateOptions {
    GenerateOptions {
        desired_count,
        strict,
        strategy: SourceStrategy::Search,
        public: false,
    }
}

struct Harness {
    engine: Engine<StubSource, StubFeatures, StubPlaylists>,
    source_calls: Arc<AtomicUsize>,
    feature_calls: Arc<AtomicUsize>,
    playlists: StubPlaylists,
}

fn harness(tracks: Vec<Track>, rows: HashMap<String, AudioFeatureSet>) -> Harness {
    let source_calls = Arc::new(AtomicUsize::new(0));
    let feature_calls = Arc::new(AtomicUsize::new(0));
    let playlists = StubPlaylists::default();
    let engine = Engine::new(
        MoodCatalog::builtin(),
        StubSource {
            tracks,
            calls: Arc::clone(&source_calls),
        },
        StubFeatures {
            rows,
            fail_with_status: None,
            calls: Arc::clone(&feature_calls),
        },
        playlists.clone(),
    );
    Harness {
        engine,
        source_calls,
        feature_calls,
        playlists,
    }
}

// ── Tests ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_generates_ordered_playlist_for_known_mood() {
    let tracks = vec![track("t1"), track("t2"), track("t3")];
    let rows = HashMap::from([
        ("t1".to_string(), row(0.8, 0.8, 0.9)),
        ("t2".to_string(), row(0.3, 0.2, 0.1)),
        ("t3".to_string(), row(0.65, 0.75, 0.8)),
    ]);
    let h = harness(tracks, rows);

    let playlist = h
        .engine
        .generate("happy", &token(), "user-1", &options(2, true))
        .await
        .unwrap();

    assert_eq!(playlist.name, "Happy Mood Playlist");
    assert_eq!(playlist.description, "A playlist for your happy mood");
    assert!(!playlist.public);
    assert_eq!(
        playlist.track_uris,
        vec!["spotify:track:t1", "spotify:track:t3"]
    );
    assert_eq!(h.playlists.state.creates.load(Ordering::SeqCst), 1);
    assert_eq!(
        h.playlists.state.appended.lock().unwrap().clone(),
        vec![playlist.track_uris.clone()]
    );
}

#[tokio::test]
async fn test_strict_unknown_mood_fails_before_any_network_call() {
    let h = harness(vec![track("t1")], HashMap::new());

    let err = h
        .engine
        .generate("melancholic jazz", &token(), "user-1", &options(5, true))
        .await
        .unwrap_err();

    assert_eq!(err.stage, Stage::ResolveMood);
    assert!(matches!(err.source, Error::InvalidMood(_)));
    assert_eq!(h.source_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.feature_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.playlists.state.creates.load(Ordering::SeqCst), 0);
    assert_eq!(h.playlists.state.adds.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_permissive_free_text_mood_wildcards_every_track() {
    // No feature rows at all: every row is None, which only a wildcard
    // profile accepts.
    let h = harness(vec![track("a"), track("b"), track("c")], HashMap::new());

    let playlist = h
        .engine
        .generate(" rainy sunday ", &token(), "user-1", &options(5, false))
        .await
        .unwrap();

    assert_eq!(playlist.name, "rainy sunday Mood Playlist");
    assert_eq!(playlist.track_uris.len(), 3);
}

#[tokio::test]
async fn test_missing_feature_rows_are_padding_not_failures() {
    // b has no feature row: excluded from matching, eligible for padding.
    let tracks = vec![track("a"), track("b"), track("c")];
    let rows = HashMap::from([
        ("a".to_string(), row(0.9, 0.9, 0.9)),
        ("c".to_string(), row(0.7, 0.8, 0.6)),
    ]);
    let h = harness(tracks, rows);

    let playlist = h
        .engine
        .generate("happy", &token(), "user-1", &options(3, true))
        .await
        .unwrap();

    assert_eq!(
        playlist.track_uris,
        vec!["spotify:track:a", "spotify:track:c", "spotify:track:b"]
    );
}

#[tokio::test]
async fn test_empty_candidate_pool_publishes_zero_track_playlist() {
    let h = harness(Vec::new(), HashMap::new());

    let playlist = h
        .engine
        .generate("sad", &token(), "user-1", &options(10, true))
        .await
        .unwrap();

    assert!(playlist.track_uris.is_empty());
    assert_eq!(h.playlists.state.creates.load(Ordering::SeqCst), 1);
    // Nothing to append, so the second write never happens.
    assert_eq!(h.playlists.state.adds.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_add_failure_surfaces_created_playlist_id_and_add_can_be_retried() {
    let tracks = vec![track("t1")];
    let rows = HashMap::from([("t1".to_string(), row(0.9, 0.9, 0.9))]);
    let h = harness(tracks, rows);
    h.playlists.state.fail_next_adds.store(1, Ordering::SeqCst);

    let err = h
        .engine
        .generate("happy", &token(), "user-1", &options(1, true))
        .await
        .unwrap_err();

    assert_eq!(err.stage, Stage::Publish);
    let playlist_id = match &err.source {
        Error::Publish {
            playlist_id: Some(id),
            source,
        } => {
            assert!(matches!(**source, Error::Upstream { status: 502, .. }));
            id.clone()
        }
        other => panic!("expected Publish with playlist id, got {other:?}"),
    };
    assert_eq!(playlist_id, "p1");

    // The caller retries the append alone with the same uris: it succeeds
    // and no second playlist is created.
    let uris = vec!["spotify:track:t1".to_string()];
    h.playlists
        .add_tracks(&token(), &playlist_id, &uris)
        .await
        .unwrap();
    assert_eq!(h.playlists.state.creates.load(Ordering::SeqCst), 1);
    assert_eq!(h.playlists.state.appended.lock().unwrap().clone(), vec![uris]);
}

#[tokio::test]
async fn test_create_failure_carries_no_playlist_id() {
    struct FailingCreate;

    #[async_trait]
    impl PlaylistStore for FailingCreate {
        async fn create(
            &self,
            _token: &AccessToken,
            _owner_id: &str,
            _draft: &PlaylistDraft,
        ) -> moodlist::Result<Playlist> {
            Err(Error::Upstream {
                status: 500,
                message: "boom".to_string(),
            })
        }

        async fn add_tracks(
            &self,
            _token: &AccessToken,
            _playlist_id: &str,
            _uris: &[String],
        ) -> moodlist::Result<()> {
            panic!("add_tracks must not be reached when create fails");
        }
    }

    let engine = Engine::new(
        MoodCatalog::builtin(),
        StubSource {
            tracks: vec![track("t1")],
            calls: Arc::new(AtomicUsize::new(0)),
        },
        StubFeatures {
            rows: HashMap::from([("t1".to_string(), row(0.9, 0.9, 0.9))]),
            fail_with_status: None,
            calls: Arc::new(AtomicUsize::new(0)),
        },
        FailingCreate,
    );

    let err = engine
        .generate("happy", &token(), "user-1", &options(1, true))
        .await
        .unwrap_err();

    assert_eq!(err.stage, Stage::Publish);
    assert!(matches!(
        err.source,
        Error::Publish {
            playlist_id: None,
            ..
        }
    ));
}

#[tokio::test]
async fn test_upstream_failure_keeps_its_kind_and_stage() {
    let source_calls = Arc::new(AtomicUsize::new(0));
    let engine = Engine::new(
        MoodCatalog::builtin(),
        StubSource {
            tracks: vec![track("t1")],
            calls: source_calls,
        },
        StubFeatures {
            rows: HashMap::new(),
            fail_with_status: Some(503),
            calls: Arc::new(AtomicUsize::new(0)),
        },
        StubPlaylists::default(),
    );

    let err = engine
        .generate("calm", &token(), "user-1", &options(5, true))
        .await
        .unwrap_err();

    assert_eq!(err.stage, Stage::FetchFeatures);
    assert!(matches!(err.source, Error::Upstream { status: 503, .. }));
}
