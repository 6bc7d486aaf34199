//! Per-endpoint response schemas and the domain types decoded from them.
//!
//! Wire structs mirror the catalog payloads and stay crate-private; only
//! the validated domain types ([`Track`], [`Playlist`]) leave this module.

use serde::{Deserialize, Serialize};

use crate::mood::AudioFeatureSet;

/// A catalog track. External, read-only; never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub uri: String,
    pub name: String,
    pub artists: Vec<String>,
}

/// A created playlist as the engine hands it back: the catalog-assigned id
/// plus the uris appended to it (in order).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: String,
    pub name: String,
    pub description: String,
    pub public: bool,
    pub track_uris: Vec<String>,
}

// ── GET /search?type=track ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    pub tracks: TrackPage,
}

/// One bounded page of tracks, as returned by search and top-tracks.
#[derive(Debug, Deserialize)]
pub(crate) struct TrackPage {
    pub items: Vec<TrackObject>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrackObject {
    // Local files come back with a null id; they carry no features and
    // cannot be re-added to a playlist, so they are dropped on decode.
    pub id: Option<String>,
    pub uri: String,
    pub name: String,
    #[serde(default)]
    pub artists: Vec<ArtistObject>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ArtistObject {
    pub name: String,
}

impl TrackObject {
    pub(crate) fn into_track(self) -> Option<Track> {
        let id = self.id?;
        Some(Track {
            id,
            uri: self.uri,
            name: self.name,
            artists: self.artists.into_iter().map(|a| a.name).collect(),
        })
    }
}

// ── GET /audio-features ──────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct AudioFeaturesEnvelope {
    pub audio_features: Vec<Option<AudioFeatureObject>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AudioFeatureObject {
    pub id: String,
    pub energy: f64,
    pub valence: f64,
    pub danceability: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
}

impl AudioFeatureObject {
    pub(crate) fn into_feature_set(self) -> AudioFeatureSet {
        AudioFeatureSet {
            energy: self.energy,
            valence: self.valence,
            danceability: self.danceability,
            acousticness: self.acousticness,
            instrumentalness: self.instrumentalness,
        }
    }
}

// ── POST /users/{id}/playlists ───────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub(crate) struct PlaylistRecord {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub public: Option<bool>,
}

// ── POST /playlists/{id}/tracks ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[allow(dead_code)] // the snapshot id is decoded for validation, not used
pub(crate) struct SnapshotAck {
    pub snapshot_id: String,
}
