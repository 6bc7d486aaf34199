//! Playlist creation and track appends.
//!
//! Two independent writes against the catalog. There is no rollback: a
//! playlist that was created stays created even if the append fails, and
//! the append endpoint is additive, so re-sending the same uris duplicates
//! them. The partial-failure bookkeeping lives in
//! [`PlaylistStore::publish`](crate::spotify::PlaylistStore::publish).

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use crate::error::Result;
use crate::spotify::models::{Playlist, PlaylistRecord, SnapshotAck};
use crate::spotify::{AccessToken, PlaylistStore, SpotifyClient};

/// What to create: name, description, visibility.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaylistDraft {
    pub name: String,
    pub description: String,
    pub public: bool,
}

pub struct Playlists {
    client: Arc<SpotifyClient>,
}

impl Playlists {
    pub fn new(client: Arc<SpotifyClient>) -> Self {
        Playlists { client }
    }
}

#[async_trait]
impl PlaylistStore for Playlists {
    async fn create(
        &self,
        token: &AccessToken,
        owner_id: &str,
        draft: &PlaylistDraft,
    ) -> Result<Playlist> {
        let url = self.client.endpoint(&format!("users/{owner_id}/playlists"));
        let record: PlaylistRecord = self.client.post_json(token, &url, draft).await?;
        info!(playlist_id = %record.id, name = %record.name, "playlist created");
        Ok(Playlist {
            id: record.id,
            name: record.name,
            description: record.description.unwrap_or_else(|| draft.description.clone()),
            public: record.public.unwrap_or(draft.public),
            track_uris: Vec::new(),
        })
    }

    async fn add_tracks(&self, token: &AccessToken, playlist_id: &str, uris: &[String]) -> Result<()> {
        let url = self.client.endpoint(&format!("playlists/{playlist_id}/tracks"));
        let body = json!({ "uris": uris });
        let _ack: SnapshotAck = self.client.post_json(token, &url, &body).await?;
        info!(%playlist_id, count = uris.len(), "tracks appended");
        Ok(())
    }
}
