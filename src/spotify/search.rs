//! Candidate retrieval: mood-keyword search or the user's recent top tracks.

use std::sync::Arc;

use async_trait::async_trait;
use strum_macros::{Display, EnumString};
use tracing::debug;

use crate::error::Result;
use crate::mood::MoodProfile;
use crate::spotify::models::{SearchResponse, Track, TrackObject, TrackPage};
use crate::spotify::{AccessToken, SpotifyClient, TrackSource};

/// Where the candidate pool comes from. Selected by configuration; one
/// strategy per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "kebab-case")]
pub enum SourceStrategy {
    /// Full-text track search on the mood's display name.
    Search,
    /// The authenticated user's top tracks over the recent window.
    TopTracks,
}

pub struct Search {
    client: Arc<SpotifyClient>,
}

impl Search {
    pub fn new(client: Arc<SpotifyClient>) -> Self {
        Search { client }
    }

    async fn search_tracks(&self, token: &AccessToken, query: &str) -> Result<Vec<Track>> {
        let url = self.client.endpoint(&format!(
            "search?q={}&type=track&limit={}",
            urlencoding::encode(query),
            self.client.page_size()
        ));
        debug!(%query, "searching tracks");
        let response: SearchResponse = self.client.get_json(token, &url).await?;
        Ok(collect_tracks(response.tracks))
    }

    async fn top_tracks(&self, token: &AccessToken) -> Result<Vec<Track>> {
        let url = self.client.endpoint(&format!(
            "me/top/tracks?time_range=short_term&limit={}",
            self.client.page_size()
        ));
        debug!("fetching user top tracks");
        let page: TrackPage = self.client.get_json(token, &url).await?;
        Ok(collect_tracks(page))
    }
}

// Catalog order is preserved; it is the tie-break for every later step.
fn collect_tracks(page: TrackPage) -> Vec<Track> {
    page.items
        .into_iter()
        .filter_map(TrackObject::into_track)
        .collect()
}

#[async_trait]
impl TrackSource for Search {
    async fn fetch_candidates(
        &self,
        token: &AccessToken,
        mood: &MoodProfile,
        strategy: SourceStrategy,
    ) -> Result<Vec<Track>> {
        match strategy {
            SourceStrategy::Search => self.search_tracks(token, &mood.display_name).await,
            SourceStrategy::TopTracks => self.top_tracks(token).await,
        }
    }
}
