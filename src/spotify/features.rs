//! Acoustic-feature lookup for a list of track ids.
//!
//! Primary path is the batched endpoint, chunked at the catalog's 100-id
//! cap. The fallback path (for deployments without the batch endpoint)
//! issues per-id requests with bounded concurrency. Both paths reassemble
//! results by the original index: output order equals input order, always.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::debug;

use crate::error::{Error, Result};
use crate::mood::AudioFeatureSet;
use crate::spotify::models::{AudioFeatureObject, AudioFeaturesEnvelope};
use crate::spotify::{AccessToken, FeatureSource, SpotifyClient};

/// Catalog-imposed maximum ids per batched call.
const BATCH_LIMIT: usize = 100;
/// In-flight cap for the per-id fallback.
const FANOUT_CONCURRENCY: usize = 10;

pub struct Features {
    client: Arc<SpotifyClient>,
}

impl Features {
    pub fn new(client: Arc<SpotifyClient>) -> Self {
        Features { client }
    }

    async fn fetch_batched(
        &self,
        token: &AccessToken,
        ids: &[String],
    ) -> Result<Vec<Option<AudioFeatureObject>>> {
        let mut fetched = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(BATCH_LIMIT) {
            let url = self
                .client
                .endpoint(&format!("audio-features?ids={}", chunk.join(",")));
            let envelope: AudioFeaturesEnvelope = self.client.get_json(token, &url).await?;
            if envelope.audio_features.len() != chunk.len() {
                return Err(Error::Decode(format!(
                    "feature batch returned {} rows for {} ids",
                    envelope.audio_features.len(),
                    chunk.len()
                )));
            }
            fetched.extend(envelope.audio_features);
        }
        Ok(fetched)
    }

    async fn fetch_fanned_out(
        &self,
        token: &AccessToken,
        ids: &[String],
    ) -> Result<Vec<Option<AudioFeatureObject>>> {
        // `buffered` yields in submission order regardless of completion
        // order, which is exactly the reassembly invariant.
        let requests: Vec<_> = ids
            .iter()
            .map(|id| {
                let url = self.client.endpoint(&format!("audio-features/{id}"));
                let client = Arc::clone(&self.client);
                let token = token.clone();
                async move {
                    match client.get_json::<AudioFeatureObject>(&token, &url).await {
                        Ok(features) => Ok(Some(features)),
                        // An id unknown to the catalog is a valid "no features"
                        // answer, not a fetch failure.
                        Err(Error::Upstream { status: 404, .. }) => Ok(None),
                        Err(e) => Err(e),
                    }
                }
            })
            .collect();
        stream::iter(requests)
            .buffered(FANOUT_CONCURRENCY)
            .try_collect()
            .await
    }
}

/// Re-key fetched rows by id and lay them out in the order of `ids`.
/// Defensive against the catalog reordering rows within a batch.
fn align_by_id(
    ids: &[String],
    fetched: Vec<Option<AudioFeatureObject>>,
) -> Vec<Option<AudioFeatureSet>> {
    let mut by_id: HashMap<String, AudioFeatureObject> = fetched
        .into_iter()
        .flatten()
        .map(|f| (f.id.clone(), f))
        .collect();
    ids.iter()
        .map(|id| by_id.remove(id).map(AudioFeatureObject::into_feature_set))
        .collect()
}

#[async_trait]
impl FeatureSource for Features {
    async fn fetch_features(
        &self,
        token: &AccessToken,
        ids: &[String],
    ) -> Result<Vec<Option<AudioFeatureSet>>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let fetched = if self.client.batched_features() {
            self.fetch_batched(token, ids).await?
        } else {
            self.fetch_fanned_out(token, ids).await?
        };

        let aligned = align_by_id(ids, fetched);
        debug!(
            requested = ids.len(),
            resolved = aligned.iter().filter(|f| f.is_some()).count(),
            "feature lookup complete"
        );
        Ok(aligned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(id: &str, energy: f64) -> AudioFeatureObject {
        AudioFeatureObject {
            id: id.to_string(),
            energy,
            valence: 0.5,
            danceability: 0.5,
            acousticness: 0.5,
            instrumentalness: 0.5,
        }
    }

    #[test]
    fn test_align_restores_request_order() {
        let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        // Rows arrive shuffled; alignment must not care.
        let fetched = vec![Some(object("c", 0.3)), Some(object("a", 0.1)), Some(object("b", 0.2))];
        let aligned = align_by_id(&ids, fetched);
        let energies: Vec<Option<f64>> = aligned.iter().map(|f| f.map(|s| s.energy)).collect();
        assert_eq!(energies, vec![Some(0.1), Some(0.2), Some(0.3)]);
    }

    #[test]
    fn test_align_marks_missing_ids_as_none() {
        let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let fetched = vec![Some(object("a", 0.1)), None, Some(object("c", 0.3))];
        let aligned = align_by_id(&ids, fetched);
        assert!(aligned[0].is_some());
        assert!(aligned[1].is_none());
        assert!(aligned[2].is_some());
    }

    #[test]
    fn test_align_output_length_always_matches_input() {
        let ids = vec!["a".to_string(), "b".to_string()];
        // Even a stray row for an id we never asked for cannot change the
        // output shape.
        let fetched = vec![Some(object("z", 0.9))];
        let aligned = align_by_id(&ids, fetched);
        assert_eq!(aligned.len(), 2);
        assert!(aligned.iter().all(|f| f.is_none()));
    }
}
