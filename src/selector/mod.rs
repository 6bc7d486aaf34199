//! Filter-and-pad track selection.
//!
//! The candidate order supplied by the catalog is the tie-break everywhere:
//! matching tracks keep it, padding keeps it, and truncation takes a prefix
//! of it. Identical inputs always produce the identical output list.

use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::mood::{AudioFeatureSet, MoodProfile};
use crate::spotify::Track;

/// Pick at most `desired_count` tracks for a mood.
///
/// `features` must be aligned with `tracks` by index; a length mismatch is
/// an invariant violation, not a recoverable condition. Tracks whose feature
/// row is `None` never match but stay eligible for padding. The result is
/// duplicate-free by track id.
pub fn select(
    mood: &MoodProfile,
    tracks: &[Track],
    features: &[Option<AudioFeatureSet>],
    desired_count: usize,
) -> Result<Vec<Track>> {
    if tracks.len() != features.len() {
        return Err(Error::Internal(format!(
            "candidate/feature length mismatch: {} tracks, {} feature rows",
            tracks.len(),
            features.len()
        )));
    }

    let mut picked: Vec<Track> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for (track, row) in tracks.iter().zip(features) {
        if picked.len() == desired_count {
            break;
        }
        if mood.matches(row.as_ref()) && seen.insert(&track.id) {
            picked.push(track.clone());
        }
    }

    // Undersized matching set: pad with the remaining tracks, still in
    // catalog order, until the count is reached or the pool runs out.
    if picked.len() < desired_count {
        for track in tracks {
            if picked.len() == desired_count {
                break;
            }
            if seen.insert(&track.id) {
                picked.push(track.clone());
            }
        }
    }

    Ok(picked)
}
