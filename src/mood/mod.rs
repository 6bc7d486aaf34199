//! Mood taxonomy: named moods mapped to acoustic-feature threshold ranges.
//!
//! The table is immutable after load. It ships with a built-in taxonomy and
//! can be replaced wholesale by a JSON file (see [`MoodCatalog::from_json_file`]).

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

use crate::error::{Error, Result};

/// The acoustic dimensions a mood may constrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum Dimension {
    Energy,
    Valence,
    Danceability,
    Acousticness,
    Instrumentalness,
}

/// Closed interval [min, max] over one acoustic dimension.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRange {
    pub min: f64,
    pub max: f64,
}

impl FeatureRange {
    pub fn new(min: f64, max: f64) -> Self {
        FeatureRange { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    fn is_well_formed(&self) -> bool {
        // NaN bounds fail the comparison and are rejected with the rest.
        self.min <= self.max
    }
}

/// Per-track acoustic feature values, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AudioFeatureSet {
    pub energy: f64,
    pub valence: f64,
    pub danceability: f64,
    pub acousticness: f64,
    pub instrumentalness: f64,
}

impl AudioFeatureSet {
    pub fn value(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::Energy => self.energy,
            Dimension::Valence => self.valence,
            Dimension::Danceability => self.danceability,
            Dimension::Acousticness => self.acousticness,
            Dimension::Instrumentalness => self.instrumentalness,
        }
    }
}

/// One mood's display name and threshold ranges. A dimension left `None`
/// is skipped during filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoodProfile {
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<FeatureRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valence: Option<FeatureRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub danceability: Option<FeatureRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acousticness: Option<FeatureRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrumentalness: Option<FeatureRange>,
}

impl MoodProfile {
    /// A profile with no constraints: every track matches. Used for free-text
    /// moods in permissive mode; the display name is the trimmed input.
    pub fn wildcard(display_name: &str) -> Self {
        MoodProfile {
            display_name: display_name.to_string(),
            energy: None,
            valence: None,
            danceability: None,
            acousticness: None,
            instrumentalness: None,
        }
    }

    pub fn range(&self, dimension: Dimension) -> Option<FeatureRange> {
        match dimension {
            Dimension::Energy => self.energy,
            Dimension::Valence => self.valence,
            Dimension::Danceability => self.danceability,
            Dimension::Acousticness => self.acousticness,
            Dimension::Instrumentalness => self.instrumentalness,
        }
    }

    /// Whether a track's features satisfy every constrained dimension.
    /// A missing feature set fails every constraint, so it only matches a
    /// profile with no constraints at all.
    pub fn matches(&self, features: Option<&AudioFeatureSet>) -> bool {
        Dimension::iter().all(|dimension| match self.range(dimension) {
            None => true,
            Some(range) => features.is_some_and(|f| range.contains(f.value(dimension))),
        })
    }

    fn validate(&self, mood_name: &str) -> Result<()> {
        for dimension in Dimension::iter() {
            if let Some(range) = self.range(dimension) {
                if !range.is_well_formed() {
                    return Err(Error::Config(format!(
                        "mood {mood_name:?}: invalid {dimension} range [{}, {}]",
                        range.min, range.max
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Immutable mood-name -> profile table. Lookup is case-insensitive and
/// whitespace-trimmed; keys are stored normalized.
#[derive(Debug, Clone)]
pub struct MoodCatalog {
    moods: HashMap<String, MoodProfile>,
}

fn range(min: f64, max: f64) -> Option<FeatureRange> {
    Some(FeatureRange::new(min, max))
}

impl MoodCatalog {
    /// The built-in taxonomy. calm and focused additionally constrain
    /// acousticness and instrumentalness respectively.
    pub fn builtin() -> Self {
        let mut moods = HashMap::new();
        moods.insert(
            "happy".to_string(),
            MoodProfile {
                display_name: "Happy".to_string(),
                energy: range(0.6, 1.0),
                valence: range(0.7, 1.0),
                danceability: range(0.5, 1.0),
                acousticness: None,
                instrumentalness: None,
            },
        );
        moods.insert(
            "sad".to_string(),
            MoodProfile {
                display_name: "Sad".to_string(),
                energy: range(0.0, 0.4),
                valence: range(0.0, 0.3),
                danceability: range(0.0, 0.5),
                acousticness: None,
                instrumentalness: None,
            },
        );
        moods.insert(
            "energetic".to_string(),
            MoodProfile {
                display_name: "Energetic".to_string(),
                energy: range(0.8, 1.0),
                valence: range(0.5, 1.0),
                danceability: range(0.7, 1.0),
                acousticness: None,
                instrumentalness: None,
            },
        );
        moods.insert(
            "calm".to_string(),
            MoodProfile {
                display_name: "Calm".to_string(),
                energy: range(0.0, 0.4),
                valence: range(0.3, 0.7),
                danceability: range(0.0, 0.5),
                acousticness: range(0.4, 1.0),
                instrumentalness: None,
            },
        );
        moods.insert(
            "focused".to_string(),
            MoodProfile {
                display_name: "Focused".to_string(),
                energy: range(0.4, 0.7),
                valence: range(0.3, 0.7),
                danceability: range(0.2, 0.6),
                acousticness: None,
                instrumentalness: range(0.2, 1.0),
            },
        );

        // The built-in table is static; a malformed entry is a programming
        // error, so validation failures here would be caught by the tests.
        MoodCatalog { moods }
    }

    /// Build a catalog from raw name -> profile pairs, normalizing names and
    /// rejecting duplicate names and malformed ranges.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, MoodProfile)>) -> Result<Self> {
        let mut moods = HashMap::new();
        for (name, profile) in entries {
            let normalized = name.trim().to_lowercase();
            if normalized.is_empty() {
                return Err(Error::Config("empty mood name in mood table".to_string()));
            }
            profile.validate(&normalized)?;
            if moods.insert(normalized.clone(), profile).is_some() {
                return Err(Error::Config(format!(
                    "duplicate mood name after normalization: {normalized:?}"
                )));
            }
        }
        Ok(MoodCatalog { moods })
    }

    /// Load a replacement taxonomy from a JSON file of the form
    /// `{"happy": {"display_name": "Happy", "energy": {"min": 0.6, "max": 1.0}, ...}, ...}`.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read mood table {}: {e}", path.display())))?;
        let entries: HashMap<String, MoodProfile> = serde_json::from_str(&raw)
            .map_err(|e| Error::Config(format!("malformed mood table {}: {e}", path.display())))?;
        Self::from_entries(entries)
    }

    pub fn len(&self) -> usize {
        self.moods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moods.is_empty()
    }

    /// Resolve a mood descriptor. Strict mode rejects unknown moods;
    /// permissive mode turns them into wildcard profiles so free-text
    /// moods still produce a playlist.
    pub fn resolve(&self, input: &str, strict: bool) -> Result<MoodProfile> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::InvalidMood(input.to_string()));
        }
        if let Some(profile) = self.moods.get(&trimmed.to_lowercase()) {
            return Ok(profile.clone());
        }
        if strict {
            Err(Error::InvalidMood(trimmed.to_string()))
        } else {
            Ok(MoodProfile::wildcard(trimmed))
        }
    }
}
