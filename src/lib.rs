//! Mood-to-playlist generation engine for Spotify.
//!
//! A mood descriptor (one of the built-in taxonomy names, or free text in
//! permissive mode) is resolved to acoustic-feature threshold ranges, a
//! bounded page of candidate tracks is fetched, their audio features are
//! looked up in batches, and the best matches are published as a new
//! playlist on the user's account.
//!
//! Core modules:
//! - [`mood`] - mood taxonomy and threshold resolution
//! - [`selector`] - the filter-and-pad selection algorithm
//! - [`spotify`] - catalog HTTP layer: search, features, playlists
//! - [`engine`] - the request pipeline tying the above together
//!
//! Supporting modules: [`config`] (environment-backed settings) and
//! [`error`] (the typed failure taxonomy).

pub mod config;
pub mod engine;
pub mod error;
pub mod mood;
pub mod selector;
pub mod spotify;

pub use config::Config;
pub use engine::{Engine, GenerateError, GenerateOptions, SpotifyEngine, Stage};
pub use error::{Error, Result};
