use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

use moodlist::engine::{GenerateOptions, SpotifyEngine};
use moodlist::mood::MoodCatalog;
use moodlist::spotify::AccessToken;
use moodlist::{Config, Error};

#[tokio::main]
async fn main() -> Result<()> {
    // ── Logging setup ────────────────────────────────────────────────────────
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("moodlist=info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // ── Mood argument ────────────────────────────────────────────────────────
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("usage: moodlist <mood>");
        eprintln!("  e.g. moodlist happy");
        eprintln!("       moodlist \"rainy sunday\"   (needs MOODLIST_STRICT=false)");
        std::process::exit(2);
    }
    let mood_input = args.join(" ");

    // ── Load config ──────────────────────────────────────────────────────────
    let config = Config::load().context("failed to load configuration")?;
    let catalog = match &config.mood_table {
        Some(path) => MoodCatalog::from_json_file(path)?,
        None => MoodCatalog::builtin(),
    };
    tracing::info!(moods = catalog.len(), "mood catalog loaded");

    let mut token = AccessToken::new(config.access_token.clone());
    if let Some(ref refresh) = config.refresh_token {
        token = token.with_refresh_token(refresh.clone());
    }

    // ── Generate ─────────────────────────────────────────────────────────────
    let engine = SpotifyEngine::with_spotify(catalog, &config)?;
    let options = GenerateOptions::from_config(&config);

    match engine
        .generate(&mood_input, &token, &config.user_id, &options)
        .await
    {
        Ok(playlist) => {
            println!(
                "Created \"{}\" with {} tracks",
                playlist.name,
                playlist.track_uris.len()
            );
            println!("https://open.spotify.com/playlist/{}", playlist.id);
            Ok(())
        }
        Err(e) => {
            tracing::error!(stage = %e.stage, error = %e.source, "generation failed");
            eprintln!("moodlist failed at {}: {}", e.stage, e.source);
            if let Error::Publish {
                playlist_id: Some(id),
                ..
            } = &e.source
            {
                eprintln!("note: playlist {id} was already created and was left in place");
            }
            std::process::exit(1);
        }
    }
}
