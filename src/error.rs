//! Typed error taxonomy for the generation engine.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Unknown mood in strict mode. Raised before any network call.
    #[error("unknown mood: {0:?}")]
    InvalidMood(String),

    /// The catalog rejected the bearer token (401). Never refreshed here;
    /// token lifecycle belongs to the authentication collaborator.
    #[error("access token rejected by the catalog")]
    Unauthorized,

    /// Connection or timeout failure before a response arrived.
    #[error("network error: {0}")]
    Transport(String),

    /// Non-2xx response from the catalog.
    #[error("catalog error {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Response body did not match the endpoint schema.
    #[error("malformed catalog response: {0}")]
    Decode(String),

    /// Create or add-tracks failure. `playlist_id` is set when the create
    /// call succeeded and only the append failed; retrying the append alone
    /// is then safe (re-sending the same uris appends duplicates, so callers
    /// must track what was already sent).
    #[error("playlist publish failed: {source}")]
    Publish {
        playlist_id: Option<String>,
        #[source]
        source: Box<Error>,
    },

    /// Invariant violation inside the engine. Fatal, never retried.
    #[error("internal invariant violated: {0}")]
    Internal(String),

    /// Startup-time configuration problem (bad env value, malformed mood
    /// table, min > max range).
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether the bounded retry policy applies: transport failures plus
    /// 429 and 5xx upstream responses. Everything else surfaces immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Transport(_) => true,
            Error::Upstream { status, .. } => *status == 429 || (500..=599).contains(status),
            _ => false,
        }
    }
}
