//! Bearer-token handle supplied by the authentication collaborator.
//!
//! The engine never performs the OAuth handshake and never refreshes a
//! token. An expired token is not pre-empted here: the catalog's 401 is the
//! source of truth and surfaces as [`crate::error::Error::Unauthorized`].

use chrono::{DateTime, Utc};

/// Read-only access token, with the optional refresh token and expiry the
/// session provider handed over alongside it.
#[derive(Clone)]
pub struct AccessToken {
    secret: String,
    refresh_token: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl AccessToken {
    pub fn new(secret: impl Into<String>) -> Self {
        AccessToken {
            secret: secret.into(),
            refresh_token: None,
            expires_at: None,
        }
    }

    pub fn with_refresh_token(mut self, refresh_token: impl Into<String>) -> Self {
        self.refresh_token = Some(refresh_token.into());
        self
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Best-effort staleness check for logging. Unknown expiry counts as
    /// not expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }
}

// Tokens end up in logs via {:?} far too easily; keep the secret out.
impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("secret", &"<redacted>")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}
