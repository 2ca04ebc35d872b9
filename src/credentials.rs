//! Client credentials and access-token state.
//!
//! Pure data with invariant-enforcing mutators; nothing here performs I/O.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Duration, Utc};

use crate::error::{PmsError, Result};

/// Seconds shaved off the server-reported lifetime so a token is renewed
/// before the server starts rejecting it.
pub const EXPIRY_MARGIN_SECS: i64 = 30;

const DEFAULT_TOKEN_TYPE: &str = "Bearer";

/// OAuth2 client-credentials pair.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    client_id: String,
    client_secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn set_client_id(&mut self, client_id: impl Into<String>) {
        self.client_id = client_id.into();
    }

    pub fn set_client_secret(&mut self, client_secret: impl Into<String>) {
        self.client_secret = client_secret.into();
    }

    /// `Authorization` header value for the token endpoint.
    pub fn basic_auth_header(&self) -> String {
        let pair = format!("{}:{}", self.client_id, self.client_secret);
        format!("Basic {}", STANDARD.encode(pair))
    }
}

/// A usable access token, as attached to resource requests.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub token: String,
    pub token_type: String,
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessToken")
            .field("token_type", &self.token_type)
            .finish_non_exhaustive()
    }
}

impl AccessToken {
    /// `Authorization` header value, e.g. `Bearer abc123`.
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.token)
    }
}

/// The currently held token and when it stops being usable.
///
/// An empty access token, or a missing expiry, means no valid token is held.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenState {
    access_token: String,
    token_type: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Default for TokenState {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            token_type: DEFAULT_TOKEN_TYPE.to_string(),
            expires_at: None,
        }
    }
}

impl fmt::Debug for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenState")
            .field("has_token", &!self.access_token.is_empty())
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl TokenState {
    pub fn is_empty(&self) -> bool {
        self.access_token.is_empty()
    }

    /// Expiry is inclusive: a token is expired at exactly `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at,
            None => true,
        }
    }

    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        !self.is_empty() && !self.is_expired(now)
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// The held token, regardless of expiry. `None` when empty.
    pub fn access_token(&self) -> Option<AccessToken> {
        if self.is_empty() {
            return None;
        }
        Some(AccessToken {
            token: self.access_token.clone(),
            token_type: self.token_type.clone(),
        })
    }

    /// Forget the held token.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Record a freshly granted token.
    ///
    /// `expires_in` is the lifetime reported by the server; the stored expiry
    /// is `now + expires_in - EXPIRY_MARGIN_SECS`. A lower-case `bearer`
    /// token type is normalized to `Bearer`.
    ///
    /// # Errors
    ///
    /// Returns [`PmsError::Auth`] if the expiry is not representable; the
    /// state is left untouched in that case.
    pub fn store_grant(
        &mut self,
        access_token: impl Into<String>,
        token_type: &str,
        expires_in: i64,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let expires_at = expires_in
            .checked_sub(EXPIRY_MARGIN_SECS)
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                PmsError::auth(format!("token lifetime out of range: {expires_in}"), None)
            })?;

        self.access_token = access_token.into();
        self.token_type = if token_type == "bearer" {
            DEFAULT_TOKEN_TYPE.to_string()
        } else {
            token_type.to_string()
        };
        self.expires_at = Some(expires_at);
        Ok(())
    }

    /// Install a token obtained elsewhere. The expiry is taken as given.
    pub fn set(
        &mut self,
        access_token: impl Into<String>,
        token_type: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) {
        self.access_token = access_token.into();
        self.token_type = token_type.into();
        self.expires_at = Some(expires_at);
    }
}
