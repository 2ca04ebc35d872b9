//! OAuth2 client-credentials token management.
//!
//! The [`TokenManager`] hands out a valid access token, renewing it through
//! the token endpoint when none is held or the held one has expired.
//!
//! The token state is shared between clones of a client. The lock guarding
//! it is never held across an `.await`, so two callers that both observe an
//! expired token will each renew; the last grant to arrive wins.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::credentials::{AccessToken, Credentials, TokenState};
use crate::error::{numeric_code, PmsError, Result};
use crate::transport::{RequestBody, ResponseBody, Transport, TransportRequest};

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// [`Clock`] reading the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Token endpoint response: either a grant or an in-band rejection.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TokenResponse {
    Rejected { error: TokenRejection },
    Granted(TokenGrant),
}

#[derive(Debug, Deserialize)]
struct TokenGrant {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct TokenRejection {
    #[serde(default)]
    code: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

struct AuthState {
    credentials: Credentials,
    token: TokenState,
}

/// Obtains and caches access tokens.
#[derive(Clone)]
pub(crate) struct TokenManager {
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    auth_url: Arc<Url>,
    state: Arc<RwLock<AuthState>>,
}

impl fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("TokenManager")
            .field("auth_url", &self.auth_url.as_str())
            .field("credentials", &state.credentials)
            .field("token", &state.token)
            .finish()
    }
}

impl TokenManager {
    pub(crate) fn new(
        credentials: Credentials,
        auth_url: Url,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transport,
            clock,
            auth_url: Arc::new(auth_url),
            state: Arc::new(RwLock::new(AuthState {
                credentials,
                token: TokenState::default(),
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, AuthState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, AuthState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    pub(crate) fn set_client_id(&self, client_id: String) {
        self.write().credentials.set_client_id(client_id);
    }

    pub(crate) fn set_client_secret(&self, client_secret: String) {
        self.write().credentials.set_client_secret(client_secret);
    }

    pub(crate) fn set_token(&self, token: String, token_type: String, expires_at: DateTime<Utc>) {
        self.write().token.set(token, token_type, expires_at);
    }

    pub(crate) fn is_token_expired(&self) -> bool {
        self.read().token.is_expired(self.clock.now())
    }

    pub(crate) fn token_state(&self) -> TokenState {
        self.read().token.clone()
    }

    /// Return the cached token, renewing it first when missing or expired.
    ///
    /// # Errors
    ///
    /// Returns [`PmsError::Auth`] if renewal fails.
    pub(crate) async fn valid_token(&self) -> Result<AccessToken> {
        let now = self.clock.now();
        let cached = {
            let state = self.read();
            if state.token.is_valid(now) {
                state.token.access_token()
            } else {
                None
            }
        };

        match cached {
            Some(token) => {
                tracing::debug!("reusing cached access token");
                Ok(token)
            }
            None => self.renew().await,
        }
    }

    #[tracing::instrument(skip(self), fields(auth_url = %self.auth_url))]
    async fn renew(&self) -> Result<AccessToken> {
        let basic_auth = {
            let mut state = self.write();
            state.token.reset();
            state.credentials.basic_auth_header()
        };

        let request = TransportRequest::new(Method::POST, (*self.auth_url).clone())
            .header(AUTHORIZATION.as_str(), basic_auth)
            .body(RequestBody::Form(vec![(
                "grant_type".to_string(),
                "client_credentials".to_string(),
            )]));

        let body = match self.transport.send(request).await {
            Ok(response) => response.body,
            // An error status that still carries a structured rejection is a
            // business failure, not a transport one.
            Err(err) => match err.response {
                Some(response) if has_error_field(&response.body) => response.body,
                _ => return Err(PmsError::auth(err.message, None)),
            },
        };

        let parsed: TokenResponse = serde_json::from_value(body.into_json())
            .map_err(|e| PmsError::auth(format!("unexpected token response: {e}"), None))?;

        match parsed {
            TokenResponse::Rejected { error } => {
                let code = error.code.as_ref().and_then(numeric_code);
                tracing::warn!(?code, "token request rejected");
                Err(PmsError::auth(
                    error.message.unwrap_or_else(|| "token request rejected".to_string()),
                    code,
                ))
            }
            TokenResponse::Granted(grant) => {
                let now = self.clock.now();
                let mut state = self.write();
                state.token.store_grant(
                    grant.access_token,
                    grant.token_type.as_deref().unwrap_or("Bearer"),
                    grant.expires_in,
                    now,
                )?;
                tracing::debug!(expires_at = ?state.token.expires_at(), "access token renewed");
                state
                    .token
                    .access_token()
                    .ok_or_else(|| PmsError::auth("token endpoint returned an empty token", None))
            }
        }
    }
}

fn has_error_field(body: &ResponseBody) -> bool {
    body.as_json()
        .and_then(Value::as_object)
        .is_some_and(|obj| obj.contains_key("error"))
}
