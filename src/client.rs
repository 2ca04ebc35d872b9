//! BigGo PMS API client.
//!
//! Holds credentials and configuration and owns the request dispatcher every
//! authenticated call goes through. Endpoint-specific operations live on the
//! model types and in [`crate::export`].

use std::env;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use reqwest::header::AUTHORIZATION;
use reqwest::Method;
use serde_json::Value;
use url::Url;

use crate::auth::{Clock, SystemClock, TokenManager};
use crate::credentials::{Credentials, TokenState};
use crate::error::{numeric_code, PmsError, Result};
use crate::fs::{FileSystem, TokioFileSystem};
use crate::transport::{
    ReqwestTransport, RequestBody, ResponseBody, ResponseKind, Transport, TransportRequest,
    TransportResponse,
};

const DEFAULT_API_URL: &str = "https://api.biggo.com/api/v1/pms";
const DEFAULT_AUTH_URL: &str = "https://api.biggo.com/auth/v1/token";

/// An authenticated request relative to the API base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
    pub response_kind: ResponseKind,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            headers: Vec::new(),
            query: Vec::new(),
            body: None,
            response_kind: ResponseKind::default(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    #[must_use]
    pub fn response_kind(mut self, kind: ResponseKind) -> Self {
        self.response_kind = kind;
        self
    }
}

/// BigGo PMS API client.
///
/// Tokens are fetched lazily on the first request and reused until they
/// expire. This struct is cheaply cloneable; clones share the transport and
/// the token cache.
///
/// # Example
///
/// ```no_run
/// use biggo_pms::PmsClient;
///
/// # fn example() -> biggo_pms::Result<()> {
/// // Create from environment variables
/// let client = PmsClient::from_env()?;
///
/// // Or configure manually
/// let client = PmsClient::new("client-id", "client-secret")?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PmsClient {
    transport: Arc<dyn Transport>,
    fs: Arc<dyn FileSystem>,
    base_url: Arc<Url>,
    tokens: TokenManager,
}

impl fmt::Debug for PmsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PmsClient")
            .field("base_url", &self.base_url.as_str())
            .field("auth_url", &self.tokens.auth_url().as_str())
            .finish_non_exhaustive()
    }
}

impl PmsClient {
    /// Create a client from environment variables.
    ///
    /// Uses `BIGGO_CLIENT_ID` and `BIGGO_CLIENT_SECRET` for authentication,
    /// and optionally `BIGGO_API_URL` and `BIGGO_AUTH_URL` to override the
    /// service endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if either credential variable is not set.
    pub fn from_env() -> Result<Self> {
        let client_id = env::var("BIGGO_CLIENT_ID").map_err(|_| {
            PmsError::ConfigMissing("BIGGO_CLIENT_ID environment variable not set".to_string())
        })?;
        let client_secret = env::var("BIGGO_CLIENT_SECRET").map_err(|_| {
            PmsError::ConfigMissing("BIGGO_CLIENT_SECRET environment variable not set".to_string())
        })?;

        let mut builder = Self::builder(client_id, client_secret);
        if let Ok(api_url) = env::var("BIGGO_API_URL") {
            builder = builder.api_url(api_url);
        }
        if let Ok(auth_url) = env::var("BIGGO_AUTH_URL") {
            builder = builder.auth_url(auth_url);
        }
        builder.build()
    }

    /// Create a client for the production endpoints.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(client_id: &str, client_secret: &str) -> Result<Self> {
        Self::builder(client_id, client_secret).build()
    }

    /// Start configuring a client.
    pub fn builder(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> PmsClientBuilder {
        PmsClientBuilder::new(Credentials::new(client_id, client_secret))
    }

    /// Get the API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Get the token endpoint URL.
    pub fn auth_url(&self) -> &Url {
        self.tokens.auth_url()
    }

    /// Replace the client ID used for future token renewals.
    pub fn set_client_id(&self, client_id: impl Into<String>) -> &Self {
        self.tokens.set_client_id(client_id.into());
        self
    }

    /// Replace the client secret used for future token renewals.
    pub fn set_client_secret(&self, client_secret: impl Into<String>) -> &Self {
        self.tokens.set_client_secret(client_secret.into());
        self
    }

    /// Install an access token obtained elsewhere.
    ///
    /// `expires_at` is used as-is; no safety margin is applied.
    pub fn set_token(
        &self,
        token: impl Into<String>,
        expires_at: DateTime<Utc>,
        token_type: impl Into<String>,
    ) -> &Self {
        self.tokens
            .set_token(token.into(), token_type.into(), expires_at);
        self
    }

    /// Whether the held token is missing or past its expiry.
    pub fn is_token_expired(&self) -> bool {
        self.tokens.is_token_expired()
    }

    /// Snapshot of the held token state.
    pub fn token_state(&self) -> TokenState {
        self.tokens.token_state()
    }

    /// Return a valid access token, renewing it if necessary.
    ///
    /// # Errors
    ///
    /// Returns [`PmsError::Auth`] if the token endpoint rejects the
    /// credentials or cannot be reached.
    pub async fn token(&self) -> Result<String> {
        Ok(self.tokens.valid_token().await?.token)
    }

    pub(crate) fn file_system(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    /// Send an authenticated request.
    ///
    /// The bearer token is attached before any caller-supplied headers.
    /// A response whose body carries a truthy `error_code`, or
    /// `result: false`, is reported as [`PmsError::Api`] even when the HTTP
    /// status is 200.
    ///
    /// # Errors
    ///
    /// Returns [`PmsError::Auth`] if no token can be obtained, and
    /// [`PmsError::Api`] for business errors and transport failures.
    #[tracing::instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    pub async fn dispatch(&self, request: ApiRequest) -> Result<TransportResponse> {
        let token = self.tokens.valid_token().await?;
        let url = self.base_url.join(request.path.trim_start_matches('/'))?;

        let mut transport_request = TransportRequest::new(request.method, url)
            .header(AUTHORIZATION.as_str(), token.authorization());
        transport_request.headers.extend(request.headers);
        transport_request.query = request.query;
        transport_request.body = request.body.map(RequestBody::Json);
        transport_request.response_kind = request.response_kind;

        match self.transport.send(transport_request).await {
            Ok(response) => {
                if let Some(err) = business_error(&response.body) {
                    return Err(err);
                }
                Ok(response)
            }
            Err(err) => {
                if let Some(business) = err.response.as_ref().and_then(|r| business_error(&r.body))
                {
                    return Err(business);
                }
                Err(PmsError::api(err.message, None))
            }
        }
    }
}

/// Detect an in-band failure signal in a decoded body.
fn business_error(body: &ResponseBody) -> Option<PmsError> {
    let obj = body.as_json()?.as_object()?;

    let error_code = obj.get("error_code").filter(|v| is_truthy(v));
    let failed = matches!(obj.get("result"), Some(Value::Bool(false)));
    if error_code.is_none() && !failed {
        return None;
    }

    let message = ["error", "message"]
        .iter()
        .filter_map(|key| obj.get(*key))
        .find(|v| is_truthy(v))
        .map(describe)
        .unwrap_or_else(|| "request failed".to_string());
    let code = error_code.and_then(numeric_code).or_else(|| {
        obj.get("error")
            .and_then(|e| e.get("code"))
            .and_then(numeric_code)
    });

    tracing::warn!(?code, %message, "business error in response");
    Some(PmsError::api(message, code))
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(obj) => obj
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| value.to_string()),
        other => other.to_string(),
    }
}

/// Builder for [`PmsClient`].
pub struct PmsClientBuilder {
    credentials: Credentials,
    api_url: String,
    auth_url: String,
    transport: Option<Arc<dyn Transport>>,
    fs: Option<Arc<dyn FileSystem>>,
    clock: Option<Arc<dyn Clock>>,
}

impl fmt::Debug for PmsClientBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PmsClientBuilder")
            .field("credentials", &self.credentials)
            .field("api_url", &self.api_url)
            .field("auth_url", &self.auth_url)
            .finish_non_exhaustive()
    }
}

impl PmsClientBuilder {
    fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            api_url: DEFAULT_API_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            transport: None,
            fs: None,
            clock: None,
        }
    }

    /// Base URL of the resource endpoints.
    #[must_use]
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Full URL of the token endpoint.
    #[must_use]
    pub fn auth_url(mut self, url: impl Into<String>) -> Self {
        self.auth_url = url.into();
        self
    }

    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    #[must_use]
    pub fn file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = Some(fs);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Build the client.
    ///
    /// # Errors
    ///
    /// Returns an error if a URL is invalid or the default transport cannot
    /// be constructed.
    pub fn build(self) -> Result<PmsClient> {
        // Ensure base URL ends with / so relative paths join beneath it
        let api_url = if self.api_url.ends_with('/') {
            self.api_url
        } else {
            format!("{}/", self.api_url)
        };
        let base_url = Url::parse(&api_url)?;
        let auth_url = Url::parse(&self.auth_url)?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new()?),
        };
        let fs: Arc<dyn FileSystem> = match self.fs {
            Some(fs) => fs,
            None => Arc::new(TokioFileSystem),
        };
        let clock: Arc<dyn Clock> = match self.clock {
            Some(clock) => clock,
            None => Arc::new(SystemClock),
        };

        Ok(PmsClient {
            tokens: TokenManager::new(self.credentials, auth_url, transport.clone(), clock),
            transport,
            fs,
            base_url: Arc::new(base_url),
        })
    }
}
