//! Mock BigGo PMS server.
//!
//! Provides an axum-based HTTP server that simulates the token endpoint and
//! the PMS API under one origin.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::fixtures::{Fixtures, TEST_CLIENT_ID, TEST_CLIENT_SECRET};
use super::handlers;
use super::state::MockState;
use crate::{PmsClient, Result};

/// A mock BigGo PMS server for testing.
///
/// The server runs in the background and can be used to test the PMS client
/// against a realistic API implementation.
pub struct MockServer {
    /// The URL where the server is listening.
    url: String,
    /// Handle to the server task.
    handle: JoinHandle<()>,
    /// Shared state that can be modified during tests.
    state: Arc<RwLock<MockState>>,
}

impl MockServer {
    /// Start a new mock server with default fixtures.
    ///
    /// The server listens on a random available port and returns immediately.
    /// Use `url()` to get the server's base URL.
    pub async fn start() -> Self {
        Self::with_state(Fixtures::default_scenario()).await
    }

    /// Start a mock server that only knows the test client.
    ///
    /// Useful when you want to control exactly what data is available.
    pub async fn start_empty() -> Self {
        Self::with_state(MockState::new().with_client(TEST_CLIENT_ID, TEST_CLIENT_SECRET)).await
    }

    /// Start a mock server with custom state.
    pub async fn with_state(state: MockState) -> Self {
        let shared_state = state.shared();
        let app = Self::create_router(shared_state.clone());

        // Bind to a random available port
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let addr = listener.local_addr().expect("Failed to get local address");

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Server error");
        });

        Self {
            url: format!("http://{}", addr),
            handle,
            state: shared_state,
        }
    }

    /// Get the origin of the mock server.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Base URL of the PMS API, for [`PmsClientBuilder::api_url`](crate::PmsClientBuilder::api_url).
    pub fn api_url(&self) -> String {
        format!("{}/api/v1/pms", self.url)
    }

    /// Token endpoint, for [`PmsClientBuilder::auth_url`](crate::PmsClientBuilder::auth_url).
    pub fn auth_url(&self) -> String {
        format!("{}/auth/v1/token", self.url)
    }

    /// Build a client pointed at this server with the given credentials.
    pub fn client_with(&self, client_id: &str, client_secret: &str) -> Result<PmsClient> {
        PmsClient::builder(client_id, client_secret)
            .api_url(self.api_url())
            .auth_url(self.auth_url())
            .build()
    }

    /// Build a client pointed at this server using the test credentials.
    pub fn client(&self) -> Result<PmsClient> {
        self.client_with(TEST_CLIENT_ID, TEST_CLIENT_SECRET)
    }

    /// Get access to the server's shared state.
    ///
    /// This allows modifying the mock data during a test.
    pub fn state(&self) -> Arc<RwLock<MockState>> {
        self.state.clone()
    }

    /// Number of requests the token endpoint has received.
    pub async fn token_requests(&self) -> usize {
        self.state.read().await.token_requests
    }

    /// Shutdown the server.
    ///
    /// This aborts the server task. It's safe to call multiple times.
    pub async fn shutdown(self) {
        self.handle.abort();
        let _ = self.handle.await;
    }

    /// Create the axum router with all routes.
    fn create_router(state: Arc<RwLock<MockState>>) -> Router {
        Router::new()
            // Token endpoint
            .route("/auth/v1/token", post(handlers::issue_token))
            // PMS routes
            .route("/api/v1/pms/platform", get(handlers::list_platforms))
            .route("/api/v1/pms/group", get(handlers::list_groups))
            .route("/api/v1/pms/export", get(handlers::list_reports))
            .route("/api/v1/pms/export/:id", get(handlers::export_report))
            // Health check
            .route("/health", get(health_check))
            .with_state(state)
    }
}

/// Health check endpoint.
async fn health_check() -> &'static str {
    "ok"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock_server::NOT_FOUND_CODE;
    use crate::{get_groups, get_platforms, PmsError};

    #[tokio::test]
    async fn test_server_starts_and_responds() {
        let server = MockServer::start().await;

        // Server should be accessible
        let client = reqwest::Client::new();
        let response = client
            .get(format!("{}/health", server.url()))
            .send()
            .await
            .expect("Failed to send request");

        assert!(response.status().is_success());
        assert_eq!(response.text().await.unwrap(), "ok");

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_list_platforms_with_pms_client() {
        let server = MockServer::start().await;
        let client = server.client().unwrap();

        let platforms = get_platforms(&client).await.expect("Failed to list platforms");

        assert_eq!(platforms.len(), 2);
        assert_eq!(platforms[0].name, "Main Store");
        assert_eq!(server.token_requests().await, 1);

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_unknown_platform_is_business_error() {
        let server = MockServer::start().await;
        let client = server.client().unwrap();

        let err = get_groups(&client, "nope").await.unwrap_err();

        assert!(matches!(err, PmsError::Api { .. }));
        assert_eq!(err.code(), Some(NOT_FOUND_CODE));

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_bad_credentials_are_auth_error() {
        let server = MockServer::start_empty().await;
        let client = server.client_with(TEST_CLIENT_ID, "wrong").unwrap();

        let err = get_platforms(&client).await.unwrap_err();

        assert!(err.is_auth());
        assert!(err.to_string().contains("( clientSecret )"));

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_custom_state() {
        let state = MockState::new()
            .with_client("me", "pw")
            .with_platform(Fixtures::minimal_platform("p9", "My Custom Platform"));

        let server = MockServer::with_state(state).await;
        let client = server.client_with("me", "pw").unwrap();

        let platforms = get_platforms(&client).await.unwrap();

        assert_eq!(platforms.len(), 1);
        assert_eq!(platforms[0].id, "p9");

        server.shutdown().await;
    }
}
