//! Mock BigGo PMS server for E2E testing.
//!
//! This module provides an in-memory mock server that simulates both the
//! token endpoint and the PMS API. Unlike wiremock which mocks at the HTTP
//! level per-test, this server maintains state across requests: it only
//! accepts tokens it issued, and it counts token requests so caching can be
//! observed from outside.
//!
//! # Example
//!
//! ```ignore
//! use biggo_pms::mock_server::MockServer;
//!
//! #[tokio::test]
//! async fn test_workflow() {
//!     let server = MockServer::start().await;
//!     let client = server.client().unwrap();
//!
//!     // Server comes with default fixtures
//!     let platforms = biggo_pms::get_platforms(&client).await.unwrap();
//!     assert_eq!(platforms[0].name, "Main Store");
//!
//!     server.shutdown().await;
//! }
//! ```

mod fixtures;
mod handlers;
mod server;
mod state;

pub use fixtures::{Fixtures, TEST_CLIENT_ID, TEST_CLIENT_SECRET};
pub use handlers::{INVALID_CLIENT_CODE, INVALID_TOKEN_CODE, NOT_FOUND_CODE};
pub use server::MockServer;
pub use state::{MockState, ReportFile};
