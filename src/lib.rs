//! BigGo PMS API client library.
//!
//! A Rust library for the BigGo product monitoring system. The client
//! authenticates with OAuth2 client credentials, caches the access token
//! until shortly before it expires, and exposes the platform, group, and
//! report endpoints, including report downloads as CSV, JSON, or Excel.
//!
//! # Quick Start
//!
//! ```no_run
//! use biggo_pms::{DownloadOptions, PmsClient, ReportFormat, ReportListOptions};
//!
//! #[tokio::main]
//! async fn main() -> biggo_pms::Result<()> {
//!     // Create client from environment variables
//!     let client = PmsClient::from_env()?;
//!
//!     // List platforms and their groups
//!     let platforms = biggo_pms::get_platforms(&client).await?;
//!     let platform = &platforms[0];
//!     let groups = biggo_pms::get_groups(&client, &platform.id).await?;
//!     println!("{} has {} groups", platform.name, groups.len());
//!
//!     // Download the newest report as CSV into ./reports
//!     let reports =
//!         biggo_pms::get_reports(&client, &platform.id, ReportListOptions::default()).await?;
//!     if let Some(report) = reports.first() {
//!         let saved = biggo_pms::export_report(
//!             &client,
//!             &platform.id,
//!             &report.id,
//!             ReportFormat::Csv,
//!             DownloadOptions::save_to("reports"),
//!         )
//!         .await?;
//!         println!("Saved to {:?}", saved.path());
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! Every call goes through [`PmsClient::dispatch`], which obtains a token,
//! attaches it, and turns both transport failures and in-band business
//! errors into [`PmsError::Api`]. Token endpoint failures surface as
//! [`PmsError::Auth`].
//!
//! Entity types implement the [`List`] trait; [`export_report`] handles
//! downloads. The network and the filesystem are reached through the
//! [`Transport`] and [`FileSystem`] traits, which can be replaced via
//! [`PmsClient::builder`].
//!
//! # Configuration
//!
//! The client reads configuration from environment variables:
//!
//! - `BIGGO_CLIENT_ID` (required) - OAuth2 client ID
//! - `BIGGO_CLIENT_SECRET` (required) - OAuth2 client secret
//! - `BIGGO_API_URL` (optional) - Base URL (defaults to `https://api.biggo.com/api/v1/pms`)
//! - `BIGGO_AUTH_URL` (optional) - Token endpoint (defaults to `https://api.biggo.com/auth/v1/token`)

mod auth;
pub mod cli;
mod client;
mod credentials;
mod error;
mod export;
mod fs;
mod models;
mod traits;
mod transport;

#[cfg(feature = "test-server")]
pub mod mock_server;

// Re-export core types
pub use auth::{Clock, SystemClock};
pub use client::{ApiRequest, PmsClient, PmsClientBuilder};
pub use credentials::{AccessToken, Credentials, TokenState, EXPIRY_MARGIN_SECS};
pub use error::{PmsError, Result};
pub use fs::{FileSystem, TokioFileSystem};
pub use transport::{
    RequestBody, ReqwestTransport, ResponseBody, ResponseKind, Transport, TransportError,
    TransportRequest, TransportResponse,
};

// Re-export traits
pub use traits::List;

// Re-export models
pub use models::{
    // Platform types
    Permission,
    Platform,
    PlatformEmail,
    PlatformEmailRecord,
    PlatformRecord,
    PlatformStatus,
    PlatformUser,
    PlatformUserRecord,
    // Group types
    Group,
    GroupRecord,
    GroupStatus,
    Schedule,
    // Report types
    ReportListItem,
    ReportListOptions,
    ReportQuery,
    ReportRecord,
    SortOrder,
};

// Re-export export types
pub use export::{
    file_name_from_disposition, serialize_report, DownloadOptions, ReportContent, ReportFormat,
    ReportOutput,
};

// Re-export convenience functions
pub use export::export_report;
pub use models::{format_filter_date, get_groups, get_platforms, get_reports};
