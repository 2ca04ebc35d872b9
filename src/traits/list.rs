//! List trait for fetching collections of entities.

use async_trait::async_trait;

use crate::client::PmsClient;
use crate::error::Result;

/// Fetch a collection of entities.
///
/// Implement this trait for entity types returned by a list endpoint.
/// The query carries whatever scoping the endpoint needs: nothing for
/// platforms, a platform ID for groups, a platform ID plus
/// [`ReportListOptions`](crate::ReportListOptions) for reports.
///
/// # Example
///
/// ```ignore
/// use biggo_pms::{Group, List, Platform, PmsClient};
///
/// let client = PmsClient::from_env()?;
///
/// let platforms = Platform::list(&client, &()).await?;
/// let groups = Group::list(&client, &platforms[0].id).await?;
/// ```
#[async_trait]
pub trait List: Sized + Send {
    /// Scoping parameters for the request.
    type Query: ?Sized + Send + Sync;

    /// List every entity matching the query.
    ///
    /// Each record is mapped into the public type; malformed fields fall
    /// back to empty values instead of failing the call.
    ///
    /// # Errors
    ///
    /// Returns an error if authentication or the request fails.
    async fn list(client: &PmsClient, query: &Self::Query) -> Result<Vec<Self>>;
}
