//! Remote catalog backend seam.
//!
//! The shared catalog lives behind a managed record store; the core
//! consumes it as a black box of async calls that can fail with a
//! generic unavailable error. This trait is the whole of that surface:
//! page queries, fetch-by-identifier, save/overwrite, delete, binary
//! attachments, and subscription registration. No query language or
//! wire protocol leaks through it.

use async_trait::async_trait;

use crate::errors::BackendResult;
use crate::models::{AssetRef, RawRecord};
use crate::query::QueryDescription;
use crate::subscription::NotificationSubscription;

pub mod memory;

pub use memory::InMemoryCatalog;

/// One bounded page of raw records plus the backend's own resumption
/// cursor. An absent cursor means the backend has nothing further.
#[derive(Debug, Clone)]
pub struct QueryPage {
    pub records: Vec<RawRecord>,
    pub cursor: Option<String>,
}

/// The remote catalog as the sync core consumes it.
///
/// Pagination is forward-only over live state and is not
/// snapshot-isolated: concurrent writes may shift page boundaries
/// between calls. Save is an overwrite of the full record.
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Execute one page of a predicate-and-sort query. `cursor` is a
    /// value previously returned in [`QueryPage::cursor`] for the same
    /// query, or `None` for the first page.
    async fn query_page(
        &self,
        query: &QueryDescription,
        cursor: Option<&str>,
        limit: usize,
    ) -> BackendResult<QueryPage>;

    /// Fetch a single record by identifier; `None` when it does not exist.
    async fn fetch_record(&self, id: &str) -> BackendResult<Option<RawRecord>>;

    /// Save a record, overwriting any previous version wholesale.
    async fn save_record(&self, record: RawRecord) -> BackendResult<()>;

    /// Delete a record by identifier. Deleting an absent record is not
    /// an error.
    async fn delete_record(&self, id: &str) -> BackendResult<()>;

    /// Upload a binary attachment, returning its content-addressed
    /// reference.
    async fn upload_asset(&self, payload: &[u8]) -> BackendResult<AssetRef>;

    /// Resolve an attachment reference back to its payload.
    async fn download_asset(&self, asset: &AssetRef) -> BackendResult<Vec<u8>>;

    /// Register a push-notification predicate, returning its
    /// backend-assigned identifier.
    async fn register_subscription(
        &self,
        subscription: &NotificationSubscription,
    ) -> BackendResult<String>;
}
