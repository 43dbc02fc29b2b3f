//! In-memory catalog backend.
//!
//! A functional stand-in for the managed record store, used by the test
//! suite and by embedders prototyping without network access. It
//! evaluates the same predicate and sort comparators the query builder
//! specifies, pages with a plain offset cursor, and offers failure
//! injection (`set_offline`) plus a save-call counter so tests can
//! assert that rejected mutations never reach the remote.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;
use url::Url;
use uuid::Uuid;

use crate::errors::{BackendError, BackendResult};
use crate::models::{decode_record, AssetRef, CatalogRecord, RawRecord};
use crate::query::{predicate, QueryDescription};
use crate::subscription::NotificationSubscription;

use super::{CatalogBackend, QueryPage};

#[derive(Default)]
struct CatalogState {
    records: BTreeMap<String, RawRecord>,
    assets: HashMap<String, Vec<u8>>,
    subscriptions: HashMap<String, NotificationSubscription>,
}

#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    state: Arc<RwLock<CatalogState>>,
    offline: Arc<AtomicBool>,
    save_calls: Arc<AtomicUsize>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the catalog with raw records, replacing any existing entries
    /// with the same identifier.
    pub async fn seed(&self, records: Vec<RawRecord>) {
        let mut state = self.state.write().await;
        for record in records {
            state.records.insert(record.id.clone(), record);
        }
    }

    /// Simulate a network or backend outage: while offline, every call
    /// fails with `Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of `save_record` calls that reached this backend
    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    pub async fn record_count(&self) -> usize {
        self.state.read().await.records.len()
    }

    /// Test introspection: the stored raw record for an identifier
    pub async fn record(&self, id: &str) -> Option<RawRecord> {
        self.state.read().await.records.get(id).cloned()
    }

    pub async fn subscription_count(&self) -> usize {
        self.state.read().await.subscriptions.len()
    }

    fn check_online(&self) -> BackendResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(BackendError::unavailable("simulated outage"));
        }
        Ok(())
    }

    /// Decode, filter, and sort the full result set for a query.
    /// Undecodable records are excluded here the same way the fetch
    /// engine skips them, keeping offsets stable within one backing set.
    async fn matching_rows(&self, query: &QueryDescription) -> Vec<(CatalogRecord, RawRecord)> {
        let state = self.state.read().await;
        let mut rows: Vec<(CatalogRecord, RawRecord)> = state
            .records
            .values()
            .filter_map(|raw| decode_record(raw).ok().map(|decoded| (decoded, raw.clone())))
            .filter(|(decoded, _)| predicate::matches(decoded, query))
            .collect();
        rows.sort_by(|(a, _), (b, _)| predicate::compare(a, b, query));
        rows
    }
}

#[async_trait]
impl CatalogBackend for InMemoryCatalog {
    async fn query_page(
        &self,
        query: &QueryDescription,
        cursor: Option<&str>,
        limit: usize,
    ) -> BackendResult<QueryPage> {
        self.check_online()?;
        let offset: usize = match cursor {
            Some(cursor) => cursor
                .parse()
                .map_err(|_| BackendError::bad_cursor(format!("not an offset: {cursor}")))?,
            None => 0,
        };

        let rows = self.matching_rows(query).await;
        if offset >= rows.len() {
            return Ok(QueryPage {
                records: Vec::new(),
                cursor: None,
            });
        }

        let end = (offset + limit.max(1)).min(rows.len());
        let records = rows[offset..end]
            .iter()
            .map(|(_, raw)| raw.clone())
            .collect();
        let cursor = if end < rows.len() {
            Some(end.to_string())
        } else {
            None
        };
        Ok(QueryPage { records, cursor })
    }

    async fn fetch_record(&self, id: &str) -> BackendResult<Option<RawRecord>> {
        self.check_online()?;
        Ok(self.state.read().await.records.get(id).cloned())
    }

    async fn save_record(&self, record: RawRecord) -> BackendResult<()> {
        self.check_online()?;
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.write().await;
        state.records.insert(record.id.clone(), record);
        Ok(())
    }

    async fn delete_record(&self, id: &str) -> BackendResult<()> {
        self.check_online()?;
        let mut state = self.state.write().await;
        state.records.remove(id);
        Ok(())
    }

    async fn upload_asset(&self, payload: &[u8]) -> BackendResult<AssetRef> {
        self.check_online()?;
        let mut hasher = Sha256::new();
        hasher.update(payload);
        let digest = format!("{:x}", hasher.finalize());
        let url = Url::parse(&format!("memory://assets/{digest}"))
            .map_err(|e| BackendError::unavailable(e.to_string()))?;
        let mut state = self.state.write().await;
        state.assets.insert(digest.clone(), payload.to_vec());
        Ok(AssetRef {
            id: digest,
            url: Some(url),
        })
    }

    async fn download_asset(&self, asset: &AssetRef) -> BackendResult<Vec<u8>> {
        self.check_online()?;
        self.state
            .read()
            .await
            .assets
            .get(&asset.id)
            .cloned()
            .ok_or_else(|| BackendError::unavailable(format!("asset not present: {}", asset.id)))
    }

    async fn register_subscription(
        &self,
        subscription: &NotificationSubscription,
    ) -> BackendResult<String> {
        self.check_online()?;
        let id = Uuid::new_v4().to_string();
        let mut state = self.state.write().await;
        state.subscriptions.insert(id.clone(), subscription.clone());
        Ok(id)
    }
}
