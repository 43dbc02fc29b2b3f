//! Per-feed catalog session.
//!
//! Each UI feed (spots list, playlist map, watch companion) owns one
//! session: its own view cache, fetch engine, and in-flight flag, with
//! no shared mutable state between sessions. The session composes the
//! query builder, fetch engine, cache, and reconciler into the calls a
//! feed actually makes, and guards cache application with a generation
//! counter so a response that arrives after the session was closed or
//! re-queried is silently dropped.

use std::sync::Arc;

use tokio::sync::{watch, RwLock};
use tracing::debug;

use crate::backend::CatalogBackend;
use crate::cache::ViewCache;
use crate::config::{CatalogConfig, SessionContext};
use crate::engine::FetchEngine;
use crate::errors::{CatalogError, CatalogResult};
use crate::local::LocalSpotStore;
use crate::models::{CatalogRecord, PublishRequest, ReportReason, SpotEdit};
use crate::query::QueryDescription;
use crate::reconciler::MutationReconciler;

struct SessionState {
    cache: ViewCache,
    generation: u64,
    closed: bool,
}

/// One UI feed's independent query/cache/fetch state.
///
/// Cloning shares the session; hand clones to UI tasks rather than
/// creating parallel sessions over one feed.
#[derive(Clone)]
pub struct CatalogSession {
    context: SessionContext,
    engine: Arc<FetchEngine>,
    reconciler: Arc<MutationReconciler>,
    local: Option<Arc<dyn LocalSpotStore>>,
    page_size: usize,
    state: Arc<RwLock<SessionState>>,
}

impl CatalogSession {
    pub fn new(
        backend: Arc<dyn CatalogBackend>,
        config: CatalogConfig,
        context: SessionContext,
    ) -> Self {
        let page_size = config.default_page_size;
        Self {
            context,
            engine: Arc::new(FetchEngine::new(backend.clone(), config)),
            reconciler: Arc::new(MutationReconciler::new(backend)),
            local: None,
            page_size,
            state: Arc::new(RwLock::new(SessionState {
                cache: ViewCache::new(),
                generation: 0,
                closed: false,
            })),
        }
    }

    /// Attach the device-local spot store for already-imported lookups
    pub fn with_local_store(mut self, store: Arc<dyn LocalSpotStore>) -> Self {
        self.local = Some(store);
        self
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Read-only observable the UI uses to disable pagination triggers
    pub fn is_fetching(&self) -> watch::Receiver<bool> {
        self.engine.is_fetching()
    }

    /// Snapshot of the cached feed contents
    pub async fn records(&self) -> Vec<CatalogRecord> {
        self.state.read().await.cache.records().to_vec()
    }

    /// Whether a further page may exist for the current query
    pub async fn has_more(&self) -> bool {
        self.state.read().await.cache.token().is_some()
    }

    /// Tear the session down. In-flight fetches complete or fail
    /// without touching the cache further.
    pub async fn close(&self) {
        let mut state = self.state.write().await;
        state.closed = true;
    }

    /// Run a new query, resetting the cache to its first page.
    ///
    /// On failure the cache is untouched: the previous feed keeps
    /// rendering behind the retry affordance.
    pub async fn search(&self, query: QueryDescription) -> CatalogResult<()> {
        let generation = {
            let mut state = self.state.write().await;
            if state.closed {
                return Ok(());
            }
            state.generation += 1;
            state.generation
        };

        let page = self.engine.fetch_first_page(&query, self.page_size).await?;

        let mut state = self.state.write().await;
        if state.closed || state.generation != generation {
            debug!("dropping first page for a stale session");
            return Ok(());
        }
        state.cache.reset(query);
        state.cache.replace_all(page.records);
        state.cache.set_token(page.next);
        Ok(())
    }

    /// Fetch the next page for the current query, appending into the
    /// cache. Returns whether more pages may follow. A session with no
    /// query or no token is a no-op.
    pub async fn load_more(&self) -> CatalogResult<bool> {
        let (query, token, generation) = {
            let state = self.state.read().await;
            if state.closed {
                return Ok(false);
            }
            let Some(query) = state.cache.query().cloned() else {
                return Ok(false);
            };
            let Some(token) = state.cache.token().cloned() else {
                return Ok(false);
            };
            (query, token, state.generation)
        };

        let page = self
            .engine
            .fetch_next_page(&query, &token, self.page_size)
            .await?;

        let mut state = self.state.write().await;
        if state.closed || state.generation != generation {
            debug!("dropping next page for a stale session");
            return Ok(false);
        }
        state.cache.append(page.records);
        let has_more = page.next.is_some();
        state.cache.set_token(page.next);
        Ok(has_more)
    }

    /// Like or unlike a cached record. Returns `false` for the silent
    /// unlike-at-zero rejection. The cache is updated only after the
    /// remote write resolves.
    pub async fn toggle_like(&self, record_id: &str, liked: bool) -> CatalogResult<bool> {
        let cached = {
            let state = self.state.read().await;
            state.cache.get(record_id).cloned()
        }
        .ok_or_else(|| CatalogError::record_not_found(record_id))?;

        match self.reconciler.set_like(&cached, liked).await? {
            Some(new_count) => {
                let mut state = self.state.write().await;
                state.cache.set_like_count(record_id, new_count);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Report a record. Mirrors the confirmed increment into the cache.
    pub async fn report(&self, record_id: &str, reason: ReportReason) -> CatalogResult<bool> {
        let applied = self.reconciler.report(record_id, reason).await?;
        if applied {
            let mut state = self.state.write().await;
            state.cache.bump_report(record_id, reason);
        }
        Ok(applied)
    }

    /// Publish a new spot under this session's user. Returns the new
    /// catalog identifier.
    pub async fn publish(&self, request: &PublishRequest) -> CatalogResult<String> {
        self.reconciler.publish(request, &self.context).await
    }

    /// Apply an owner edit remotely, then overlay it onto the cached
    /// copy in place.
    pub async fn update_spot(
        &self,
        record_id: &str,
        edit: &SpotEdit,
        new_images: Option<&[Vec<u8>]>,
    ) -> CatalogResult<()> {
        self.reconciler.update(record_id, edit, new_images).await?;

        let mut state = self.state.write().await;
        if let Some(mut record) = state.cache.get(record_id).cloned() {
            record.name = edit.name.clone();
            record.description = edit.description.clone();
            record.category = edit.category.clone();
            state.cache.apply_record(record);
        }
        Ok(())
    }

    /// Delete a spot remotely and drop it from the feed. The identifier
    /// joins the session's exclusion set so an in-flight page cannot
    /// re-insert it.
    pub async fn delete_spot(&self, record_id: &str) -> CatalogResult<()> {
        self.reconciler.delete(record_id).await?;
        let mut state = self.state.write().await;
        state.cache.remove(record_id);
        Ok(())
    }

    /// Resolve a deep-linked spot identifier to its record
    pub async fn resolve_spot(&self, raw_id: &str) -> CatalogResult<CatalogRecord> {
        self.engine.fetch_by_id(raw_id).await
    }

    /// Whether the local user already imported this catalog record.
    /// Sessions without a local store report `false`.
    pub async fn already_imported(&self, catalog_id: &str) -> CatalogResult<bool> {
        match &self.local {
            Some(store) => Ok(store.find_by_catalog_id(catalog_id).await?.is_some()),
            None => Ok(false),
        }
    }
}
