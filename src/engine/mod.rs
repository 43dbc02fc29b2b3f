//! Paginated fetch engine.
//!
//! Executes one query page at a time against the remote catalog and
//! owns the page/cursor lifecycle: token validation, the
//! at-most-one-in-flight rule, the total-record policy cap, and the
//! decode step between raw records and [`CatalogRecord`]s. An absent
//! token in the returned page is the unambiguous "no more results"
//! signal.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::backend::CatalogBackend;
use crate::config::CatalogConfig;
use crate::errors::{CatalogError, CatalogResult};
use crate::models::{decode_record, CatalogRecord};
use crate::query::QueryDescription;

pub mod cursor;

pub use cursor::ContinuationToken;

use cursor::TokenPayload;

/// One fetched page: decoded records plus the token for the page after
/// it, absent when the query is exhausted.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub records: Vec<CatalogRecord>,
    pub next: Option<ContinuationToken>,
}

/// Per-feed page fetcher. One engine serves one view cache; its
/// `is_fetching` observable is the gate callers use to disable
/// pagination triggers while a fetch is outstanding.
pub struct FetchEngine {
    backend: Arc<dyn CatalogBackend>,
    config: CatalogConfig,
    is_fetching: watch::Sender<bool>,
}

impl FetchEngine {
    pub fn new(backend: Arc<dyn CatalogBackend>, config: CatalogConfig) -> Self {
        let (is_fetching, _) = watch::channel(false);
        Self {
            backend,
            config,
            is_fetching,
        }
    }

    /// Read-only view of the in-flight flag
    pub fn is_fetching(&self) -> watch::Receiver<bool> {
        self.is_fetching.subscribe()
    }

    /// Execute the first page of a query. The caller resets its cache
    /// only after this returns successfully; on failure nothing has
    /// been handed out.
    pub async fn fetch_first_page(
        &self,
        query: &QueryDescription,
        page_size: usize,
    ) -> CatalogResult<FetchedPage> {
        self.run_gated(query, None, page_size).await
    }

    /// Execute the next page for a previously returned token. The token
    /// must belong to `query`; a token from any other query fails with
    /// `InvalidToken`.
    pub async fn fetch_next_page(
        &self,
        query: &QueryDescription,
        token: &ContinuationToken,
        page_size: usize,
    ) -> CatalogResult<FetchedPage> {
        let resume = cursor::decode(token, &query.fingerprint())?;
        self.run_gated(query, Some(resume), page_size).await
    }

    /// Single-record path backing deep links. A blank or unknown
    /// identifier surfaces `RecordNotFound`.
    pub async fn fetch_by_id(&self, id: &str) -> CatalogResult<CatalogRecord> {
        let id = id.trim();
        if id.is_empty() {
            return Err(CatalogError::record_not_found(id));
        }
        match self.backend.fetch_record(id).await? {
            Some(raw) => Ok(decode_record(&raw)?),
            None => Err(CatalogError::record_not_found(id)),
        }
    }

    async fn run_gated(
        &self,
        query: &QueryDescription,
        resume: Option<TokenPayload>,
        page_size: usize,
    ) -> CatalogResult<FetchedPage> {
        // send_replace returns the previous value: true means another
        // fetch still owns the flag, and it stays true for that fetch.
        if self.is_fetching.send_replace(true) {
            return Err(CatalogError::FetchInProgress);
        }
        let result = self.fetch_page(query, resume, page_size).await;
        self.is_fetching.send_replace(false);
        result
    }

    async fn fetch_page(
        &self,
        query: &QueryDescription,
        resume: Option<TokenPayload>,
        page_size: usize,
    ) -> CatalogResult<FetchedPage> {
        let page_size = page_size.max(1);
        let already_fetched = resume.as_ref().map_or(0, |r| r.fetched);
        let remaining = self
            .config
            .max_total_records
            .saturating_sub(already_fetched);
        if remaining == 0 {
            debug!(
                cap = self.config.max_total_records,
                "record cap reached, ending pagination"
            );
            return Ok(FetchedPage {
                records: Vec::new(),
                next: None,
            });
        }

        let backend_cursor = resume.as_ref().map(|r| r.backend_cursor.as_str());
        let page = self
            .backend
            .query_page(query, backend_cursor, page_size)
            .await?;

        let mut records = Vec::with_capacity(page.records.len());
        for raw in &page.records {
            match decode_record(raw) {
                Ok(record) => records.push(record),
                Err(e) => warn!(id = %raw.id, error = %e, "skipping undecodable record"),
            }
        }

        let mut next_cursor = page.cursor;
        // A zero-record page with a live cursor stalls feeds that gate
        // "load more" on received rows; treat it as exhaustion.
        if records.is_empty() {
            next_cursor = None;
        }
        if records.len() > remaining {
            records.truncate(remaining);
            next_cursor = None;
        }
        let fetched = already_fetched + records.len();
        if fetched >= self.config.max_total_records {
            next_cursor = None;
        }

        let next = match next_cursor {
            Some(backend_cursor) => Some(cursor::encode(&TokenPayload {
                query_fingerprint: query.fingerprint(),
                backend_cursor,
                fetched,
            })?),
            None => None,
        };

        debug!(
            count = records.len(),
            total = fetched,
            has_more = next.is_some(),
            "fetched catalog page"
        );
        Ok(FetchedPage { records, next })
    }
}
