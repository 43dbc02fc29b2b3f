//! Mutation reconciler.
//!
//! Applies optimistic local mutations directly against the
//! authoritative remote record with read-modify-write semantics. The
//! like counter is written back from the caller's cached copy, not a
//! fresh re-read, so concurrent likes from two clients can lose an
//! increment: last writer wins. That trade-off is part of the observed
//! behavior this crate reproduces; callers must not commit any
//! optimistic UI state until these calls resolve successfully.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::backend::CatalogBackend;
use crate::config::SessionContext;
use crate::errors::{CatalogError, CatalogResult};
use crate::models::{
    fields, AssetRef, CatalogRecord, FieldValue, PublishRequest, RawRecord, ReportReason, SpotEdit,
};

/// Bounds on image attachments per published spot
pub const MIN_IMAGES: usize = 1;
pub const MAX_IMAGES: usize = 3;

pub struct MutationReconciler {
    backend: Arc<dyn CatalogBackend>,
}

impl MutationReconciler {
    pub fn new(backend: Arc<dyn CatalogBackend>) -> Self {
        Self { backend }
    }

    /// Like or unlike a record.
    ///
    /// Unlike with a cached count of zero is rejected as `Ok(None)`
    /// before any remote call, blocking a stale local state from
    /// driving the counter negative. On success returns the count that
    /// was written, for the caller to apply to its cache in place.
    pub async fn set_like(
        &self,
        record: &CatalogRecord,
        liked: bool,
    ) -> CatalogResult<Option<u64>> {
        if !liked && record.likes == 0 {
            debug!(id = %record.id, "unlike at zero likes rejected");
            return Ok(None);
        }
        let mut raw = self.fetch_required(&record.id).await?;
        let new_count = if liked {
            record.likes + 1
        } else {
            record.likes - 1
        };
        raw.set(fields::LIKES, FieldValue::Int(new_count as i64));
        self.backend.save_record(raw).await?;
        Ok(Some(new_count))
    }

    /// Increment one moderation counter on the remote record.
    ///
    /// Returns `Ok(false)` without writing when the counter field is
    /// absent from the fetched record, tolerating schema drift.
    pub async fn report(&self, record_id: &str, reason: ReportReason) -> CatalogResult<bool> {
        let mut raw = self.fetch_required(record_id).await?;
        let field = reason.field_name();
        let current = match raw.get(field) {
            Some(FieldValue::Int(n)) => (*n).max(0),
            _ => {
                warn!(id = %record_id, field, "report counter absent, skipping write");
                return Ok(false);
            }
        };
        raw.set(field, FieldValue::Int(current + 1));
        self.backend.save_record(raw).await?;
        Ok(true)
    }

    /// Publish a new spot to the shared catalog.
    ///
    /// Uploads the image payloads as out-of-band attachments, then
    /// saves a record with a client-generated identifier and zeroed
    /// counters. On any failure the partial work is discarded and
    /// `PublishFailed` is returned; there is no retry queue.
    pub async fn publish(
        &self,
        request: &PublishRequest,
        context: &SessionContext,
    ) -> CatalogResult<String> {
        if request.name.trim().is_empty() {
            return Err(CatalogError::validation("spot name must not be empty"));
        }
        if request.images.len() < MIN_IMAGES || request.images.len() > MAX_IMAGES {
            return Err(CatalogError::validation(format!(
                "a spot carries {MIN_IMAGES}-{MAX_IMAGES} images, got {}",
                request.images.len()
            )));
        }

        let assets = self.upload_images(&request.images).await?;

        let id = Uuid::new_v4().to_string();
        let mut raw = RawRecord::new(id.clone());
        raw.set(fields::NAME, FieldValue::Text(request.name.clone()));
        raw.set(fields::FOUNDER, FieldValue::Text(request.founder.clone()));
        raw.set(
            fields::DESCRIPTION,
            FieldValue::Text(request.description.clone()),
        );
        raw.set(fields::DATE, FieldValue::Text(request.date.clone()));
        raw.set(
            fields::LATITUDE,
            FieldValue::Double(request.coordinate.latitude),
        );
        raw.set(
            fields::LONGITUDE,
            FieldValue::Double(request.coordinate.longitude),
        );
        raw.set(fields::CATEGORY, FieldValue::Text(request.category.clone()));
        raw.set(
            fields::HAS_MORE_IMAGES,
            FieldValue::Bool(assets.len() > 1),
        );
        raw.set(fields::IMAGES, FieldValue::AssetList(assets));
        raw.set(fields::LIKES, FieldValue::Int(0));
        raw.set(fields::OFFENSIVE, FieldValue::Int(0));
        raw.set(fields::SPAM, FieldValue::Int(0));
        raw.set(fields::INAPPROPRIATE, FieldValue::Int(0));
        raw.set(fields::DANGEROUS, FieldValue::Int(0));
        raw.set(
            fields::PLACE_NAME,
            FieldValue::Text(request.place_name.clone()),
        );
        raw.set(fields::OWNER_ID, FieldValue::Text(context.user_id.clone()));
        raw.set(fields::CREATED_AT, FieldValue::Timestamp(Utc::now()));

        self.backend
            .save_record(raw)
            .await
            .map_err(|e| CatalogError::publish_failed(e.to_string()))?;
        debug!(%id, "published spot");
        Ok(id)
    }

    /// Overlay an owner edit onto the current remote record.
    ///
    /// The record is fetched first so fields the edit form never
    /// touched (images in particular) survive the save. Image
    /// attachments are replaced only when the caller signals they
    /// changed by passing `new_images`.
    pub async fn update(
        &self,
        record_id: &str,
        edit: &SpotEdit,
        new_images: Option<&[Vec<u8>]>,
    ) -> CatalogResult<()> {
        let mut raw = self.fetch_required(record_id).await?;
        raw.set(fields::NAME, FieldValue::Text(edit.name.clone()));
        raw.set(
            fields::DESCRIPTION,
            FieldValue::Text(edit.description.clone()),
        );
        raw.set(fields::CATEGORY, FieldValue::Text(edit.category.clone()));

        if let Some(images) = new_images {
            if images.len() < MIN_IMAGES || images.len() > MAX_IMAGES {
                return Err(CatalogError::validation(format!(
                    "a spot carries {MIN_IMAGES}-{MAX_IMAGES} images, got {}",
                    images.len()
                )));
            }
            let assets = self.upload_images(images).await?;
            raw.set(
                fields::HAS_MORE_IMAGES,
                FieldValue::Bool(assets.len() > 1),
            );
            raw.set(fields::IMAGES, FieldValue::AssetList(assets));
        }

        self.backend.save_record(raw).await?;
        Ok(())
    }

    /// Remove a record from the remote catalog unconditionally.
    ///
    /// The caller is responsible for removing it from any view cache
    /// afterward; confirmation is a UI concern.
    pub async fn delete(&self, record_id: &str) -> CatalogResult<()> {
        self.backend.delete_record(record_id).await?;
        debug!(id = %record_id, "deleted spot");
        Ok(())
    }

    async fn upload_images(&self, images: &[Vec<u8>]) -> CatalogResult<Vec<AssetRef>> {
        let mut assets = Vec::with_capacity(images.len());
        for payload in images {
            let asset = self
                .backend
                .upload_asset(payload)
                .await
                .map_err(|e| CatalogError::publish_failed(e.to_string()))?;
            assets.push(asset);
        }
        Ok(assets)
    }

    async fn fetch_required(&self, id: &str) -> CatalogResult<RawRecord> {
        match self.backend.fetch_record(id).await? {
            Some(raw) => Ok(raw),
            None => Err(CatalogError::record_not_found(id)),
        }
    }
}
