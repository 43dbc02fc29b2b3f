//! Local persistence seam.
//!
//! The device-resident spot store is an external collaborator; its
//! mechanics (object-relational mapping, merge policies) live outside
//! this crate. The core consumes it for exactly one thing: a
//! zero-or-one lookup from a catalog identifier to the local copy, so
//! the UI can mark a shared spot as already imported. Save and delete
//! are included for the import flow's convenience.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::StoreResult;
use crate::models::LocalSpot;

#[async_trait]
pub trait LocalSpotStore: Send + Sync {
    /// Zero-or-one lookup by the catalog record a spot was imported from
    async fn find_by_catalog_id(&self, catalog_id: &str) -> StoreResult<Option<LocalSpot>>;

    async fn save(&self, spot: LocalSpot) -> StoreResult<()>;

    async fn delete(&self, id: Uuid) -> StoreResult<()>;
}

/// In-memory store for tests and embedders without device persistence
#[derive(Clone, Default)]
pub struct InMemoryLocalSpotStore {
    spots: Arc<RwLock<HashMap<Uuid, LocalSpot>>>,
}

impl InMemoryLocalSpotStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.spots.read().await.len()
    }
}

#[async_trait]
impl LocalSpotStore for InMemoryLocalSpotStore {
    async fn find_by_catalog_id(&self, catalog_id: &str) -> StoreResult<Option<LocalSpot>> {
        let spots = self.spots.read().await;
        Ok(spots
            .values()
            .find(|s| s.catalog_id.as_deref() == Some(catalog_id))
            .cloned())
    }

    async fn save(&self, spot: LocalSpot) -> StoreResult<()> {
        let mut spots = self.spots.write().await;
        spots.insert(spot.id, spot);
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<()> {
        let mut spots = self.spots.write().await;
        spots.remove(&id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::decode::tests_support::sample_record;

    #[tokio::test]
    async fn test_catalog_id_lookup_is_zero_or_one() {
        let store = InMemoryLocalSpotStore::new();
        assert!(store.find_by_catalog_id("spot-1").await.unwrap().is_none());

        let imported = LocalSpot::imported_from(&sample_record("spot-1"));
        store.save(imported.clone()).await.unwrap();

        let found = store.find_by_catalog_id("spot-1").await.unwrap().unwrap();
        assert_eq!(found.id, imported.id);

        store.delete(imported.id).await.unwrap();
        assert!(store.find_by_catalog_id("spot-1").await.unwrap().is_none());
    }
}
