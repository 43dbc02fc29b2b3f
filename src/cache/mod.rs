//! Local view cache.
//!
//! The ordered, identifier-deduplicated record list backing one UI
//! feed. The cache is bound to the query that populated it and holds
//! the current continuation token; mutations confirmed by the
//! reconciler are applied in place by identifier, never by re-fetching.
//!
//! Removal keeps a deleted-this-session exclusion set so a page that
//! was already in flight when the user deleted a record cannot
//! re-insert it. A reset (new query) clears the set; the fresh fetch
//! revalidates against the remote.

use std::collections::HashSet;

use crate::engine::ContinuationToken;
use crate::models::{CatalogRecord, ReportReason};
use crate::query::QueryDescription;

#[derive(Debug, Default)]
pub struct ViewCache {
    query: Option<QueryDescription>,
    records: Vec<CatalogRecord>,
    ids: HashSet<String>,
    token: Option<ContinuationToken>,
    deleted: HashSet<String>,
}

impl ViewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The query this cache is currently bound to
    pub fn query(&self) -> Option<&QueryDescription> {
        self.query.as_ref()
    }

    pub fn records(&self) -> &[CatalogRecord] {
        &self.records
    }

    pub fn token(&self) -> Option<&ContinuationToken> {
        self.token.as_ref()
    }

    pub fn set_token(&mut self, token: Option<ContinuationToken>) {
        self.token = token;
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&CatalogRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Clear contents and rebind to a new query. Safe to call with a
    /// query equal to the current one; the clear is idempotent.
    pub fn reset(&mut self, query: QueryDescription) {
        self.query = Some(query);
        self.records.clear();
        self.ids.clear();
        self.token = None;
        self.deleted.clear();
    }

    /// Replace the full contents; used only for the first page of a
    /// fresh query.
    pub fn replace_all(&mut self, records: Vec<CatalogRecord>) {
        self.records.clear();
        self.ids.clear();
        self.append(records);
    }

    /// Append records not already present by identifier. First
    /// occurrence wins; later duplicates and records deleted this
    /// session are silently dropped. Returns how many were kept.
    pub fn append(&mut self, records: Vec<CatalogRecord>) -> usize {
        let mut kept = 0;
        for record in records {
            if self.deleted.contains(&record.id) || !self.ids.insert(record.id.clone()) {
                continue;
            }
            self.records.push(record);
            kept += 1;
        }
        kept
    }

    /// Set the like count on a cached record in place
    pub fn set_like_count(&mut self, id: &str, likes: u64) -> bool {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.likes = likes;
                true
            }
            None => false,
        }
    }

    /// Bump a report counter on a cached record in place
    pub fn bump_report(&mut self, id: &str, reason: ReportReason) -> bool {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                record.reports.bump(reason);
                true
            }
            None => false,
        }
    }

    /// Overwrite a cached record with an updated copy, matched by
    /// identifier
    pub fn apply_record(&mut self, updated: CatalogRecord) -> bool {
        match self.records.iter_mut().find(|r| r.id == updated.id) {
            Some(record) => {
                *record = updated;
                true
            }
            None => false,
        }
    }

    /// Remove a record by identifier, shifting subsequent indices. The
    /// identifier joins the exclusion set either way, so a late page
    /// cannot re-insert a record deleted this session.
    pub fn remove(&mut self, id: &str) -> bool {
        self.deleted.insert(id.to_string());
        let existed = self.ids.remove(id);
        if existed {
            self.records.retain(|r| r.id != id);
        }
        existed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::decode::tests_support::sample_record;
    use crate::models::Coordinate;
    use crate::query::{QueryBuilder, SortMode};

    fn bound_cache() -> ViewCache {
        let mut cache = ViewCache::new();
        cache.reset(QueryBuilder::new(Coordinate::new(33.71, -112.29)).build());
        cache
    }

    #[test]
    fn test_append_dedups_and_preserves_first_seen_order() {
        let mut cache = bound_cache();
        cache.append(vec![sample_record("a"), sample_record("b")]);

        let mut later_a = sample_record("a");
        later_a.name = "Renamed elsewhere".to_string();
        let kept = cache.append(vec![later_a, sample_record("c"), sample_record("b")]);

        assert_eq!(kept, 1);
        let ids: Vec<&str> = cache.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        // First occurrence wins: the rename never clobbered the original
        assert_eq!(cache.get("a").unwrap().name, "Spot a");
    }

    #[test]
    fn test_reset_clears_contents_and_token() {
        let mut cache = bound_cache();
        cache.append(vec![sample_record("a")]);
        cache.remove("a");

        let new_query = QueryBuilder::new(Coordinate::new(0.0, 0.0))
            .sort(SortMode::Newest)
            .build();
        cache.reset(new_query.clone());
        assert!(cache.is_empty());
        assert!(cache.token().is_none());
        assert_eq!(cache.query(), Some(&new_query));

        // The exclusion set was cleared too: a fresh query revalidates
        assert_eq!(cache.append(vec![sample_record("a")]), 1);
    }

    #[test]
    fn test_removed_record_is_not_reinserted_by_late_page() {
        let mut cache = bound_cache();
        cache.append(vec![sample_record("x"), sample_record("y")]);
        assert!(cache.remove("y"));

        // A page that was in flight during the delete still contains y
        let kept = cache.append(vec![sample_record("y"), sample_record("z")]);
        assert_eq!(kept, 1);
        assert!(cache.get("y").is_none());
        assert!(cache.get("z").is_some());
    }

    #[test]
    fn test_remove_unknown_id_still_excludes_it() {
        let mut cache = bound_cache();
        assert!(!cache.remove("ghost"));
        assert_eq!(cache.append(vec![sample_record("ghost")]), 0);
    }

    #[test]
    fn test_mutations_apply_in_place_by_identifier() {
        let mut cache = bound_cache();
        cache.append(vec![sample_record("a"), sample_record("b")]);

        assert!(cache.set_like_count("b", 7));
        assert_eq!(cache.get("b").unwrap().likes, 7);

        assert!(cache.bump_report("a", crate::models::ReportReason::Spam));
        assert_eq!(
            cache.get("a").unwrap().reports.spam,
            1,
            "report applied in place"
        );

        assert!(!cache.set_like_count("missing", 1));
    }

    #[test]
    fn test_replace_all_swaps_contents() {
        let mut cache = bound_cache();
        cache.append(vec![sample_record("a"), sample_record("b")]);
        cache.replace_all(vec![sample_record("c")]);
        let ids: Vec<&str> = cache.records().iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c"]);
    }
}
