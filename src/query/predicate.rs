//! Client-side predicate evaluation and sort ordering.
//!
//! Shared by the in-memory backend and by subscription matching so both
//! agree with the query builder on what a query means.

use std::cmp::Ordering;

use crate::models::CatalogRecord;

use super::{QueryDescription, SortMode};

/// Whether a record satisfies the query's distance and text predicates.
///
/// The free-text test is case-sensitive substring containment against
/// the record's full searchable text, AND'd with the distance bound.
pub fn matches(record: &CatalogRecord, query: &QueryDescription) -> bool {
    if query.radius_meters > 0.0
        && record.coordinate.distance_meters(&query.origin) > query.radius_meters
    {
        return false;
    }
    if let Some(text) = &query.text_filter {
        if !record.searchable_text().contains(text.as_str()) {
            return false;
        }
    }
    true
}

/// Total order over records for the query's sort mode.
///
/// Each mode expands to its exact descriptor chain; every chain closes
/// with an identifier comparison so repeated sorts of the same set are
/// byte-identical.
pub fn compare(a: &CatalogRecord, b: &CatalogRecord, query: &QueryDescription) -> Ordering {
    let chained = match query.sort {
        SortMode::Closest => by_distance(a, b, query).then_with(|| by_created_desc(a, b)),
        SortMode::Likes => b
            .likes
            .cmp(&a.likes)
            .then_with(|| by_distance(a, b, query))
            .then_with(|| by_created_desc(a, b)),
        SortMode::Name => a
            .name
            .cmp(&b.name)
            .then_with(|| by_distance(a, b, query))
            .then_with(|| by_created_desc(a, b)),
        SortMode::Newest => by_created_desc(a, b).then_with(|| by_distance(a, b, query)),
    };
    chained.then_with(|| a.id.cmp(&b.id))
}

fn by_distance(a: &CatalogRecord, b: &CatalogRecord, query: &QueryDescription) -> Ordering {
    let da = a.coordinate.distance_meters(&query.origin);
    let db = b.coordinate.distance_meters(&query.origin);
    da.total_cmp(&db)
}

fn by_created_desc(a: &CatalogRecord, b: &CatalogRecord) -> Ordering {
    b.created_at.cmp(&a.created_at)
}
