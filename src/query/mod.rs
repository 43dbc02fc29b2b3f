//! Catalog query construction
//!
//! Translates user-facing filter and sort intent into an immutable
//! [`QueryDescription`]. Building is pure and infallible: equal inputs
//! always yield equal descriptions, and description equality is what
//! decides whether a view cache must reset.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::models::Coordinate;

pub mod predicate;

/// Sort mode for a catalog feed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    Closest,
    Likes,
    Name,
    Newest,
}

/// An immutable description of one catalog search.
///
/// `radius_meters == 0.0` means the distance filter is unbounded. The
/// text filter, when present, is already whitespace-trimmed and
/// non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDescription {
    pub text_filter: Option<String>,
    pub origin: Coordinate,
    pub radius_meters: f64,
    pub sort: SortMode,
}

impl QueryDescription {
    /// Stable digest binding continuation tokens to the query that
    /// produced them. Float fields hash by bit pattern so two equal
    /// descriptions always fingerprint identically.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        if let Some(text) = &self.text_filter {
            hasher.update(text.as_bytes());
        }
        hasher.update([0u8]);
        hasher.update(self.origin.latitude.to_bits().to_be_bytes());
        hasher.update(self.origin.longitude.to_bits().to_be_bytes());
        hasher.update(self.radius_meters.to_bits().to_be_bytes());
        hasher.update([self.sort as u8]);
        let hash = hasher.finalize();
        format!("{hash:x}")
    }
}

/// Builder mapping raw UI intent onto a [`QueryDescription`].
///
/// Never fails: a negative radius clamps to 0 (unbounded), and a text
/// filter that is empty after trimming is treated as absent.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    text_filter: Option<String>,
    origin: Coordinate,
    radius_meters: f64,
    sort: SortMode,
}

impl QueryBuilder {
    pub fn new(origin: Coordinate) -> Self {
        Self {
            text_filter: None,
            origin,
            radius_meters: 0.0,
            sort: SortMode::Closest,
        }
    }

    /// Free-text substring filter, matched case-sensitively against the
    /// record's searchable text
    pub fn text_filter<S: Into<String>>(mut self, text: S) -> Self {
        self.text_filter = Some(text.into());
        self
    }

    /// Circular distance bound around the origin; 0 means unbounded
    pub fn radius_meters(mut self, radius: f64) -> Self {
        self.radius_meters = radius;
        self
    }

    pub fn sort(mut self, sort: SortMode) -> Self {
        self.sort = sort;
        self
    }

    pub fn build(self) -> QueryDescription {
        let text_filter = self
            .text_filter
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        let radius_meters = if self.radius_meters.is_finite() && self.radius_meters > 0.0 {
            self.radius_meters
        } else {
            0.0
        };
        QueryDescription {
            text_filter,
            origin: self.origin,
            radius_meters,
            sort: self.sort,
        }
    }
}
