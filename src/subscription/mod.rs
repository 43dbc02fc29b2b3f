//! Push-subscription predicate construction.
//!
//! A subscription asks the backend to notify this device when a new
//! spot appears inside a saved area of interest: a center point, a
//! radius, and up to three OR'd substring filters. Permission state and
//! notification delivery are entirely external; this module only builds
//! the predicate and hands it to the backend for registration.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::models::{CatalogRecord, Coordinate};

/// Upper bound on OR'd substring filters per subscription
pub const MAX_TEXT_FILTERS: usize = 3;

/// A registered-or-registrable notification predicate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationSubscription {
    pub center: Coordinate,
    /// 0 means any distance
    pub radius_meters: f64,
    /// OR'd case-sensitive substring filters, at most [`MAX_TEXT_FILTERS`]
    pub text_filters: Vec<String>,
}

impl NotificationSubscription {
    /// Whether a record would trigger this subscription.
    ///
    /// Mirrors the catalog query predicate: distance bound AND'd with
    /// the OR of the substring filters (an empty filter list matches
    /// every record in range).
    pub fn matches(&self, record: &CatalogRecord) -> bool {
        if self.radius_meters > 0.0
            && record.coordinate.distance_meters(&self.center) > self.radius_meters
        {
            return false;
        }
        if self.text_filters.is_empty() {
            return true;
        }
        let haystack = record.searchable_text();
        self.text_filters.iter().any(|f| haystack.contains(f.as_str()))
    }
}

/// Builder applying the same clamping and trimming rules as the catalog
/// query builder. Never fails; filters beyond the limit are dropped.
#[derive(Debug, Clone)]
pub struct SubscriptionBuilder {
    center: Coordinate,
    radius_meters: f64,
    text_filters: Vec<String>,
}

impl SubscriptionBuilder {
    pub fn new(center: Coordinate) -> Self {
        Self {
            center,
            radius_meters: 0.0,
            text_filters: Vec::new(),
        }
    }

    pub fn radius_meters(mut self, radius: f64) -> Self {
        self.radius_meters = radius;
        self
    }

    pub fn text_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.text_filters.push(filter.into());
        self
    }

    pub fn build(self) -> NotificationSubscription {
        let radius_meters = if self.radius_meters.is_finite() && self.radius_meters > 0.0 {
            self.radius_meters
        } else {
            0.0
        };
        let mut text_filters: Vec<String> = self
            .text_filters
            .into_iter()
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty())
            .collect();
        if text_filters.len() > MAX_TEXT_FILTERS {
            warn!(
                dropped = text_filters.len() - MAX_TEXT_FILTERS,
                "subscription text filters over the limit, dropping extras"
            );
            text_filters.truncate(MAX_TEXT_FILTERS);
        }
        NotificationSubscription {
            center: self.center,
            radius_meters,
            text_filters,
        }
    }
}
