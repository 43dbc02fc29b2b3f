use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;
use uuid::Uuid;

pub mod decode;

pub use decode::{decode_record, to_raw};

/// Wire field names used by the remote catalog record schema.
///
/// The reconciler mutates raw records by these names; the decode step
/// reads them exactly once when turning a raw record into a
/// [`CatalogRecord`].
pub mod fields {
    pub const NAME: &str = "name";
    pub const FOUNDER: &str = "founder";
    pub const DESCRIPTION: &str = "description";
    pub const DATE: &str = "date";
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
    pub const CATEGORY: &str = "type";
    pub const IMAGES: &str = "images";
    pub const LIKES: &str = "likes";
    pub const OFFENSIVE: &str = "offensive";
    pub const SPAM: &str = "spam";
    pub const INAPPROPRIATE: &str = "inappropriate";
    pub const DANGEROUS: &str = "dangerous";
    pub const HAS_MORE_IMAGES: &str = "has_more_images";
    pub const PLACE_NAME: &str = "place_name";
    pub const OWNER_ID: &str = "owner_id";
    pub const CREATED_AT: &str = "created_at";
}

const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Geographic coordinate in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to another coordinate in meters (haversine)
    pub fn distance_meters(&self, other: &Coordinate) -> f64 {
        let lat_a = self.latitude.to_radians();
        let lat_b = other.latitude.to_radians();
        let d_lat = (other.latitude - self.latitude).to_radians();
        let d_lon = (other.longitude - self.longitude).to_radians();

        let a = (d_lat / 2.0).sin().powi(2)
            + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_METERS * a.sqrt().asin()
    }
}

/// Content-addressed reference to a binary image attachment.
///
/// The `url`, when present, resolves lazily to the image payload; it is
/// transient and assigned by the backend on upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    pub id: String,
    pub url: Option<Url>,
}

/// Moderation flag selected by a reporting user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportReason {
    Offensive,
    Spam,
    Inappropriate,
    Dangerous,
}

impl ReportReason {
    /// The wire field name holding this reason's counter
    pub fn field_name(&self) -> &'static str {
        match self {
            Self::Offensive => fields::OFFENSIVE,
            Self::Spam => fields::SPAM,
            Self::Inappropriate => fields::INAPPROPRIATE,
            Self::Dangerous => fields::DANGEROUS,
        }
    }
}

/// Per-record moderation counters, all non-negative by construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportCounters {
    pub offensive: u64,
    pub spam: u64,
    pub inappropriate: u64,
    pub dangerous: u64,
}

impl ReportCounters {
    pub fn get(&self, reason: ReportReason) -> u64 {
        match reason {
            ReportReason::Offensive => self.offensive,
            ReportReason::Spam => self.spam,
            ReportReason::Inappropriate => self.inappropriate,
            ReportReason::Dangerous => self.dangerous,
        }
    }

    pub fn bump(&mut self, reason: ReportReason) {
        match reason {
            ReportReason::Offensive => self.offensive += 1,
            ReportReason::Spam => self.spam += 1,
            ReportReason::Inappropriate => self.inappropriate += 1,
            ReportReason::Dangerous => self.dangerous += 1,
        }
    }
}

/// One published spot, as decoded from its remote-authoritative record.
///
/// The identifier is globally unique and immutable after creation. Like
/// and report counters are non-negative; the unlike path refuses to take
/// the like count below zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub id: String,
    pub name: String,
    pub founder: String,
    pub description: String,
    /// Human-readable date string as entered by the founder
    pub date: String,
    pub coordinate: Coordinate,
    pub category: String,
    /// 1-3 content-addressed image references
    pub images: Vec<AssetRef>,
    pub likes: u64,
    pub reports: ReportCounters,
    /// Set when the spot carries more images than the feed thumbnail
    pub has_more_images: bool,
    pub place_name: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

impl CatalogRecord {
    /// Concatenated text the free-text filter matches against
    pub fn searchable_text(&self) -> String {
        format!(
            "{} {} {} {} {}",
            self.name, self.founder, self.description, self.place_name, self.category
        )
    }
}

/// A device-resident copy of a spot, owned by the local user.
///
/// Either fully original content that was never published, or an import
/// of a [`CatalogRecord`] carrying a back-reference to its identifier.
/// Persistence mechanics live behind [`crate::local::LocalSpotStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalSpot {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub date: String,
    pub coordinate: Coordinate,
    pub category: String,
    pub place_name: String,
    /// Identifier of the catalog record this spot was imported from
    pub catalog_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LocalSpot {
    /// Create a local copy of a published spot, keyed back to its
    /// catalog identifier for de-duplication on later imports.
    pub fn imported_from(record: &CatalogRecord) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: record.name.clone(),
            description: record.description.clone(),
            date: record.date.clone(),
            coordinate: record.coordinate,
            category: record.category.clone(),
            place_name: record.place_name.clone(),
            catalog_id: Some(record.id.clone()),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Everything the publish path needs to create a new catalog record.
///
/// Image payloads are uploaded as out-of-band binary attachments and
/// referenced from the saved record.
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub name: String,
    pub founder: String,
    pub description: String,
    pub date: String,
    pub coordinate: Coordinate,
    pub category: String,
    pub place_name: String,
    pub images: Vec<Vec<u8>>,
}

/// Owner-editable fields overlaid onto the current remote record
#[derive(Debug, Clone)]
pub struct SpotEdit {
    pub name: String,
    pub description: String,
    pub category: String,
}

/// A single typed value inside a raw remote record
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Double(f64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    Asset(AssetRef),
    AssetList(Vec<AssetRef>),
}

/// The backend's schemaless record representation: an identifier plus a
/// bag of named fields. Mutations operate on this shape so that fields
/// the edit form never touched survive a save untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub id: String,
    pub fields: HashMap<String, FieldValue>,
}

impl RawRecord {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            fields: HashMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn set<S: Into<String>>(&mut self, name: S, value: FieldValue) {
        self.fields.insert(name.into(), value);
    }
}
