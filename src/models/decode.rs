//! The single decode step between raw remote records and [`CatalogRecord`].
//!
//! Every raw field is read exactly once, here. Identity-bearing fields
//! (`name`, `latitude`, `longitude`, `created_at`) are required; the
//! rest follow named default-substitution rules:
//!
//! - counters (`likes` and the four report counters) default to 0 and
//!   clamp negative wire values to 0
//! - text fields default to the empty string
//! - `images` defaults to the empty list (the 1-3 invariant is enforced
//!   on publish, not on display)
//! - `has_more_images` defaults to false

use chrono::{DateTime, Utc};

use super::{fields, AssetRef, CatalogRecord, Coordinate, FieldValue, RawRecord, ReportCounters};
use crate::errors::DecodeError;

/// Decode one raw remote record into a [`CatalogRecord`].
pub fn decode_record(raw: &RawRecord) -> Result<CatalogRecord, DecodeError> {
    Ok(CatalogRecord {
        id: raw.id.clone(),
        name: required_text(raw, fields::NAME)?,
        founder: text_or_default(raw, fields::FOUNDER)?,
        description: text_or_default(raw, fields::DESCRIPTION)?,
        date: text_or_default(raw, fields::DATE)?,
        coordinate: Coordinate {
            latitude: required_double(raw, fields::LATITUDE)?,
            longitude: required_double(raw, fields::LONGITUDE)?,
        },
        category: text_or_default(raw, fields::CATEGORY)?,
        images: assets_or_default(raw, fields::IMAGES)?,
        likes: counter_or_zero(raw, fields::LIKES)?,
        reports: ReportCounters {
            offensive: counter_or_zero(raw, fields::OFFENSIVE)?,
            spam: counter_or_zero(raw, fields::SPAM)?,
            inappropriate: counter_or_zero(raw, fields::INAPPROPRIATE)?,
            dangerous: counter_or_zero(raw, fields::DANGEROUS)?,
        },
        has_more_images: bool_or_false(raw, fields::HAS_MORE_IMAGES)?,
        place_name: text_or_default(raw, fields::PLACE_NAME)?,
        owner_id: text_or_default(raw, fields::OWNER_ID)?,
        created_at: required_timestamp(raw, fields::CREATED_AT)?,
    })
}

/// Encode a [`CatalogRecord`] back into the raw wire shape.
///
/// Used by the publish path and by tests seeding the in-memory backend.
pub fn to_raw(record: &CatalogRecord) -> RawRecord {
    let mut raw = RawRecord::new(record.id.clone());
    raw.set(fields::NAME, FieldValue::Text(record.name.clone()));
    raw.set(fields::FOUNDER, FieldValue::Text(record.founder.clone()));
    raw.set(
        fields::DESCRIPTION,
        FieldValue::Text(record.description.clone()),
    );
    raw.set(fields::DATE, FieldValue::Text(record.date.clone()));
    raw.set(
        fields::LATITUDE,
        FieldValue::Double(record.coordinate.latitude),
    );
    raw.set(
        fields::LONGITUDE,
        FieldValue::Double(record.coordinate.longitude),
    );
    raw.set(fields::CATEGORY, FieldValue::Text(record.category.clone()));
    raw.set(
        fields::IMAGES,
        FieldValue::AssetList(record.images.clone()),
    );
    raw.set(fields::LIKES, FieldValue::Int(record.likes as i64));
    raw.set(
        fields::OFFENSIVE,
        FieldValue::Int(record.reports.offensive as i64),
    );
    raw.set(fields::SPAM, FieldValue::Int(record.reports.spam as i64));
    raw.set(
        fields::INAPPROPRIATE,
        FieldValue::Int(record.reports.inappropriate as i64),
    );
    raw.set(
        fields::DANGEROUS,
        FieldValue::Int(record.reports.dangerous as i64),
    );
    raw.set(
        fields::HAS_MORE_IMAGES,
        FieldValue::Bool(record.has_more_images),
    );
    raw.set(
        fields::PLACE_NAME,
        FieldValue::Text(record.place_name.clone()),
    );
    raw.set(fields::OWNER_ID, FieldValue::Text(record.owner_id.clone()));
    raw.set(
        fields::CREATED_AT,
        FieldValue::Timestamp(record.created_at),
    );
    raw
}

fn required_text(raw: &RawRecord, field: &'static str) -> Result<String, DecodeError> {
    match raw.get(field) {
        Some(FieldValue::Text(s)) => Ok(s.clone()),
        Some(_) => Err(DecodeError::WrongType {
            field,
            expected: "text",
        }),
        None => Err(DecodeError::MissingField { field }),
    }
}

fn text_or_default(raw: &RawRecord, field: &'static str) -> Result<String, DecodeError> {
    match raw.get(field) {
        Some(FieldValue::Text(s)) => Ok(s.clone()),
        Some(_) => Err(DecodeError::WrongType {
            field,
            expected: "text",
        }),
        None => Ok(String::new()),
    }
}

fn required_double(raw: &RawRecord, field: &'static str) -> Result<f64, DecodeError> {
    match raw.get(field) {
        Some(FieldValue::Double(v)) => Ok(*v),
        Some(FieldValue::Int(v)) => Ok(*v as f64),
        Some(_) => Err(DecodeError::WrongType {
            field,
            expected: "double",
        }),
        None => Err(DecodeError::MissingField { field }),
    }
}

fn required_timestamp(
    raw: &RawRecord,
    field: &'static str,
) -> Result<DateTime<Utc>, DecodeError> {
    match raw.get(field) {
        Some(FieldValue::Timestamp(ts)) => Ok(*ts),
        Some(_) => Err(DecodeError::WrongType {
            field,
            expected: "timestamp",
        }),
        None => Err(DecodeError::MissingField { field }),
    }
}

fn counter_or_zero(raw: &RawRecord, field: &'static str) -> Result<u64, DecodeError> {
    match raw.get(field) {
        Some(FieldValue::Int(n)) => Ok((*n).max(0) as u64),
        Some(_) => Err(DecodeError::WrongType {
            field,
            expected: "integer",
        }),
        None => Ok(0),
    }
}

fn bool_or_false(raw: &RawRecord, field: &'static str) -> Result<bool, DecodeError> {
    match raw.get(field) {
        Some(FieldValue::Bool(b)) => Ok(*b),
        Some(_) => Err(DecodeError::WrongType {
            field,
            expected: "bool",
        }),
        None => Ok(false),
    }
}

fn assets_or_default(raw: &RawRecord, field: &'static str) -> Result<Vec<AssetRef>, DecodeError> {
    match raw.get(field) {
        Some(FieldValue::AssetList(assets)) => Ok(assets.clone()),
        Some(FieldValue::Asset(asset)) => Ok(vec![asset.clone()]),
        Some(_) => Err(DecodeError::WrongType {
            field,
            expected: "asset list",
        }),
        None => Ok(Vec::new()),
    }
}

#[cfg(test)]
pub(crate) mod tests_support {
    use chrono::TimeZone;

    use super::*;

    /// A fully populated record for unit tests
    pub fn sample_record(id: &str) -> CatalogRecord {
        CatalogRecord {
            id: id.to_string(),
            name: format!("Spot {id}"),
            founder: "Avery".to_string(),
            description: "Quiet overlook off the wash trail".to_string(),
            date: "March 2024".to_string(),
            coordinate: Coordinate::new(33.71, -112.29),
            category: "Hiking".to_string(),
            images: vec![AssetRef {
                id: format!("asset-{id}"),
                url: None,
            }],
            likes: 0,
            reports: ReportCounters::default(),
            has_more_images: false,
            place_name: "Sonoran Preserve".to_string(),
            owner_id: "user-1".to_string(),
            created_at: Utc.with_ymd_and_hms(2024, 3, 10, 18, 0, 0).unwrap(),
        }
    }
}
