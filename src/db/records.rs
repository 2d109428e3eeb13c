//! Row types shared between the store, the ingestion pipeline and the
//! gallery boundary.

use serde::{Deserialize, Serialize};

/// Shape bucket an image falls into, derived once from its dimensions.
///
/// The numeric value is what gets persisted in the `aspect` column
/// (1=big, 2=landscape, 3=portrait, 4=small).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectClass {
    Big,
    Landscape,
    Portrait,
    Small,
}

impl AspectClass {
    pub fn as_db(self) -> i64 {
        match self {
            AspectClass::Big => 1,
            AspectClass::Landscape => 2,
            AspectClass::Portrait => 3,
            AspectClass::Small => 4,
        }
    }

    pub fn from_db(value: i64) -> Option<Self> {
        match value {
            1 => Some(AspectClass::Big),
            2 => Some(AspectClass::Landscape),
            3 => Some(AspectClass::Portrait),
            4 => Some(AspectClass::Small),
            _ => None,
        }
    }
}

/// One row of the `images` table, with tag associations and notes joined in
/// when fetched through the day-range query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub id: i64,
    /// Source subfolder, typically a `YYYY-MM` bucket.
    pub directory: String,
    pub filename: String,
    /// Filesystem mtime at ingestion, unix milliseconds.
    pub created_at_ms: i64,
    /// ISO-8601 rendering of `created_at_ms`, local offset.
    pub iso_date: String,
    /// `YYYY-MM-DD` the record aggregates under. Shifted to the previous
    /// calendar day for early-morning captures; never changes after insert.
    pub day: String,
    pub format: String,
    pub size_mb: f64,
    pub aspect: AspectClass,
    pub deleted: bool,
    pub category_id: Option<i64>,
    pub tags: Vec<i64>,
    pub notes: Vec<MetadataNote>,
}

/// Column values for a fresh insert. The id and the joined collections do
/// not exist yet.
#[derive(Debug, Clone)]
pub struct NewMediaRecord {
    pub directory: String,
    pub filename: String,
    pub created_at_ms: i64,
    pub iso_date: String,
    pub day: String,
    pub format: String,
    pub size_mb: f64,
    pub aspect: AspectClass,
}

/// A user-defined tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub created_at: Option<String>,
}

/// An image category (one category per image, nullable).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub color: Option<String>,
    pub created_at: Option<String>,
}

/// Free-text annotation attached to an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataNote {
    pub id: i64,
    pub content: String,
    pub created_at: Option<String>,
    pub image_id: i64,
}

/// `(id, day)` pair returned by every mutation, so cached pages can be
/// patched without scanning days the mutation never touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Affected {
    pub media_id: i64,
    pub day: String,
}

/// One entry of the day-count aggregate driving pagination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCount {
    pub day: String,
    pub count: i64,
}
