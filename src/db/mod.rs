mod schema;
pub mod records;
pub mod sqlite;

use anyhow::Result;
use std::path::PathBuf;

pub use records::{
    Affected, AspectClass, Category, DayCount, MediaRecord, MetadataNote, NewMediaRecord, Tag,
};
pub use schema::{MIGRATIONS, SCHEMA};

/// Macro to dispatch a method call to the active backend variant.
macro_rules! dispatch {
    // No arguments beyond self
    ($self:expr, $method:ident()) => {
        match &$self.inner {
            DatabaseInner::Sqlite(db) => db.$method(),
        }
    };
    // With arguments
    ($self:expr, $method:ident($($arg:expr),+ $(,)?)) => {
        match &$self.inner {
            DatabaseInner::Sqlite(db) => db.$method($($arg),+),
        }
    };
}

/// Backend seam: a second variant (e.g. a server database) can be added
/// here without touching any caller.
enum DatabaseInner {
    Sqlite(sqlite::SqliteDb),
}

/// The store facade the rest of the crate talks to. Owns a single
/// connection, so writes naturally serialize through whoever holds it.
pub struct Database {
    inner: DatabaseInner,
}

impl Database {
    pub fn open(path: &PathBuf) -> Result<Self> {
        let db = sqlite::SqliteDb::open(path)?;
        Ok(Self {
            inner: DatabaseInner::Sqlite(db),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let db = sqlite::SqliteDb::open_in_memory()?;
        Ok(Self {
            inner: DatabaseInner::Sqlite(db),
        })
    }

    pub fn initialize(&self) -> Result<()> {
        dispatch!(self, initialize())
    }

    // ========================================================================
    // Image operations
    // ========================================================================

    pub fn insert_media(&self, record: &NewMediaRecord) -> Result<i64> {
        dispatch!(self, insert_media(record))
    }

    pub fn media_exists(&self, directory: &str, filename: &str) -> Result<bool> {
        dispatch!(self, media_exists(directory, filename))
    }

    pub fn count_media(&self) -> Result<i64> {
        dispatch!(self, count_media())
    }

    pub fn existing_images(&self, ids: &[i64]) -> Result<Vec<i64>> {
        dispatch!(self, existing_images(ids))
    }

    pub fn day_counts(&self, max_day: &str) -> Result<Vec<DayCount>> {
        dispatch!(self, day_counts(max_day))
    }

    pub fn media_by_day_range(&self, start_day: &str, end_day: &str) -> Result<Vec<MediaRecord>> {
        dispatch!(self, media_by_day_range(start_day, end_day))
    }

    pub fn assign_tag(&self, tag_id: i64, image_ids: &[i64]) -> Result<Vec<Affected>> {
        dispatch!(self, assign_tag(tag_id, image_ids))
    }

    pub fn update_category(&self, category_id: i64, image_ids: &[i64]) -> Result<Vec<Affected>> {
        dispatch!(self, update_category(category_id, image_ids))
    }

    pub fn delete_media(&self, image_ids: &[i64]) -> Result<Vec<Affected>> {
        dispatch!(self, delete_media(image_ids))
    }

    // ========================================================================
    // Tag operations
    // ========================================================================

    pub fn create_tag(&self, name: &str) -> Result<i64> {
        dispatch!(self, create_tag(name))
    }

    pub fn all_tags(&self) -> Result<Vec<Tag>> {
        dispatch!(self, all_tags())
    }

    pub fn tag_exists(&self, tag_id: i64) -> Result<bool> {
        dispatch!(self, tag_exists(tag_id))
    }

    pub fn delete_tags_by_name(&self, name: &str) -> Result<Vec<i64>> {
        dispatch!(self, delete_tags_by_name(name))
    }

    // ========================================================================
    // Category operations
    // ========================================================================

    pub fn create_category(&self, name: &str) -> Result<i64> {
        dispatch!(self, create_category(name))
    }

    pub fn all_categories(&self) -> Result<Vec<Category>> {
        dispatch!(self, all_categories())
    }

    pub fn category_exists(&self, category_id: i64) -> Result<bool> {
        dispatch!(self, category_exists(category_id))
    }

    pub fn delete_categories_by_name(&self, name: &str) -> Result<Vec<i64>> {
        dispatch!(self, delete_categories_by_name(name))
    }

    // ========================================================================
    // Note operations
    // ========================================================================

    pub fn add_note(&self, content: &str, image_ids: &[i64]) -> Result<usize> {
        dispatch!(self, add_note(content, image_ids))
    }

    pub fn notes_for(&self, image_id: i64) -> Result<Vec<MetadataNote>> {
        dispatch!(self, notes_for(image_id))
    }

    pub fn delete_note(&self, note_id: i64) -> Result<usize> {
        dispatch!(self, delete_note(note_id))
    }
}
