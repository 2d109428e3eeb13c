//! The gallery facade: validated mutations, page fetching and change
//! notifications in one place. Callers never talk to the store or the
//! ingestor directly.

use anyhow::Result;
use chrono::Local;
use std::sync::mpsc;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::info;

use crate::config::Config;
use crate::db::{Category, Database, MetadataNote, Tag};
use crate::gallery::cache::MutationOutcome;
use crate::gallery::paginate::fetch_page;
use crate::gallery::Page;
use crate::ingest::{aggregation_day, IngestProgress, IngestReport, Ingestor};
use crate::notify::{Event, Notifier};

#[derive(Debug, Error)]
pub enum GalleryError {
    #[error("no tag with id {0}")]
    UnknownTag(i64),
    #[error("no category with id {0}")]
    UnknownCategory(i64),
    #[error("no images with ids {0:?}")]
    UnknownImages(Vec<i64>),
    #[error("no note with id {0}")]
    UnknownNote(i64),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

pub struct Gallery {
    db: Database,
    notifier: Notifier,
    ingestor: Ingestor,
    page_size: usize,
    cutoff_hour: u32,
}

impl Gallery {
    pub fn new(config: &Config, db: Database) -> Self {
        Self {
            db,
            notifier: Notifier::new(),
            ingestor: Ingestor::new(config),
            page_size: config.gallery.page_size,
            cutoff_hour: config.library.day_cutoff_hour,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.notifier.subscribe()
    }

    // ========================================================================
    // Browsing
    // ========================================================================

    /// Fetch a page of whole-day groups. Without a cursor the page starts
    /// at the current aggregation day, so captures from the small hours
    /// still show on yesterday's page.
    pub fn fetch_page(&self, cursor: Option<&str>) -> Result<Page, GalleryError> {
        let today;
        let cursor = match cursor {
            Some(c) => c,
            None => {
                today = aggregation_day(Local::now().naive_local(), self.cutoff_hour);
                &today
            }
        };
        Ok(fetch_page(&self.db, cursor, self.page_size)?)
    }

    // ========================================================================
    // Ingestion
    // ========================================================================

    /// Ingest one freshly captured file and broadcast its arrival.
    pub fn add_image(&self, filename: &str) -> Result<i64, GalleryError> {
        let id = self.ingestor.ingest_file(&self.db, filename)?;
        self.notifier.image_inserted(id);
        Ok(id)
    }

    pub fn ingest_library(
        &self,
        progress: Option<mpsc::Sender<IngestProgress>>,
    ) -> Result<IngestReport, GalleryError> {
        Ok(self.ingestor.ingest_library(&self.db, progress)?)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    pub fn assign_tag(
        &self,
        tag_id: i64,
        image_ids: &[i64],
    ) -> Result<MutationOutcome, GalleryError> {
        if !self.db.tag_exists(tag_id)? {
            return Err(GalleryError::UnknownTag(tag_id));
        }
        self.require_images(image_ids)?;
        let affected = self.db.assign_tag(tag_id, image_ids)?;
        info!(tag_id, count = affected.len(), "tagged images");
        Ok(MutationOutcome::Tag { tag_id, affected })
    }

    pub fn assign_category(
        &self,
        category_id: i64,
        image_ids: &[i64],
    ) -> Result<MutationOutcome, GalleryError> {
        if !self.db.category_exists(category_id)? {
            return Err(GalleryError::UnknownCategory(category_id));
        }
        self.require_images(image_ids)?;
        let affected = self.db.update_category(category_id, image_ids)?;
        info!(category_id, count = affected.len(), "categorized images");
        Ok(MutationOutcome::Category { category_id, affected })
    }

    pub fn delete_images(&self, image_ids: &[i64]) -> Result<MutationOutcome, GalleryError> {
        self.require_images(image_ids)?;
        let affected = self.db.delete_media(image_ids)?;
        info!(count = affected.len(), "deleted images");
        Ok(MutationOutcome::Delete { affected })
    }

    // ========================================================================
    // Tags, categories, notes
    // ========================================================================

    pub fn create_tag(&self, name: &str) -> Result<i64, GalleryError> {
        Ok(self.db.create_tag(name)?)
    }

    pub fn tags(&self) -> Result<Vec<Tag>, GalleryError> {
        Ok(self.db.all_tags()?)
    }

    pub fn delete_tags(&self, name: &str) -> Result<Vec<i64>, GalleryError> {
        Ok(self.db.delete_tags_by_name(name)?)
    }

    pub fn create_category(&self, name: &str) -> Result<i64, GalleryError> {
        Ok(self.db.create_category(name)?)
    }

    pub fn categories(&self) -> Result<Vec<Category>, GalleryError> {
        Ok(self.db.all_categories()?)
    }

    pub fn delete_categories(&self, name: &str) -> Result<Vec<i64>, GalleryError> {
        Ok(self.db.delete_categories_by_name(name)?)
    }

    pub fn add_note(&self, content: &str, image_ids: &[i64]) -> Result<usize, GalleryError> {
        self.require_images(image_ids)?;
        Ok(self.db.add_note(content, image_ids)?)
    }

    pub fn notes_for(&self, image_id: i64) -> Result<Vec<MetadataNote>, GalleryError> {
        Ok(self.db.notes_for(image_id)?)
    }

    pub fn delete_note(&self, note_id: i64) -> Result<(), GalleryError> {
        if self.db.delete_note(note_id)? == 0 {
            return Err(GalleryError::UnknownNote(note_id));
        }
        Ok(())
    }

    /// Reject a mutation outright when any requested id is unknown,
    /// rather than silently applying it to the subset that exists.
    fn require_images(&self, image_ids: &[i64]) -> Result<(), GalleryError> {
        let existing = self.db.existing_images(image_ids)?;
        let missing: Vec<i64> = image_ids
            .iter()
            .copied()
            .filter(|id| !existing.contains(id))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(GalleryError::UnknownImages(missing))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{AspectClass, NewMediaRecord};
    use std::fs;
    use tempfile::tempdir;

    fn gallery_with(records: usize) -> Gallery {
        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        for i in 0..records {
            db.insert_media(&NewMediaRecord {
                directory: "2024-06".into(),
                filename: format!("shot-{i}.png"),
                created_at_ms: 0,
                iso_date: format!("2024-06-10T{:02}:00:00+00:00", 6 + i % 12),
                day: "2024-06-10".into(),
                format: "png".into(),
                size_mb: 0.4,
                aspect: AspectClass::Small,
            })
            .unwrap();
        }
        Gallery::new(&Config::default(), db)
    }

    #[test]
    fn tagging_unknown_tag_is_rejected() {
        let gallery = gallery_with(2);
        let err = gallery.assign_tag(99, &[1]).unwrap_err();
        assert!(matches!(err, GalleryError::UnknownTag(99)));
    }

    #[test]
    fn mutations_reject_unknown_image_ids_wholesale() {
        let gallery = gallery_with(2);
        let tag = gallery.create_tag("later").unwrap();
        let err = gallery.assign_tag(tag, &[1, 2, 77]).unwrap_err();
        assert!(matches!(err, GalleryError::UnknownImages(ref ids) if ids == &[77]));

        // nothing was applied to the ids that do exist
        let page = gallery.fetch_page(Some("2024-06-10")).unwrap();
        assert!(page.items[0].images.iter().all(|r| r.tags.is_empty()));
    }

    #[test]
    fn tag_assignment_reports_every_requested_row() {
        let gallery = gallery_with(3);
        let tag = gallery.create_tag("meeting").unwrap();
        let outcome = gallery.assign_tag(tag, &[1, 2]).unwrap();
        match outcome {
            MutationOutcome::Tag { tag_id, affected } => {
                assert_eq!(tag_id, tag);
                assert_eq!(affected.len(), 2);
                assert!(affected.iter().all(|a| a.day == "2024-06-10"));
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }

    #[test]
    fn delete_removes_rows_from_subsequent_pages() {
        let gallery = gallery_with(3);
        let outcome = gallery.delete_images(&[2]).unwrap();
        assert!(matches!(outcome, MutationOutcome::Delete { ref affected } if affected.len() == 1));

        let page = gallery.fetch_page(Some("2024-06-10")).unwrap();
        let ids: Vec<i64> = page.items[0].images.iter().map(|r| r.id).collect();
        assert!(!ids.contains(&2));
        assert_eq!(ids.len(), 2);
    }

    #[test]
    fn deleting_a_missing_note_errors() {
        let gallery = gallery_with(1);
        let err = gallery.delete_note(123).unwrap_err();
        assert!(matches!(err, GalleryError::UnknownNote(123)));
    }

    #[test]
    fn add_image_notifies_subscribers() {
        let dir = tempdir().unwrap();
        let mut config = Config::default();
        config.library.full_dir = dir.path().join("full");
        config.library.thumbs_dir = dir.path().join("thumbs");

        let day = aggregation_day(Local::now().naive_local(), config.library.day_cutoff_hour);
        let bucket = config.library.full_dir.join(&day[..7]);
        fs::create_dir_all(&bucket).unwrap();
        let img = image::RgbaImage::from_pixel(320, 240, image::Rgba([10, 20, 30, 255]));
        img.save(bucket.join("fresh.png")).unwrap();

        let db = Database::open_in_memory().unwrap();
        db.initialize().unwrap();
        let gallery = Gallery::new(&config, db);
        let mut rx = gallery.subscribe();

        let id = gallery.add_image("fresh.png").unwrap();
        assert_eq!(rx.try_recv().unwrap(), Event::ImageInserted { id });
    }
}
