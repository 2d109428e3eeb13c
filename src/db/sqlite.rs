//! SQLite backend implementation.

use anyhow::Result;
use rusqlite::{params, params_from_iter, Connection};
use std::collections::HashMap;
use std::path::PathBuf;

use super::records::{
    Affected, AspectClass, Category, DayCount, MediaRecord, MetadataNote, NewMediaRecord, Tag,
};
use super::schema::{MIGRATIONS, SCHEMA};

pub struct SqliteDb {
    pub(crate) conn: Connection,
}

/// `?,?,...,?` for an IN clause of `n` values.
fn placeholders(n: usize) -> String {
    vec!["?"; n].join(",")
}

impl SqliteDb {
    pub fn open(path: &PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        self.run_migrations()?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        for migration in MIGRATIONS {
            let _ = self.conn.execute(migration, []);
        }
        Ok(())
    }

    // ========================================================================
    // Image operations
    // ========================================================================

    pub fn insert_media(&self, record: &NewMediaRecord) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO images (directory, filename, date_created, date_iso, date_agg, format, size, aspect)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                record.directory,
                record.filename,
                record.created_at_ms,
                record.iso_date,
                record.day,
                record.format,
                record.size_mb,
                record.aspect.as_db(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn media_exists(&self, directory: &str, filename: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM images WHERE directory = ? AND filename = ?",
            params![directory, filename],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    pub fn count_media(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM images WHERE deleted = 0", [], |row| {
                row.get(0)
            })?;
        Ok(count)
    }

    /// Which of `ids` actually exist (and are not soft-deleted).
    pub fn existing_images(&self, ids: &[i64]) -> Result<Vec<i64>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id FROM images WHERE deleted = 0 AND id IN ({}) ORDER BY id",
            placeholders(ids.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let existing = stmt
            .query_map(params_from_iter(ids.iter()), |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<i64>>>()?;
        Ok(existing)
    }

    /// Per-day record counts for all days up to and including `max_day`,
    /// most recent day first. Drives the pagination range walk.
    pub fn day_counts(&self, max_day: &str) -> Result<Vec<DayCount>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT date_agg, COUNT(id)
            FROM images
            WHERE deleted = 0 AND date_agg <= ?
            GROUP BY date_agg
            ORDER BY date_agg DESC
            "#,
        )?;
        let counts = stmt
            .query_map([max_day], |row| {
                Ok(DayCount {
                    day: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<DayCount>>>()?;
        Ok(counts)
    }

    /// Full records for the inclusive day range, newest first, with tag
    /// associations and notes stitched in.
    pub fn media_by_day_range(&self, start_day: &str, end_day: &str) -> Result<Vec<MediaRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, directory, filename, date_created, date_iso, date_agg,
                   format, size, aspect, deleted, category_id
            FROM images
            WHERE deleted = 0 AND date_agg BETWEEN ? AND ?
            ORDER BY date_iso DESC, id DESC
            "#,
        )?;
        let mut records = stmt
            .query_map(params![start_day, end_day], row_to_media)?
            .collect::<rusqlite::Result<Vec<MediaRecord>>>()?;

        if records.is_empty() {
            return Ok(records);
        }

        let ids: Vec<i64> = records.iter().map(|r| r.id).collect();
        let mut tags = self.tags_for_images(&ids)?;
        let mut notes = self.notes_for_images(&ids)?;
        for record in &mut records {
            if let Some(t) = tags.remove(&record.id) {
                record.tags = t;
            }
            if let Some(n) = notes.remove(&record.id) {
                record.notes = n;
            }
        }
        Ok(records)
    }

    fn tags_for_images(&self, ids: &[i64]) -> Result<HashMap<i64, Vec<i64>>> {
        let sql = format!(
            "SELECT image_id, tag_id FROM images_to_tags WHERE image_id IN ({}) ORDER BY tag_id",
            placeholders(ids.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut by_image: HashMap<i64, Vec<i64>> = HashMap::new();
        let rows = stmt
            .query_map(params_from_iter(ids.iter()), |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<(i64, i64)>>>()?;
        for (image_id, tag_id) in rows {
            by_image.entry(image_id).or_default().push(tag_id);
        }
        Ok(by_image)
    }

    fn notes_for_images(&self, ids: &[i64]) -> Result<HashMap<i64, Vec<MetadataNote>>> {
        let sql = format!(
            "SELECT id, content, created_at, image_id FROM metadata WHERE image_id IN ({}) ORDER BY id",
            placeholders(ids.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut by_image: HashMap<i64, Vec<MetadataNote>> = HashMap::new();
        let rows = stmt
            .query_map(params_from_iter(ids.iter()), |row| {
                Ok(MetadataNote {
                    id: row.get(0)?,
                    content: row.get(1)?,
                    created_at: row.get(2)?,
                    image_id: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<MetadataNote>>>()?;
        for note in rows {
            by_image.entry(note.image_id).or_default().push(note);
        }
        Ok(by_image)
    }

    fn affected_for(conn: &Connection, ids: &[i64]) -> Result<Vec<Affected>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT id, date_agg FROM images WHERE id IN ({}) ORDER BY id",
            placeholders(ids.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let affected = stmt
            .query_map(params_from_iter(ids.iter()), |row| {
                Ok(Affected {
                    media_id: row.get(0)?,
                    day: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<Affected>>>()?;
        Ok(affected)
    }

    // ========================================================================
    // Mutations returning affected (id, day) pairs
    // ========================================================================

    /// Associate a tag with each image. Already-associated pairs are kept
    /// as-is; the returned set covers every requested image either way.
    pub fn assign_tag(&self, tag_id: i64, image_ids: &[i64]) -> Result<Vec<Affected>> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt =
                tx.prepare("INSERT OR IGNORE INTO images_to_tags (image_id, tag_id) VALUES (?, ?)")?;
            for &image_id in image_ids {
                stmt.execute(params![image_id, tag_id])?;
            }
        }
        let affected = Self::affected_for(&tx, image_ids)?;
        tx.commit()?;
        Ok(affected)
    }

    pub fn update_category(&self, category_id: i64, image_ids: &[i64]) -> Result<Vec<Affected>> {
        if image_ids.is_empty() {
            return Ok(Vec::new());
        }
        let tx = self.conn.unchecked_transaction()?;
        let sql = format!(
            "UPDATE images SET category_id = ? WHERE id IN ({})",
            placeholders(image_ids.len())
        );
        tx.execute(
            &sql,
            params_from_iter(std::iter::once(category_id).chain(image_ids.iter().copied())),
        )?;
        let affected = Self::affected_for(&tx, image_ids)?;
        tx.commit()?;
        Ok(affected)
    }

    /// Hard delete: rows, their tag associations and their notes go in one
    /// transaction. The affected set is collected before anything is removed.
    pub fn delete_media(&self, image_ids: &[i64]) -> Result<Vec<Affected>> {
        if image_ids.is_empty() {
            return Ok(Vec::new());
        }
        let tx = self.conn.unchecked_transaction()?;
        let affected = Self::affected_for(&tx, image_ids)?;
        let ph = placeholders(image_ids.len());
        tx.execute(
            &format!("DELETE FROM images_to_tags WHERE image_id IN ({ph})"),
            params_from_iter(image_ids.iter()),
        )?;
        tx.execute(
            &format!("DELETE FROM metadata WHERE image_id IN ({ph})"),
            params_from_iter(image_ids.iter()),
        )?;
        tx.execute(
            &format!("DELETE FROM images WHERE id IN ({ph})"),
            params_from_iter(image_ids.iter()),
        )?;
        tx.commit()?;
        Ok(affected)
    }

    // ========================================================================
    // Tag operations
    // ========================================================================

    pub fn create_tag(&self, name: &str) -> Result<i64> {
        self.conn
            .execute("INSERT INTO tags (name) VALUES (?)", [name])?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn all_tags(&self) -> Result<Vec<Tag>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description, color, created_at FROM tags ORDER BY id")?;
        let tags = stmt
            .query_map([], |row| {
                Ok(Tag {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    color: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<Tag>>>()?;
        Ok(tags)
    }

    pub fn tag_exists(&self, tag_id: i64) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM tags WHERE id = ?",
            [tag_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Delete every tag with this name, dropping their image associations.
    /// Returns the deleted ids.
    pub fn delete_tags_by_name(&self, name: &str) -> Result<Vec<i64>> {
        let tx = self.conn.unchecked_transaction()?;
        let ids: Vec<i64> = {
            let mut stmt = tx.prepare("SELECT id FROM tags WHERE name = ?")?;
            let ids = stmt
                .query_map([name], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<i64>>>()?;
            ids
        };
        if !ids.is_empty() {
            let ph = placeholders(ids.len());
            tx.execute(
                &format!("DELETE FROM images_to_tags WHERE tag_id IN ({ph})"),
                params_from_iter(ids.iter()),
            )?;
            tx.execute(
                &format!("DELETE FROM tags WHERE id IN ({ph})"),
                params_from_iter(ids.iter()),
            )?;
        }
        tx.commit()?;
        Ok(ids)
    }

    // ========================================================================
    // Category operations
    // ========================================================================

    pub fn create_category(&self, name: &str) -> Result<i64> {
        self.conn
            .execute("INSERT INTO categories (name) VALUES (?)", [name])?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn all_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, color, created_at FROM categories ORDER BY id",
        )?;
        let categories = stmt
            .query_map([], |row| {
                Ok(Category {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                    color: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<Category>>>()?;
        Ok(categories)
    }

    pub fn category_exists(&self, category_id: i64) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM categories WHERE id = ?",
            [category_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Delete every category with this name, clearing the FK on images that
    /// referenced them. Returns the deleted ids.
    pub fn delete_categories_by_name(&self, name: &str) -> Result<Vec<i64>> {
        let tx = self.conn.unchecked_transaction()?;
        let ids: Vec<i64> = {
            let mut stmt = tx.prepare("SELECT id FROM categories WHERE name = ?")?;
            let ids = stmt
                .query_map([name], |row| row.get(0))?
                .collect::<rusqlite::Result<Vec<i64>>>()?;
            ids
        };
        if !ids.is_empty() {
            let ph = placeholders(ids.len());
            tx.execute(
                &format!("UPDATE images SET category_id = NULL WHERE category_id IN ({ph})"),
                params_from_iter(ids.iter()),
            )?;
            tx.execute(
                &format!("DELETE FROM categories WHERE id IN ({ph})"),
                params_from_iter(ids.iter()),
            )?;
        }
        tx.commit()?;
        Ok(ids)
    }

    // ========================================================================
    // Note operations
    // ========================================================================

    /// Attach the same note text to every existing image in `image_ids`.
    /// Returns how many notes were created.
    pub fn add_note(&self, content: &str, image_ids: &[i64]) -> Result<usize> {
        let existing = self.existing_images(image_ids)?;
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare("INSERT INTO metadata (content, image_id) VALUES (?, ?)")?;
            for &image_id in &existing {
                stmt.execute(params![content, image_id])?;
            }
        }
        tx.commit()?;
        Ok(existing.len())
    }

    pub fn notes_for(&self, image_id: i64) -> Result<Vec<MetadataNote>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, content, created_at, image_id FROM metadata WHERE image_id = ? ORDER BY id",
        )?;
        let notes = stmt
            .query_map([image_id], |row| {
                Ok(MetadataNote {
                    id: row.get(0)?,
                    content: row.get(1)?,
                    created_at: row.get(2)?,
                    image_id: row.get(3)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<MetadataNote>>>()?;
        Ok(notes)
    }

    pub fn delete_note(&self, note_id: i64) -> Result<usize> {
        let changes = self
            .conn
            .execute("DELETE FROM metadata WHERE id = ?", [note_id])?;
        Ok(changes)
    }
}

fn row_to_media(row: &rusqlite::Row<'_>) -> rusqlite::Result<MediaRecord> {
    let aspect_raw: i64 = row.get(8)?;
    let aspect = AspectClass::from_db(aspect_raw)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(8, aspect_raw))?;
    Ok(MediaRecord {
        id: row.get(0)?,
        directory: row.get(1)?,
        filename: row.get(2)?,
        created_at_ms: row.get(3)?,
        iso_date: row.get(4)?,
        day: row.get(5)?,
        format: row.get(6)?,
        size_mb: row.get(7)?,
        aspect,
        deleted: row.get(9)?,
        category_id: row.get(10)?,
        tags: Vec::new(),
        notes: Vec::new(),
    })
}
