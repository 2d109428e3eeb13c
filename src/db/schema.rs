pub const SCHEMA: &str = r#"
-- Images table: one row per ingested screenshot
CREATE TABLE IF NOT EXISTS images (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    directory TEXT NOT NULL,
    filename TEXT NOT NULL,
    date_created INTEGER NOT NULL,  -- unix milliseconds, fs mtime at ingestion
    date_iso TEXT NOT NULL,         -- ISO-8601 rendering of date_created
    date_agg TEXT NOT NULL,         -- YYYY-MM-DD aggregation day (cutoff-shifted)
    format TEXT NOT NULL,           -- png, gif, ...
    size REAL NOT NULL,             -- size in MB, 2 decimals
    aspect INTEGER NOT NULL,        -- 1=big, 2=landscape, 3=portrait, 4=small
    deleted INTEGER NOT NULL DEFAULT 0,
    category_id INTEGER,
    UNIQUE (directory, filename)
);

CREATE INDEX IF NOT EXISTS idx_images_date_agg ON images(date_agg);
CREATE INDEX IF NOT EXISTS idx_images_directory ON images(directory);
CREATE INDEX IF NOT EXISTS idx_images_category ON images(category_id);

-- Tags: named labels, many-to-many with images
CREATE TABLE IF NOT EXISTS tags (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    color TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- Categories: one per image, nullable FK on images
CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    description TEXT,
    color TEXT,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- Image/tag association; duplicate assignment is a no-op
CREATE TABLE IF NOT EXISTS images_to_tags (
    image_id INTEGER NOT NULL,
    tag_id INTEGER NOT NULL,
    PRIMARY KEY (image_id, tag_id),
    FOREIGN KEY (image_id) REFERENCES images(id) ON DELETE CASCADE,
    FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_images_to_tags_tag ON images_to_tags(tag_id);

-- Free-text notes attached to images
CREATE TABLE IF NOT EXISTS metadata (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
    image_id INTEGER NOT NULL,
    FOREIGN KEY (image_id) REFERENCES images(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_metadata_image ON metadata(image_id);
"#;

/// Applied after the base schema on every startup. Statements that fail
/// (e.g. a column that already exists) are ignored.
pub const MIGRATIONS: &[&str] = &[
    // Pre-category databases lack this column.
    "ALTER TABLE images ADD COLUMN category_id INTEGER",
    // Soft-delete flag arrived after the first schema version.
    "ALTER TABLE images ADD COLUMN deleted INTEGER NOT NULL DEFAULT 0",
];
