//! Metadata extraction: dimensions, format, size and timestamps for a
//! single media file, plus the aggregation-day derivation.

use chrono::{DateTime, Duration, Local, NaiveDateTime, Timelike};
use std::path::Path;

use super::IngestError;

/// Everything the pipeline needs to know about a source file before
/// classification and thumbnailing.
#[derive(Debug, Clone)]
pub struct MediaMetadata {
    pub width: u32,
    pub height: u32,
    /// Lowercase extension-style format name ("png", "gif", ...).
    pub format: String,
    /// File size in megabytes, rounded to 2 decimals.
    pub size_mb: f64,
    /// Filesystem mtime in local time.
    pub created_at: DateTime<Local>,
    /// ISO-8601 rendering of `created_at`.
    pub iso_date: String,
}

pub fn extract_metadata(path: &Path) -> Result<MediaMetadata, IngestError> {
    let extraction = |reason: String| IngestError::Extraction {
        path: path.to_path_buf(),
        reason,
    };

    let fs_meta = std::fs::metadata(path).map_err(|e| extraction(e.to_string()))?;
    let modified = fs_meta
        .modified()
        .map_err(|e| extraction(e.to_string()))?;
    let created_at: DateTime<Local> = modified.into();

    let reader = image::ImageReader::open(path)
        .map_err(|e| extraction(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| extraction(e.to_string()))?;
    let format = reader
        .format()
        .ok_or_else(|| extraction("unrecognized image format".to_string()))?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| extraction(e.to_string()))?;
    if width == 0 || height == 0 {
        return Err(extraction(format!("zero dimensions {width}x{height}")));
    }

    let format = format
        .extensions_str()
        .first()
        .copied()
        .unwrap_or("unknown")
        .to_string();

    Ok(MediaMetadata {
        width,
        height,
        format,
        size_mb: size_in_mb(fs_meta.len()),
        created_at,
        iso_date: created_at.to_rfc3339(),
    })
}

/// Bytes to megabytes, rounded to 2 decimals.
pub fn size_in_mb(bytes: u64) -> f64 {
    (bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
}

/// The `YYYY-MM-DD` heading a capture groups under. Captures before the
/// early-morning cutoff count as the previous calendar day, so a night
/// session stays together. Derived once at ingestion, immutable after.
pub fn aggregation_day(local: NaiveDateTime, cutoff_hour: u32) -> String {
    let date = if local.hour() < cutoff_hour {
        local.date() - Duration::days(1)
    } else {
        local.date()
    };
    date.format("%Y-%m-%d").to_string()
}
