//! Ingestion pipeline: turn raw screenshots into thumbnails plus one
//! database record each, in batch (library backfill) or one at a time
//! (fresh upload).

pub mod classify;
pub mod discovery;
pub mod metadata;
pub mod thumbnails;

use anyhow::Result;
use chrono::Local;
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::mpsc;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::{Database, NewMediaRecord};

pub use classify::{classify, ThumbnailSpec};
pub use discovery::{list_directories, DirectoryListing};
pub use metadata::{aggregation_day, extract_metadata, MediaMetadata};
pub use thumbnails::write_thumbnail;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("source file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to extract metadata from {path}: {reason}")]
    Extraction { path: PathBuf, reason: String },
    #[error("failed to produce thumbnail for {path}: {reason}")]
    Thumbnail { path: PathBuf, reason: String },
}

/// Progress messages a batch run sends over an optional channel.
#[derive(Debug, Clone)]
pub enum IngestProgress {
    Started { total_files: usize },
    Processed { current: usize, total: usize, path: String },
    Skipped { current: usize, total: usize, path: String },
    Failed { current: usize, total: usize, path: String, reason: String },
    Completed { report: IngestReport },
}

/// Final tally of a batch run. `skipped` covers excluded extensions and
/// files already present in the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Everything derived from the file itself; directory and filename are
/// supplied by whichever path (batch or single) found the file.
struct PreparedMedia {
    created_at_ms: i64,
    iso_date: String,
    day: String,
    format: String,
    size_mb: f64,
    aspect: crate::db::AspectClass,
}

impl PreparedMedia {
    fn into_record(self, directory: String, filename: String) -> NewMediaRecord {
        NewMediaRecord {
            directory,
            filename,
            created_at_ms: self.created_at_ms,
            iso_date: self.iso_date,
            day: self.day,
            format: self.format,
            size_mb: self.size_mb,
            aspect: self.aspect,
        }
    }
}

struct Job {
    subdir: String,
    filename: String,
    input: PathBuf,
    output: PathBuf,
    /// Index into the parallel preparation results.
    slot: usize,
}

enum Entry {
    Excluded(PathBuf),
    AlreadyIngested(PathBuf),
    Job(Job),
}

pub struct Ingestor {
    full_dir: PathBuf,
    thumbs_dir: PathBuf,
    excluded_extensions: Vec<String>,
    cutoff_hour: u32,
}

impl Ingestor {
    pub fn new(config: &Config) -> Self {
        Self {
            full_dir: config.library.full_dir.clone(),
            thumbs_dir: config.library.thumbs_dir.clone(),
            excluded_extensions: config.library.excluded_extensions.clone(),
            cutoff_hour: config.library.day_cutoff_hour,
        }
    }

    /// Ingest one freshly captured file. The file is expected in the
    /// bucket directory of "now"'s aggregation day, so an 04:00 capture
    /// resolves against the bucket it will group under.
    pub fn ingest_file(&self, db: &Database, filename: &str) -> Result<i64> {
        let day = aggregation_day(Local::now().naive_local(), self.cutoff_hour);
        let bucket = day[..7].to_string();

        let input = self.full_dir.join(&bucket).join(filename);
        if !input.is_file() {
            return Err(IngestError::NotFound(input).into());
        }
        let output = self.thumbs_dir.join(&bucket).join(filename);

        let prepared = self.prepare(&input, &output)?;
        let id = db.insert_media(&prepared.into_record(bucket, filename.to_string()))?;
        info!(id, filename, "ingested single file");
        Ok(id)
    }

    /// Walk every bucket under the library root and ingest what is not
    /// there yet. One broken file never aborts the run: it is logged,
    /// counted and stepped over.
    pub fn ingest_library(
        &self,
        db: &Database,
        progress: Option<mpsc::Sender<IngestProgress>>,
    ) -> Result<IngestReport> {
        let listings = list_directories(&self.full_dir)?;

        let mut entries = Vec::new();
        let mut slots = 0usize;
        for listing in &listings {
            for file in &listing.files {
                let input = listing.path.join(file);
                if self.is_excluded(file) {
                    entries.push(Entry::Excluded(input));
                } else if db.media_exists(&listing.subdir, file)? {
                    entries.push(Entry::AlreadyIngested(input));
                } else {
                    entries.push(Entry::Job(Job {
                        subdir: listing.subdir.clone(),
                        filename: file.clone(),
                        input,
                        output: self.thumbs_dir.join(&listing.subdir).join(file),
                        slot: slots,
                    }));
                    slots += 1;
                }
            }
        }

        let total = entries.len();
        if let Some(ref tx) = progress {
            let _ = tx.send(IngestProgress::Started { total_files: total });
        }

        // Decode and thumbnailing are the expensive part and each file is
        // independent, so prepare on the pool; inserts stay sequential.
        let jobs: Vec<&Job> = entries
            .iter()
            .filter_map(|e| match e {
                Entry::Job(job) => Some(job),
                _ => None,
            })
            .collect();
        let mut prepared: Vec<Option<Result<PreparedMedia, IngestError>>> = jobs
            .par_iter()
            .map(|job| Some(self.prepare(&job.input, &job.output)))
            .collect();

        let mut report = IngestReport {
            total,
            ..Default::default()
        };

        for (index, entry) in entries.iter().enumerate() {
            let current = index + 1;
            match entry {
                Entry::Excluded(path) => {
                    report.skipped += 1;
                    info!("{current}/{total}: skipping excluded file {}", path.display());
                    if let Some(ref tx) = progress {
                        let _ = tx.send(IngestProgress::Skipped {
                            current,
                            total,
                            path: path.display().to_string(),
                        });
                    }
                }
                Entry::AlreadyIngested(path) => {
                    report.skipped += 1;
                    info!("{current}/{total}: already ingested {}", path.display());
                    if let Some(ref tx) = progress {
                        let _ = tx.send(IngestProgress::Skipped {
                            current,
                            total,
                            path: path.display().to_string(),
                        });
                    }
                }
                Entry::Job(job) => {
                    let result = prepared[job.slot]
                        .take()
                        .map_or_else(|| Err(IngestError::NotFound(job.input.clone())), |r| r)
                        .map_err(anyhow::Error::from)
                        .and_then(|p| {
                            db.insert_media(
                                &p.into_record(job.subdir.clone(), job.filename.clone()),
                            )
                        });
                    match result {
                        Ok(_) => {
                            report.succeeded += 1;
                            info!("{current}/{total}: ingested {}", job.input.display());
                            if let Some(ref tx) = progress {
                                let _ = tx.send(IngestProgress::Processed {
                                    current,
                                    total,
                                    path: job.input.display().to_string(),
                                });
                            }
                        }
                        Err(e) => {
                            report.failed += 1;
                            warn!("{current}/{total}: error ingesting {}: {e}", job.input.display());
                            if let Some(ref tx) = progress {
                                let _ = tx.send(IngestProgress::Failed {
                                    current,
                                    total,
                                    path: job.input.display().to_string(),
                                    reason: e.to_string(),
                                });
                            }
                        }
                    }
                }
            }
        }

        info!(
            total = report.total,
            succeeded = report.succeeded,
            failed = report.failed,
            skipped = report.skipped,
            "library ingest finished"
        );
        if let Some(ref tx) = progress {
            let _ = tx.send(IngestProgress::Completed { report });
        }
        Ok(report)
    }

    fn is_excluded(&self, filename: &str) -> bool {
        let ext = filename.rsplit('.').next().unwrap_or("");
        self.excluded_extensions
            .iter()
            .any(|e| e.eq_ignore_ascii_case(ext))
    }

    fn prepare(&self, input: &PathBuf, output: &PathBuf) -> Result<PreparedMedia, IngestError> {
        let meta = extract_metadata(input)?;
        let spec = classify(meta.width, meta.height);
        write_thumbnail(input, output, &spec)?;

        Ok(PreparedMedia {
            created_at_ms: meta.created_at.timestamp_millis(),
            iso_date: meta.iso_date,
            day: aggregation_day(meta.created_at.naive_local(), self.cutoff_hour),
            format: meta.format,
            size_mb: meta.size_mb,
            aspect: spec.aspect,
        })
    }
}
