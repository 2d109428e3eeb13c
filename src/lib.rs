//! Screenshot library indexer and day-bucketed gallery browser.
//!
//! The library walks a directory tree of monthly screenshot buckets,
//! extracts metadata and classifies each image by resolution, writes
//! aspect-matched thumbnails and records everything in SQLite. On top
//! of the store sits a gallery: cursor pagination over whole-day
//! groups, a masonry grid packer and a patchable page cache, with
//! tagging, categories and notes as validated mutations.

pub mod config;
pub mod db;
pub mod gallery;
pub mod ingest;
pub mod logging;
pub mod notify;
