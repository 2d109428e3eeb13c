//! Gallery-facing view of the store: day-bucketed pages, masonry layout
//! and the client-side page cache.

pub mod cache;
pub mod grid;
pub mod paginate;
pub mod service;

use serde::{Deserialize, Serialize};

use crate::db::MediaRecord;

pub use cache::{MutationOutcome, PageCache};
pub use grid::{pack, place, span_for, PlacedTile, Tile};
pub use paginate::fetch_page;
pub use service::{Gallery, GalleryError};

/// All records of one aggregation day, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayGroup {
    pub day: String,
    pub images: Vec<MediaRecord>,
}

/// One unit of pagination: whole days, newest day first, plus the cursor
/// for the next-older page. `next_cursor` absent means end of data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub items: Vec<DayGroup>,
    pub next_cursor: Option<String>,
}
