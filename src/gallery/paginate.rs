//! Day-bucketed cursor pagination.
//!
//! A page is the smallest run of whole days, walking backwards from the
//! cursor, whose cumulative record count reaches the target size. Days are
//! never split across pages, so a page may overshoot the target; that is
//! the contract, not a bug.

use anyhow::Result;
use tracing::debug;

use super::{DayGroup, Page};
use crate::db::{Database, MediaRecord};

/// Fetch the page ending at `cursor` (inclusive, a `YYYY-MM-DD` string).
///
/// Two queries: the day/count aggregate picks the day range and the next
/// cursor, then one detail query loads the range with tags and notes
/// joined. Re-running with the returned cursor walks strictly older days;
/// no day is repeated or skipped.
pub fn fetch_page(db: &Database, cursor: &str, page_size: usize) -> Result<Page> {
    let aggregated = db.day_counts(cursor)?;
    if aggregated.is_empty() {
        return Ok(Page {
            items: Vec::new(),
            next_cursor: None,
        });
    }

    let mut total: i64 = 0;
    let mut start_day = String::new();
    let mut next_cursor = None;
    for (index, entry) in aggregated.iter().enumerate() {
        total += entry.count;
        start_day = entry.day.clone();
        next_cursor = aggregated.get(index + 1).map(|e| e.day.clone());
        if total >= page_size as i64 {
            break;
        }
    }

    debug!("page range {start_day}..={cursor} ({total} records)");
    let matches = db.media_by_day_range(&start_day, cursor)?;

    Ok(Page {
        items: group_by_day(matches),
        next_cursor,
    })
}

/// Fold records (already newest-first) into per-day groups, preserving
/// first-seen day order. An explicit ordered accumulator: display order
/// must not depend on map iteration order.
fn group_by_day(records: Vec<MediaRecord>) -> Vec<DayGroup> {
    let mut groups: Vec<DayGroup> = Vec::new();
    for record in records {
        match groups.last_mut() {
            Some(group) if group.day == record.day => group.images.push(record),
            _ => groups.push(DayGroup {
                day: record.day.clone(),
                images: vec![record],
            }),
        }
    }
    groups
}
