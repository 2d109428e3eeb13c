//! Client-side page cache. Mutations come back as an affected-row list
//! and are patched into already-fetched pages without refetching, the
//! day in each affected entry narrows the patch to the groups it can
//! actually touch.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::db::Affected;
use crate::gallery::Page;

/// What a mutation did, enough to patch cached pages and to tell the
/// caller which rows moved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MutationOutcome {
    Tag { tag_id: i64, affected: Vec<Affected> },
    Category { category_id: i64, affected: Vec<Affected> },
    Delete { affected: Vec<Affected> },
}

impl MutationOutcome {
    pub fn affected(&self) -> &[Affected] {
        match self {
            MutationOutcome::Tag { affected, .. }
            | MutationOutcome::Category { affected, .. }
            | MutationOutcome::Delete { affected } => affected,
        }
    }
}

/// Pages in fetch order. Patching is copy-on-write: `patched` returns a
/// new cache and leaves the original untouched, so a failed render can
/// fall back to the pre-mutation view.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageCache {
    pages: Vec<Page>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_page(&mut self, page: Page) {
        self.pages.push(page);
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn patched(&self, outcome: &MutationOutcome) -> PageCache {
        let mut next = self.clone();
        next.apply(outcome);
        next
    }

    fn apply(&mut self, outcome: &MutationOutcome) {
        let by_day = group_by_day(outcome.affected());
        if by_day.is_empty() {
            return;
        }

        for page in &mut self.pages {
            for group in &mut page.items {
                let Some(ids) = by_day.get(group.day.as_str()) else {
                    continue;
                };
                match outcome {
                    MutationOutcome::Tag { tag_id, .. } => {
                        for record in group.images.iter_mut().filter(|r| ids.contains(&r.id)) {
                            if !record.tags.contains(tag_id) {
                                record.tags.push(*tag_id);
                            }
                        }
                    }
                    MutationOutcome::Category { category_id, .. } => {
                        for record in group.images.iter_mut().filter(|r| ids.contains(&r.id)) {
                            record.category_id = Some(*category_id);
                        }
                    }
                    MutationOutcome::Delete { .. } => {
                        group.images.retain(|r| !ids.contains(&r.id));
                    }
                }
            }
            if matches!(outcome, MutationOutcome::Delete { .. }) {
                page.items.retain(|group| !group.images.is_empty());
            }
        }
    }
}

fn group_by_day(affected: &[Affected]) -> HashMap<&str, HashSet<i64>> {
    let mut by_day: HashMap<&str, HashSet<i64>> = HashMap::new();
    for entry in affected {
        by_day.entry(entry.day.as_str()).or_default().insert(entry.media_id);
    }
    by_day
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{AspectClass, MediaRecord};
    use crate::gallery::DayGroup;

    fn record(id: i64, day: &str) -> MediaRecord {
        MediaRecord {
            id,
            directory: "2024-05".into(),
            filename: format!("shot-{id}.png"),
            created_at_ms: 0,
            iso_date: format!("{day}T12:00:00"),
            day: day.into(),
            format: "png".into(),
            size_mb: 0.5,
            aspect: AspectClass::Small,
            deleted: false,
            category_id: None,
            tags: Vec::new(),
            notes: Vec::new(),
        }
    }

    fn cache_with_two_days() -> PageCache {
        let mut cache = PageCache::new();
        cache.push_page(Page {
            items: vec![
                DayGroup {
                    day: "2024-05-02".into(),
                    images: vec![record(1, "2024-05-02"), record(2, "2024-05-02")],
                },
                DayGroup {
                    day: "2024-05-01".into(),
                    images: vec![record(3, "2024-05-01")],
                },
            ],
            next_cursor: None,
        });
        cache
    }

    fn affected(media_id: i64, day: &str) -> Affected {
        Affected { media_id, day: day.into() }
    }

    #[test]
    fn tag_patch_touches_only_named_rows() {
        let cache = cache_with_two_days();
        let patched = cache.patched(&MutationOutcome::Tag {
            tag_id: 7,
            affected: vec![affected(1, "2024-05-02")],
        });

        let day = &patched.pages()[0].items[0];
        assert_eq!(day.images[0].tags, vec![7]);
        assert!(day.images[1].tags.is_empty());
        // the other day group is untouched
        assert_eq!(patched.pages()[0].items[1], cache.pages()[0].items[1]);
    }

    #[test]
    fn tag_patch_is_idempotent() {
        let cache = cache_with_two_days();
        let outcome = MutationOutcome::Tag {
            tag_id: 7,
            affected: vec![affected(1, "2024-05-02")],
        };
        let once = cache.patched(&outcome);
        let twice = once.patched(&outcome);
        assert_eq!(once, twice);
        assert_eq!(twice.pages()[0].items[0].images[0].tags, vec![7]);
    }

    #[test]
    fn category_patch_overwrites() {
        let cache = cache_with_two_days();
        let first = cache.patched(&MutationOutcome::Category {
            category_id: 2,
            affected: vec![affected(3, "2024-05-01")],
        });
        let second = first.patched(&MutationOutcome::Category {
            category_id: 5,
            affected: vec![affected(3, "2024-05-01")],
        });
        assert_eq!(second.pages()[0].items[1].images[0].category_id, Some(5));
    }

    #[test]
    fn delete_drops_rows_and_empty_groups() {
        let cache = cache_with_two_days();
        let patched = cache.patched(&MutationOutcome::Delete {
            affected: vec![affected(3, "2024-05-01")],
        });
        let page = &patched.pages()[0];
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].day, "2024-05-02");
        assert_eq!(page.items[0].images.len(), 2);
    }

    #[test]
    fn patch_never_mutates_the_original() {
        let cache = cache_with_two_days();
        let snapshot = cache.clone();
        let _ = cache.patched(&MutationOutcome::Delete {
            affected: vec![affected(1, "2024-05-02"), affected(3, "2024-05-01")],
        });
        assert_eq!(cache, snapshot);
    }

    #[test]
    fn unknown_rows_are_a_no_op() {
        let cache = cache_with_two_days();
        let patched = cache.patched(&MutationOutcome::Tag {
            tag_id: 9,
            affected: vec![affected(99, "2024-05-02"), affected(1, "1999-01-01")],
        });
        // id 99 is not cached and id 1 is filed under a different day
        assert_eq!(patched, cache);
    }
}
