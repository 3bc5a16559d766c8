//! Ordering and grouping contract for combined item lists.
//!
//! # Responsibility
//! - Sort the union of tasks and notes with the `Item::after` comparator.
//! - Bucket a sorted list by tag for board-style presentation.
//!
//! # Invariants
//! - Sorting is stable; equal items keep their relative order across calls.
//! - The untagged bucket, when present, always comes first.

use crate::model::item::{AnyItem, Tag};
use std::cmp::Ordering;
use std::collections::HashMap;

/// One presentation bucket. `tag: None` holds the untagged items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagGroup {
    pub tag: Option<Tag>,
    pub items: Vec<AnyItem>,
}

/// Sorts tasks and notes into display order: tagged before untagged,
/// most recently created first within each side.
pub fn sort_items(items: &mut [AnyItem]) {
    items.sort_by(|a, b| {
        if a.item().after(b.item()) {
            Ordering::Greater
        } else if b.item().after(a.item()) {
            Ordering::Less
        } else {
            Ordering::Equal
        }
    });
}

/// Buckets items by tag name, preserving first-encounter order of tags.
/// The untagged bucket is surfaced first regardless of where untagged
/// items appear in the input.
pub fn group_by_tag(items: Vec<AnyItem>) -> Vec<TagGroup> {
    let mut untagged: Vec<AnyItem> = Vec::new();
    let mut groups: Vec<TagGroup> = Vec::new();
    let mut index_by_name: HashMap<String, usize> = HashMap::new();

    for entry in items {
        match entry.item().tag.clone() {
            None => untagged.push(entry),
            Some(tag) => {
                if let Some(&idx) = index_by_name.get(&tag.name) {
                    groups[idx].items.push(entry);
                } else {
                    index_by_name.insert(tag.name.clone(), groups.len());
                    groups.push(TagGroup {
                        tag: Some(tag),
                        items: vec![entry],
                    });
                }
            }
        }
    }

    let mut result = Vec::with_capacity(groups.len() + 1);
    if !untagged.is_empty() {
        result.push(TagGroup {
            tag: None,
            items: untagged,
        });
    }
    result.extend(groups);
    result
}
