//! First-seen-wins deduplication of the fetched corpus.
//!
//! Items are walked in input order. An item is dropped when its non-empty
//! `url`, or its `id`, has already been seen; the surviving copy is always the
//! earliest one. Fields of later duplicates are discarded, never merged into
//! the survivor, even when the duplicate carries a higher score.

use crate::models::Item;
use std::collections::HashSet;
use tracing::debug;

/// Identities already admitted to the corpus.
///
/// The caller owns this and passes it in, so several batches can be folded
/// into one corpus and tests can inspect the state afterwards.
#[derive(Debug, Default)]
pub struct SeenKeys {
    urls: HashSet<String>,
    ids: HashSet<String>,
}

impl SeenKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `item`'s identity. Returns `false` if it was already present.
    pub fn admit(&mut self, item: &Item) -> bool {
        let url_seen = !item.url.is_empty() && self.urls.contains(&item.url);
        if url_seen || self.ids.contains(&item.id) {
            return false;
        }
        if !item.url.is_empty() {
            self.urls.insert(item.url.clone());
        }
        self.ids.insert(item.id.clone());
        true
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Keep the first item for every identity, preserving input order.
pub fn dedup(items: Vec<Item>, seen: &mut SeenKeys) -> Vec<Item> {
    let before = items.len();
    let kept: Vec<Item> = items
        .into_iter()
        .filter(|item| {
            let admitted = seen.admit(item);
            if !admitted {
                debug!(key = item.identity_key(), source = %item.source, "Dropping duplicate");
            }
            admitted
        })
        .collect();
    debug!(before, after = kept.len(), "Deduplicated items");
    kept
}
