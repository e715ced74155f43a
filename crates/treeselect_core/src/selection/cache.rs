//! Dirty-flag cache from position-based selection to identities.
//!
//! # Invariants
//! - When clean, `items` is exactly the resolvable image of the store's
//!   selected positions; positions that do not resolve to an existing item
//!   are dropped.
//! - `get` walks the store at most once per invalidation.

use crate::model::item::SelectionSet;
use crate::selection::resolver::IdentityResolver;
use crate::selection::store::PositionSelectionStore;
use log::trace;

/// Memoized identity image of the store's selection.
#[derive(Debug)]
pub struct SelectionCache {
    items: SelectionSet,
    dirty: bool,
    recomputations: u64,
}

impl SelectionCache {
    /// Creates a dirty cache; the first `get` computes the set.
    pub fn new() -> Self {
        Self {
            items: SelectionSet::new(),
            dirty: true,
            recomputations: 0,
        }
    }

    /// Marks the cached set stale.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Set produced by the latest recompute, without recomputing.
    pub fn last_computed(&self) -> &SelectionSet {
        &self.items
    }

    /// Number of store walks performed so far.
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }

    /// Returns the clean set, recomputing it first if stale.
    pub fn get(
        &mut self,
        store: &dyn PositionSelectionStore,
        resolver: &dyn IdentityResolver,
    ) -> &SelectionSet {
        if self.dirty {
            self.recompute(store, resolver);
        }
        &self.items
    }

    fn recompute(&mut self, store: &dyn PositionSelectionStore, resolver: &dyn IdentityResolver) {
        let positions = store.selected_positions();
        let mut skipped = 0usize;
        let mut items = SelectionSet::new();
        for position in positions.iter().copied() {
            match resolver
                .item_at(position)
                .filter(|item| resolver.exists(*item))
            {
                Some(item) => {
                    items.insert(item);
                }
                None => skipped += 1,
            }
        }

        self.items = items;
        self.dirty = false;
        self.recomputations += 1;
        trace!(
            "event=selection_cache_recompute module=selection positions={} items={} skipped={}",
            positions.len(),
            self.items.len(),
            skipped
        );
    }
}

impl Default for SelectionCache {
    fn default() -> Self {
        Self::new()
    }
}
