//! Flat row model over an `ItemTree`.
//!
//! # Responsibility
//! - Assign positions to tree items by flattening the tree in preorder.
//! - Resolve positions back to items for the current generation only.
//!
//! # Invariants
//! - Positions from an older generation never resolve.
//! - Items removed from the tree never resolve, even before a reset.
//! - Any column below `columns` resolves to the row's item.

use crate::model::item::ItemId;
use crate::model::position::Position;
use crate::model::tree::ItemTree;
use crate::selection::resolver::IdentityResolver;
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Default)]
struct RowLayout {
    generation: u64,
    rows: Vec<ItemId>,
    row_of: HashMap<ItemId, usize>,
}

impl RowLayout {
    fn build(tree: &ItemTree, generation: u64) -> Self {
        let rows = tree.preorder();
        let row_of = rows
            .iter()
            .enumerate()
            .map(|(row, id)| (*id, row))
            .collect();
        Self {
            generation,
            rows,
            row_of,
        }
    }
}

/// View model that resolves positions for a shared `ItemTree`.
#[derive(Debug)]
pub struct TreeViewModel {
    tree: Rc<RefCell<ItemTree>>,
    columns: usize,
    layout: RefCell<RowLayout>,
}

impl TreeViewModel {
    /// Creates a single-column model over `tree`.
    pub fn new(tree: Rc<RefCell<ItemTree>>) -> Self {
        Self::with_columns(tree, 1)
    }

    /// Creates a model whose rows span `columns` columns (at least one).
    pub fn with_columns(tree: Rc<RefCell<ItemTree>>, columns: usize) -> Self {
        let layout = RowLayout::build(&tree.borrow(), 0);
        Self {
            tree,
            columns: columns.max(1),
            layout: RefCell::new(layout),
        }
    }

    pub fn tree(&self) -> &Rc<RefCell<ItemTree>> {
        &self.tree
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn generation(&self) -> u64 {
        self.layout.borrow().generation
    }

    pub fn row_count(&self) -> usize {
        self.layout.borrow().rows.len()
    }

    /// Re-flattens the tree and invalidates every previously issued position.
    pub fn reset(&self) {
        let generation = self.generation() + 1;
        let layout = RowLayout::build(&self.tree.borrow(), generation);
        debug!(
            "event=view_model_reset module=view generation={} rows={}",
            generation,
            layout.rows.len()
        );
        *self.layout.borrow_mut() = layout;
    }
}

impl IdentityResolver for TreeViewModel {
    fn position_of(&self, item: ItemId) -> Option<Position> {
        if !self.exists(item) {
            return None;
        }
        let layout = self.layout.borrow();
        let row = *layout.row_of.get(&item)?;
        Some(Position::new(row, 0, layout.generation))
    }

    fn item_at(&self, position: Position) -> Option<ItemId> {
        if position.column() >= self.columns {
            return None;
        }
        let item = {
            let layout = self.layout.borrow();
            if position.generation() != layout.generation {
                return None;
            }
            *layout.rows.get(position.row())?
        };
        self.exists(item).then_some(item)
    }

    fn exists(&self, item: ItemId) -> bool {
        self.tree.borrow().contains(item)
    }
}
