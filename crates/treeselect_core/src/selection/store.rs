//! Position-based selection store contract.
//!
//! # Responsibility
//! - Describe the view framework's native selection primitive: a set of
//!   selected positions plus one current position.
//! - Describe the change events the primitive emits.
//!
//! # Invariants
//! - A store records one `StoreEvent` per observable change and never for a
//!   write that leaves its state unchanged.
//! - Recorded events stay queued until `take_events` drains them.

use crate::model::position::{Position, PositionSet};

/// Position-level change recorded by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// Positions entered and/or left the selection.
    SelectionChanged {
        selected: PositionSet,
        deselected: PositionSet,
    },
    /// The current (focused) position moved.
    CurrentChanged {
        current: Option<Position>,
        previous: Option<Position>,
    },
}

/// View-framework store of selected positions and the current position.
pub trait PositionSelectionStore {
    /// Replaces the whole selection.
    fn replace_selection(&mut self, positions: PositionSet);
    /// Adds positions to the selection.
    fn add_to_selection(&mut self, positions: PositionSet);
    /// Snapshot of all selected positions.
    fn selected_positions(&self) -> PositionSet;
    /// Moves the current position. `None` means no focus.
    fn set_current(&mut self, position: Option<Position>);
    fn current(&self) -> Option<Position>;
    /// Drains events emitted since the previous drain, oldest first.
    fn take_events(&mut self) -> Vec<StoreEvent>;

    /// Clears both the selection and the current position.
    fn clear(&mut self) {
        self.replace_selection(PositionSet::new());
        self.set_current(None);
    }

    /// Flips one position in or out of the selection.
    fn toggle(&mut self, position: Position) {
        let mut positions = self.selected_positions();
        if !positions.remove(&position) {
            positions.insert(position);
        }
        self.replace_selection(positions);
    }
}
