//! In-memory position selection store.

use crate::model::position::{Position, PositionSet};
use crate::selection::store::{PositionSelectionStore, StoreEvent};

/// `PositionSelectionStore` backed by plain sets, queuing one event per
/// observable change.
#[derive(Debug, Default)]
pub struct MemorySelectionStore {
    selected: PositionSet,
    current: Option<Position>,
    pending: Vec<StoreEvent>,
}

impl MemorySelectionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PositionSelectionStore for MemorySelectionStore {
    fn replace_selection(&mut self, positions: PositionSet) {
        if positions == self.selected {
            return;
        }
        let selected = positions.difference(&self.selected).copied().collect();
        let deselected = self.selected.difference(&positions).copied().collect();
        self.selected = positions;
        self.pending.push(StoreEvent::SelectionChanged {
            selected,
            deselected,
        });
    }

    fn add_to_selection(&mut self, positions: PositionSet) {
        let selected: PositionSet = positions.difference(&self.selected).copied().collect();
        if selected.is_empty() {
            return;
        }
        self.selected.extend(selected.iter().copied());
        self.pending.push(StoreEvent::SelectionChanged {
            selected,
            deselected: PositionSet::new(),
        });
    }

    fn selected_positions(&self) -> PositionSet {
        self.selected.clone()
    }

    fn set_current(&mut self, position: Option<Position>) {
        if position == self.current {
            return;
        }
        let previous = std::mem::replace(&mut self.current, position);
        self.pending.push(StoreEvent::CurrentChanged {
            current: position,
            previous,
        });
    }

    fn current(&self) -> Option<Position> {
        self.current
    }

    fn take_events(&mut self) -> Vec<StoreEvent> {
        std::mem::take(&mut self.pending)
    }
}
