//! Observer-facing selection events.

use crate::model::item::{ItemId, SelectionSet};
use crate::model::position::{Position, PositionSet};
use crate::selection::store::StoreEvent;
use serde::Serialize;

/// Event forwarded to observers through their `NotificationProxy`.
///
/// Serialized with an `event` tag so hosts can ship events as JSON lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SelectionEvent {
    /// Raw position-level selection change from the view framework.
    PositionSelectionChanged {
        selected: PositionSet,
        deselected: PositionSet,
    },
    /// Raw position-level current change from the view framework.
    CurrentPositionChanged {
        current: Option<Position>,
        previous: Option<Position>,
    },
    /// The selection changed; no payload.
    SelectionChanged,
    /// The selection changed; carries the fresh selection.
    SelectedItemsChanged { items: SelectionSet },
    /// The current item changed. Either side may be absent.
    CurrentItemChanged {
        current: Option<ItemId>,
        previous: Option<ItemId>,
    },
}

impl SelectionEvent {
    /// Stable snake_case name, matching the serialized tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PositionSelectionChanged { .. } => "position_selection_changed",
            Self::CurrentPositionChanged { .. } => "current_position_changed",
            Self::SelectionChanged => "selection_changed",
            Self::SelectedItemsChanged { .. } => "selected_items_changed",
            Self::CurrentItemChanged { .. } => "current_item_changed",
        }
    }

    /// Whether this is one of the identity-based events.
    pub fn is_identity_event(&self) -> bool {
        matches!(
            self,
            Self::SelectionChanged | Self::SelectedItemsChanged { .. } | Self::CurrentItemChanged { .. }
        )
    }
}

impl From<&StoreEvent> for SelectionEvent {
    fn from(value: &StoreEvent) -> Self {
        match value {
            StoreEvent::SelectionChanged {
                selected,
                deselected,
            } => Self::PositionSelectionChanged {
                selected: selected.clone(),
                deselected: deselected.clone(),
            },
            StoreEvent::CurrentChanged { current, previous } => Self::CurrentPositionChanged {
                current: *current,
                previous: *previous,
            },
        }
    }
}
