//! Identity/position translation contract.

use crate::model::item::ItemId;
use crate::model::position::Position;

/// Translates between domain identities and view-framework positions.
///
/// Both directions are total: a miss is `None`, never an error. Implementors
/// are shared with the view framework, so any internal state they mutate
/// must use interior mutability.
pub trait IdentityResolver {
    /// Position currently showing `item`, if the item is visible in the model.
    fn position_of(&self, item: ItemId) -> Option<Position>;
    /// Item shown at `position`, if the token is current and the item exists.
    fn item_at(&self, position: Position) -> Option<ItemId>;
    /// Whether `item` is still part of the domain tree.
    fn exists(&self, item: ItemId) -> bool;
}
