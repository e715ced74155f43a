//! Domain item identity.
//!
//! # Responsibility
//! - Name the stable, identity-based handle used for domain tree nodes.
//! - Define the derived identity set that selection reads produce.
//!
//! # Invariants
//! - `ItemId` equality is identity equality; two items with equal names are
//!   still different items.
//! - `SelectionSet` never holds duplicates.

use std::collections::BTreeSet;
use uuid::Uuid;

/// Stable identifier for one node of the domain tree.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type ItemId = Uuid;

/// Set of selected domain items.
///
/// Ordered so iteration, logging and serialized payloads are deterministic;
/// the order carries no meaning.
pub type SelectionSet = BTreeSet<ItemId>;
