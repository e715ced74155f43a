//! Identity and position model shared by the selection layer.
//!
//! # Responsibility
//! - Define the identity-based handles used by the domain side.
//! - Define the position tokens used by the view-framework side.
//! - Provide an in-memory domain tree for standalone bindings.
//!
//! # Invariants
//! - Every domain item is identified by a stable `ItemId`.
//! - Positions are never stored as identities, and identities never as
//!   positions; translation always goes through an `IdentityResolver`.

pub mod item;
pub mod position;
pub mod tree;
