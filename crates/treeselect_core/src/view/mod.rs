//! Standalone view-framework collaborators.
//!
//! Concrete `IdentityResolver` and `PositionSelectionStore` implementations
//! for hosts without a native view framework, demos and tests.

pub mod memory_store;
pub mod tree_view_model;
