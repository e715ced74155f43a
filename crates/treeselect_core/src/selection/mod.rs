//! Selection synchronization between a view framework and the domain model.
//!
//! # Responsibility
//! - Keep the position-based selection of a view framework and the
//!   identity-based selection of the domain model in agreement.
//! - Broadcast changes to any number of observers without echoing an edit
//!   back to the observer that made it.
//!
//! # Invariants
//! - The position store is the source of truth; identity sets are derived.
//! - Everything runs on one thread, synchronously, inside the triggering call.
//!
//! Data flow: observer edit → `SelectionSynchronizer` writes the
//! `PositionSelectionStore` → store records `StoreEvent`s → synchronizer
//! invalidates its `SelectionCache` → synchronizer emits `SelectionEvent`s →
//! every unmuted `NotificationProxy` forwards them.

pub mod cache;
pub mod error;
pub mod event;
pub mod proxy;
pub mod resolver;
pub mod store;
pub mod synchronizer;
