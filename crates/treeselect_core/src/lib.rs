//! Selection state synchronization for tree-shaped data.
//! Keeps a view framework's position-based selection and the domain model's
//! identity-based selection in agreement, and fans changes out to observers.

pub mod config;
pub mod logging;
pub mod model;
pub mod selection;
pub mod view;

pub use config::{default_log_level, LoggingConfig, LoggingError};
pub use logging::{init_logging, logging_status};
pub use model::item::{ItemId, SelectionSet};
pub use model::position::{Position, PositionSet};
pub use model::tree::{ItemTree, TreeError, TreeItem};
pub use selection::cache::SelectionCache;
pub use selection::error::{SelectionError, SelectionResult};
pub use selection::event::SelectionEvent;
pub use selection::proxy::{MuteGuard, NotificationProxy};
pub use selection::resolver::IdentityResolver;
pub use selection::store::{PositionSelectionStore, StoreEvent};
pub use selection::synchronizer::SelectionSynchronizer;
pub use view::memory_store::MemorySelectionStore;
pub use view::tree_view_model::TreeViewModel;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
