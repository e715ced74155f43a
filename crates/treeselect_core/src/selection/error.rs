//! Selection layer errors.
//!
//! Resolution misses are deliberately absent here: an identity or position
//! that fails to resolve is treated as "nothing" and never reported.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result type used by selection operations.
pub type SelectionResult<T> = Result<T, SelectionError>;

/// Errors from selection synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// A proxy was used after its synchronizer was dropped.
    SynchronizerDropped,
    /// The position store did not reflect a write issued to it.
    StoreInconsistent {
        operation: &'static str,
        detail: String,
    },
}

impl Display for SelectionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SynchronizerDropped => {
                write!(f, "selection synchronizer was dropped before its proxy")
            }
            Self::StoreInconsistent { operation, detail } => {
                write!(f, "position store inconsistent after {operation}: {detail}")
            }
        }
    }
}

impl Error for SelectionError {}
