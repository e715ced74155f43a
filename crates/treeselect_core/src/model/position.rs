//! View-framework position tokens.
//!
//! # Responsibility
//! - Model the opaque row/column address a view framework hands out.
//!
//! # Invariants
//! - A position is only meaningful for the model generation it was issued
//!   under; resolvers must reject tokens from an older generation.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

/// Opaque row/column address issued by a view model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Position {
    row: usize,
    column: usize,
    generation: u64,
}

impl Position {
    /// Creates a position token for `row`/`column` in model `generation`.
    pub fn new(row: usize, column: usize, generation: u64) -> Self {
        Self {
            row,
            column,
            generation,
        }
    }

    pub fn row(&self) -> usize {
        self.row
    }

    pub fn column(&self) -> usize {
        self.column
    }

    /// Model generation this token was issued under.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}@{}", self.row, self.column, self.generation)
    }
}

/// Set of selected positions.
pub type PositionSet = BTreeSet<Position>;
