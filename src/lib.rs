// vim: set ai et ts=4 sts=4 sw=4:
//! Nonogram line deduction, grid refinement and background uniqueness checking, plus the
//! observable value cells the checker publishes its results through.

pub mod cell;
pub mod checker;
pub mod error;
pub mod grid;
pub mod puzzle;
pub mod row;
pub mod util;

pub use crate::cell::{Cell, Observable, Propagation, SubscriptionId};
pub use crate::checker::{Checker, CheckerState, Output};
pub use crate::error::{CellError, CheckerError, ConstraintError, PuzzleError, SquareError};
pub use crate::grid::{AmbiguityMask, Grid, Square};
pub use crate::puzzle::{PassSummary, SolverGrid};
pub use crate::row::{generate, satisfied_suffix_length, Constraints, LineSummary};
pub use crate::util::Direction;
