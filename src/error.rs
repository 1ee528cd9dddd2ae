// vim: set ai et ts=4 sts=4 sw=4:
use std::io;
use thiserror::Error;

#[derive(Error, PartialEq, Eq, Clone, Copy, Debug)]
pub enum CellError {
    #[error("invalid operation: cell is readonly")]
    ReadOnly,
    #[error("invalid operation: derived cells cannot be written to")]
    Derived,
    #[error("invalid operation: cannot refresh a future")]
    CannotRefreshFuture,
    #[error("invalid operation: only deferred cells can broadcast changes")]
    NotDeferred,
    #[error("future cell is already bound")]
    AlreadyBound,
}

impl CellError {
    /// Programming errors surfaced at the call site; everything except a double bind.
    pub fn is_invalid_operation(&self) -> bool {
        !matches!(self, CellError::AlreadyBound)
    }
}

#[derive(Error, PartialEq, Eq, Clone, Debug)]
pub enum ConstraintError {
    #[error("run lengths must be positive (found 0 at position {0})")]
    ZeroLength(usize),
    #[error("cannot parse run length {0:?}")]
    Parse(String),
}

#[derive(Error, PartialEq, Eq, Clone, Copy, Debug)]
#[error("not a valid square: {0:?} (expected one of '?', 'x', '.')")]
pub struct SquareError(pub char);

#[derive(Error, Debug)]
pub enum PuzzleError {
    #[error("invalid YAML: {0}")]
    Yaml(#[from] yaml_rust::ScanError),
    #[error("puzzle document has no {0:?} list")]
    MissingSection(&'static str),
    #[error("{section} entry #{index}: unexpected value {value}")]
    BadEntry { section: &'static str, index: usize, value: String },
    #[error("{section} entry #{index}: {source}")]
    Constraint { section: &'static str, index: usize, source: ConstraintError },
    #[error("puzzle must have at least one row and one column")]
    EmptyPuzzle,
    #[error("cannot read puzzle file: {0}")]
    Io(#[from] io::Error),
}

#[derive(Error, Debug)]
pub enum CheckerError {
    #[error("cannot spawn checker thread: {0}")]
    Spawn(#[from] io::Error),
}
