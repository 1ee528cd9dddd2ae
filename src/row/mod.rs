// vim: set ai et ts=4 sw=4 sts=4:
mod solver;

use std::fmt;
use std::str::FromStr;
use std::convert::TryFrom;
use log::debug;

use super::util::Direction;
use super::grid::{Grid, Square};
use super::error::ConstraintError;

pub use self::solver::{generate, summarize, satisfied_suffix_length, LineSummary};

/// Run lengths of one row or column, in order. All lengths are positive.
#[derive(PartialEq, Eq, Hash, Clone, Debug, Default)]
pub struct Constraints {
    runs: Vec<usize>,
}

impl Constraints {
    pub fn new(runs: Vec<usize>) -> Result<Self, ConstraintError> {
        if let Some(pos) = runs.iter().position(|&len| len == 0) {
            return Err(ConstraintError::ZeroLength(pos));
        }
        Ok(Constraints { runs })
    }
    pub fn empty() -> Self {
        Constraints { runs: Vec::new() }
    }

    pub fn runs(&self) -> &[usize] { &self.runs }
    pub fn len(&self) -> usize { self.runs.len() }
    pub fn is_empty(&self) -> bool { self.runs.is_empty() }
    pub fn last(&self) -> Option<usize> { self.runs.last().copied() }

    /// Shortest line that can hold all runs: their lengths plus one gap between each pair.
    /// Saturates at `usize::MAX`, which no line fits.
    pub fn min_length(&self) -> usize {
        min_length(&self.runs)
    }
    pub fn fits(&self, length: usize) -> bool {
        let min = self.min_length();
        min != usize::MAX && min <= length
    }
}

pub(crate) fn min_length(runs: &[usize]) -> usize {
    match runs.len() {
        0 => 0,
        n => runs.iter().fold(n - 1, |acc, &len| acc.saturating_add(len)),
    }
}

impl TryFrom<Vec<usize>> for Constraints {
    type Error = ConstraintError;
    fn try_from(runs: Vec<usize>) -> Result<Self, Self::Error> {
        Constraints::new(runs)
    }
}

impl FromStr for Constraints {
    type Err = ConstraintError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let runs = s.split_whitespace()
                    .map(|int| int.parse::<usize>().map_err(|_| ConstraintError::Parse(int.to_string())))
                    .collect::<Result<Vec<_>, _>>()?;
        // a lone "0" is the conventional way of writing down a line without runs
        if runs == [0] {
            return Ok(Constraints::empty());
        }
        Constraints::new(runs)
    }
}

impl fmt::Display for Constraints {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.runs.is_empty() {
            return write!(f, "0");
        }
        let parts = self.runs.iter().map(|len| len.to_string()).collect::<Vec<_>>();
        write!(f, "{}", parts.join(" "))
    }
}

// -------------------------------------------------------------

#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum LineOutcome {
    /// Number of squares that went from unknown to known.
    Changed(usize),
    /// No filling of the line agrees with the squares already known.
    Contradiction,
}

/// One row or column of a puzzle, together with its run lengths.
#[derive(Clone, Debug)]
pub struct Row {
    pub direction:   Direction,
    pub index:       usize,
    pub constraints: Constraints,
}

impl Row {
    pub fn new(direction: Direction, index: usize, constraints: Constraints) -> Self {
        Row { direction, index, constraints }
    }

    pub fn slice(&self, grid: &Grid<Square>) -> Vec<Square> {
        grid.line(self.direction, self.index)
    }

    /// Writes back every square on which all compatible fillings agree.
    pub fn refine(&self, grid: &mut Grid<Square>) -> LineOutcome {
        let slice = self.slice(grid);
        let summary = summarize(&self.constraints, &slice);
        let deduced = match summary.deduce(&slice) {
            Some(deduced) => deduced,
            None => {
                debug!("{} {} ({}) admits no filling of {}",
                       self.direction, self.index, self.constraints,
                       super::grid::format_slice(&slice));
                return LineOutcome::Contradiction;
            }
        };

        let changed = slice.iter()
                           .zip(deduced.iter())
                           .filter(|(old, new)| old != new)
                           .count();
        if changed > 0 {
            grid.set_line(self.direction, self.index, &deduced);
        }
        LineOutcome::Changed(changed)
    }
}
