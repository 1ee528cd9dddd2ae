// vim: set ai et ts=4 sts=4:
use std::fmt;
use std::convert::TryFrom;
use super::error::SquareError;
use super::util::{Direction, Direction::*};

/// Current knowledge about a single square of the puzzle.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum Square {
    Unknown,
    Filled,
    Empty,
}
impl Square {
    pub fn is_known(&self) -> bool {
        *self != Square::Unknown
    }
    pub fn as_char(&self) -> char {
        match *self {
            Square::Unknown => '?',
            Square::Filled  => 'x',
            Square::Empty   => '.',
        }
    }
    /// Whether a candidate filling with `filled` at this position agrees with what we know.
    pub fn admits(&self, filled: bool) -> bool {
        match *self {
            Square::Unknown => true,
            Square::Filled  => filled,
            Square::Empty   => !filled,
        }
    }
}
impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}
impl TryFrom<char> for Square {
    type Error = SquareError;
    fn try_from(value: char) -> Result<Self, Self::Error> {
        match value {
            '?' => Ok(Square::Unknown),
            'x' => Ok(Square::Filled),
            '.' => Ok(Square::Empty),
            _   => Err(SquareError(value)),
        }
    }
}
impl From<bool> for Square {
    fn from(filled: bool) -> Self {
        if filled { Square::Filled } else { Square::Empty }
    }
}

// ------------------------------------------------

/// Parses a line written in square notation, e.g. `"?.x"`.
pub fn parse_slice(s: &str) -> Result<Vec<Square>, SquareError> {
    s.chars().map(Square::try_from).collect()
}

pub fn format_slice(slice: &[Square]) -> String {
    slice.iter().map(Square::as_char).collect()
}

/// Formats a candidate filling in square notation (`x` filled, `.` empty).
pub fn format_filling(filling: &[bool]) -> String {
    filling.iter().map(|&b| Square::from(b).as_char()).collect()
}

// ------------------------------------------------

/// A `width` x `height` matrix addressed by (x, y).
#[derive(PartialEq, Eq, Clone)]
pub struct Grid<T> {
    squares: Vec<Vec<T>>,
    width: usize,
}
impl<T: Clone> Grid<T> {
    pub fn new(width: usize, height: usize, fill: T) -> Self {
        Grid {
            squares: vec![vec![fill; width]; height],
            width,
        }
    }

    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.squares[y][x]
    }
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        self.squares[y][x] = value;
    }

    /// Copies out one row or column.
    pub fn line(&self, direction: Direction, index: usize) -> Vec<T> {
        match direction {
            Horizontal => self.squares[index].clone(),
            Vertical   => self.squares.iter().map(|row| row[index].clone()).collect(),
        }
    }
    pub fn set_line(&mut self, direction: Direction, index: usize, values: &[T]) {
        assert_eq!(values.len(), self.line_length(direction));
        match direction {
            Horizontal => self.squares[index].clone_from_slice(values),
            Vertical   => {
                for (row, value) in self.squares.iter_mut().zip(values) {
                    row[index] = value.clone();
                }
            }
        }
    }
    pub fn map<U, F>(&self, f: F) -> Grid<U>
        where F: Fn(&T) -> U
    {
        Grid {
            squares: self.squares.iter()
                                 .map(|row| row.iter().map(&f).collect())
                                 .collect(),
            width: self.width,
        }
    }
}
impl<T> Grid<T> {
    pub fn width(&self) -> usize { self.width }
    pub fn height(&self) -> usize { self.squares.len() }

    /// Length of a row (`Horizontal`) or a column (`Vertical`).
    pub fn line_length(&self, direction: Direction) -> usize {
        match direction {
            Horizontal => self.width(),
            Vertical   => self.height(),
        }
    }
    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        self.squares.iter().map(|row| row.as_slice())
    }
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.squares.iter().flat_map(|row| row.iter())
    }
}

impl<T> fmt::Debug for Grid<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Grid(w={}, h={})", self.width(), self.height())
    }
}
impl fmt::Display for Grid<Square> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in self.rows() {
            writeln!(f, "{}", format_slice(row))?;
        }
        Ok(())
    }
}

// ------------------------------------------------

/// Grid of squares that line deduction could not settle.
pub type AmbiguityMask = Grid<bool>;

impl Grid<bool> {
    pub fn count_set(&self) -> usize {
        self.iter().filter(|&&b| b).count()
    }
    /// No ambiguous squares left: line logic alone determines the whole picture.
    pub fn is_unique(&self) -> bool {
        self.count_set() == 0
    }
}
