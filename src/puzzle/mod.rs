// vim: set ai et ts=4 sw=4 sts=4:
mod solver;

use std::convert::TryFrom;
use yaml_rust::{Yaml, YamlLoader};
use ansi_term::{ANSIString, Colour, Style};

use super::grid::{Grid, Square};
use super::util::{ralign, lalign, maybe_color, Direction::*};
use super::row::{Row, Constraints};
use super::error::PuzzleError;

pub use self::solver::PassSummary;

/// A puzzle under deduction: the squares known so far plus the run lengths of every
/// row and column.
#[derive(Debug, Clone)]
pub struct SolverGrid {
    rows: Vec<Row>,
    cols: Vec<Row>,
    grid: Grid<Square>,
}

impl SolverGrid {
    /// Starts from an all-unknown grid with one column per entry of `column_constraints`
    /// and one row per entry of `row_constraints`.
    pub fn new(column_constraints: &[Constraints], row_constraints: &[Constraints]) -> Self
    {
        let rows = row_constraints.iter()
                                  .enumerate()
                                  .map(|(y, c)| Row::new(Horizontal, y, c.clone()))
                                  .collect::<Vec<_>>();
        let cols = column_constraints.iter()
                                     .enumerate()
                                     .map(|(x, c)| Row::new(Vertical, x, c.clone()))
                                     .collect::<Vec<_>>();
        SolverGrid {
            grid: Grid::new(cols.len(), rows.len(), Square::Unknown),
            rows,
            cols,
        }
    }
    pub fn width(&self) -> usize { self.grid.width() }
    pub fn height(&self) -> usize { self.grid.height() }
    pub fn grid(&self) -> &Grid<Square> { &self.grid }

    pub fn column_constraints(&self) -> Vec<Constraints> {
        self.cols.iter().map(|col| col.constraints.clone()).collect()
    }
    pub fn row_constraints(&self) -> Vec<Constraints> {
        self.rows.iter().map(|row| row.constraints.clone()).collect()
    }

    pub fn from_yaml_str(s: &str) -> Result<SolverGrid, PuzzleError> {
        let docs: Vec<Yaml> = YamlLoader::load_from_str(s)?;
        match docs.first() {
            Some(doc) => Self::from_yaml(doc),
            None      => Err(PuzzleError::MissingSection("rows")),
        }
    }

    /// Reads a document with `rows` and `cols` lists. Each entry is a string of run
    /// lengths (`"1 4"`), a single integer, or null for a line without runs.
    /// Column runs are listed top to bottom.
    pub fn from_yaml(doc: &Yaml) -> Result<SolverGrid, PuzzleError>
    {
        let row_constraints = Self::parse_section(doc, "rows")?;
        let col_constraints = Self::parse_section(doc, "cols")?;
        if row_constraints.is_empty() || col_constraints.is_empty() {
            return Err(PuzzleError::EmptyPuzzle);
        }
        Ok(SolverGrid::new(&col_constraints, &row_constraints))
    }

    fn parse_section(doc: &Yaml, section: &'static str) -> Result<Vec<Constraints>, PuzzleError> {
        let list: &Vec<Yaml> = doc[section].as_vec()
                                           .ok_or(PuzzleError::MissingSection(section))?;
        list.iter()
            .enumerate()
            .map(|(index, yaml_val)| Self::parse_row_runs(section, index, yaml_val))
            .collect()
    }

    fn parse_row_runs(section: &'static str, index: usize, input: &Yaml) -> Result<Constraints, PuzzleError> {
        let bad_entry = || PuzzleError::BadEntry { section, index, value: format!("{:?}", input) };
        match input {
            Yaml::String(s)  => s.parse::<Constraints>()
                                 .map_err(|source| PuzzleError::Constraint { section, index, source }),
            Yaml::Integer(0) => Ok(Constraints::empty()),
            Yaml::Integer(n) => {
                let len = usize::try_from(*n).map_err(|_| bad_entry())?;
                Constraints::new(vec![len])
                    .map_err(|source| PuzzleError::Constraint { section, index, source })
            }
            Yaml::Null       => Ok(Constraints::empty()),
            _                => Err(bad_entry()),
        }
    }
}

// ------------------------------------------------

impl SolverGrid {
    /// Text board of the current squares: row runs on the left, column runs on top,
    /// unknown squares highlighted.
    pub fn render(&self, emit_color: bool, subdivision: Option<usize>) -> String {
        self.render_with(emit_color, subdivision, |x, y| {
            match self.grid.get(x, y) {
                Square::Filled  => Style::default().paint("\u{25A0}"),
                Square::Empty   => Style::default().paint(" "),
                Square::Unknown => Colour::Yellow.paint("?"),
            }
        })
    }

    /// Text board of an ambiguity mask for this puzzle's runs: `?` for ambiguous squares,
    /// a dot for determined ones.
    pub fn render_mask(&self, mask: &Grid<bool>, emit_color: bool, subdivision: Option<usize>) -> String {
        self.render_with(emit_color, subdivision, |x, y| {
            match *mask.get(x, y) {
                true  => Colour::Yellow.bold().paint("?"),
                false => Colour::Fixed(241).paint("\u{00B7}"),
            }
        })
    }

    fn render_with<F>(&self, emit_color: bool, subdivision: Option<usize>, square: F) -> String
        where F: Fn(usize, usize) -> ANSIString<'static>
    {
        let row_prefixes: Vec<String> =
            self.rows.iter()
                     .map(|row| maybe_color(&self.run_style(row).paint(row.constraints.to_string()), emit_color))
                     .collect();
        let prefix_len = self.rows.iter()
                                  .map(|row| row.constraints.to_string().len())
                                  .max()
                                  .unwrap_or(0);
        let max_col_runs = self.cols.iter()
                                    .map(|col| col.constraints.len().max(1))
                                    .max()
                                    .unwrap_or(1);
        let horizontal_edge = |piece: &str| (0..self.width()).map(|_| piece.repeat(3)).collect::<Vec<_>>();

        let mut result = String::new();
        for i in (0..max_col_runs).rev() {
            result.push_str(&self.fmt_header(i, prefix_len, subdivision, emit_color));
        }

        // top board line
        result.push_str(&Self::fmt_line(&ralign("", prefix_len), "\u{2554}", "\u{2557}", "\u{2564}",
                                        subdivision, &horizontal_edge("\u{2550}")));
        for y in 0..self.height() {
            let content = (0..self.width()).map(|x| format!(" {} ", maybe_color(&square(x, y), emit_color)))
                                           .collect::<Vec<_>>();
            // left-pad by visual width, the prefix may carry escape sequences
            let pad = " ".repeat(prefix_len - self.rows[y].constraints.to_string().len());
            result.push_str(&Self::fmt_line(&format!("{}{}", pad, row_prefixes[y]), "\u{2551}", "\u{2551}", "\u{2502}",
                                            subdivision, &content));

            // horizontal subdivisor line
            if let Some(subdiv) = subdivision {
                if subdiv > 0 && (y+1) % subdiv == 0 && y != self.height()-1 {
                    result.push_str(&Self::fmt_line(&ralign("", prefix_len), "\u{255F}", "\u{2562}", "\u{253C}",
                                                    subdivision, &horizontal_edge("\u{2500}")));
                }
            }
        }
        // bottom board line
        result.push_str(&Self::fmt_line(&ralign("", prefix_len), "\u{255A}", "\u{255D}", "\u{2567}",
                                        subdivision, &horizontal_edge("\u{2550}")));
        result
    }

    fn run_style(&self, row: &Row) -> Style {
        // lines that are completely known are greyed out
        match row.slice(&self.grid).iter().all(Square::is_known) {
            true  => Style::new().fg(Colour::Fixed(241)),
            false => Style::default(),
        }
    }

    fn fmt_line(prefix: &str,
                left_delim: &str,
                right_delim: &str,
                columnwise_separator: &str,
                subdivision: Option<usize>,
                content_parts: &[String])
        -> String
    {
        let mut result = format!("{} {}", prefix, left_delim);
        for (idx, s) in content_parts.iter().enumerate() {
            result.push_str(s);
            if let Some(subdiv) = subdivision {
                if subdiv > 0 && (idx+1) % subdiv == 0 && idx < content_parts.len()-1 {
                    result.push_str(columnwise_separator);
                }
            }
        }
        result.push_str(right_delim);
        result.push('\n');
        result
    }

    fn fmt_header(&self, line_idx: usize, prefix_len: usize, subdivision: Option<usize>, emit_color: bool) -> String
    {
        let content_parts = self.cols.iter().map(|col| {
            let runs = col.constraints.runs();
            let text = match (runs.len(), line_idx) {
                (0, 0)                 => "0".to_string(),
                (n, i) if i < n        => runs[n-1-i].to_string(),
                _                      => String::new(),
            };
            let painted = self.run_style(col).paint(lalign(&text, 2));
            format!(" {}", maybe_color(&painted, emit_color))
        }).collect::<Vec<_>>();

        Self::fmt_line(&ralign("", prefix_len), " ", " ", " ", subdivision, &content_parts)
    }
}
