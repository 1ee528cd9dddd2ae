// vim: set ai et ts=4 sts=4 sw=4:
use log::{debug, trace};
use super::SolverGrid;
use super::super::grid::{Grid, Square};
use super::super::row::LineOutcome;

/// What one refinement pass over every row and column accomplished.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Default)]
pub struct PassSummary {
    /// Squares that went from unknown to known.
    pub changed: usize,
    /// Lines for which no compatible filling exists; they are left untouched.
    pub contradictions: usize,
}

impl SolverGrid {
    pub fn count_unknowns(&self) -> usize {
        self.grid.iter().filter(|&&sq| sq == Square::Unknown).count()
    }

    pub fn is_solved(&self) -> bool {
        self.count_unknowns() == 0
    }

    /// Runs line deduction once over every row, then every column, each seeing the
    /// squares settled by the lines before it. Known squares never revert to unknown.
    pub fn single_pass_refine(&mut self) -> PassSummary {
        let mut summary = PassSummary::default();
        for row in self.rows.iter().chain(self.cols.iter()) {
            match row.refine(&mut self.grid) {
                LineOutcome::Changed(n)    => summary.changed += n,
                LineOutcome::Contradiction => summary.contradictions += 1,
            }
        }
        trace!("refine pass: {} squares settled, {} contradictory lines, {} unknown left",
               summary.changed, summary.contradictions, self.count_unknowns());
        summary
    }

    /// Repeats `single_pass_refine` until a pass leaves the number of unknown squares
    /// unchanged. Returns the number of passes, including the final idle one.
    pub fn solve(&mut self) -> usize {
        let mut passes = 0;
        loop {
            let before = self.count_unknowns();
            self.single_pass_refine();
            passes += 1;
            if self.count_unknowns() == before {
                break;
            }
        }
        debug!("fixed point after {} passes, {} of {} squares unknown",
               passes, self.count_unknowns(), self.width() * self.height());
        passes
    }

    /// `true` for every square still unknown.
    pub fn ambiguity_mask(&self) -> Grid<bool> {
        self.grid.map(|&sq| sq == Square::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::Constraints;
    use crate::util::Direction::*;
    use proptest::prelude::*;

    fn constraints(lines: &[&str]) -> Vec<Constraints> {
        lines.iter().map(|s| s.parse().unwrap()).collect()
    }

    /// Run lengths of every row and column of a picture, given as rows of `x`/`.`.
    fn clues_of(picture: &[Vec<bool>]) -> (Vec<Constraints>, Vec<Constraints>) {
        let runs = |line: Vec<bool>| {
            let mut runs = Vec::new();
            let mut current = 0;
            for b in line.into_iter().chain(std::iter::once(false)) {
                if b {
                    current += 1;
                } else if current > 0 {
                    runs.push(current);
                    current = 0;
                }
            }
            Constraints::new(runs).unwrap()
        };
        let width = picture[0].len();
        let cols = (0..width).map(|x| runs(picture.iter().map(|row| row[x]).collect())).collect();
        let rows = picture.iter().map(|row| runs(row.clone())).collect();
        (cols, rows)
    }

    #[test]
    fn solves_line_solvable_puzzle() {
        let mut puzzle = SolverGrid::new(&constraints(&["2", "2", "2"]),
                                         &constraints(&["1 1", "3", "1"]));
        assert_eq!(puzzle.count_unknowns(), 9);
        let passes = puzzle.solve();
        assert!(passes >= 2);
        assert!(puzzle.is_solved());
        assert!(puzzle.ambiguity_mask().is_unique());
        assert_eq!(puzzle.grid().to_string(), "x.x\nxxx\n.x.\n");
    }

    #[test]
    fn ambiguous_puzzle_stays_unknown() {
        // two diagonals both satisfy every line
        let mut puzzle = SolverGrid::new(&constraints(&["1", "1"]), &constraints(&["1", "1"]));
        assert_eq!(puzzle.solve(), 1);
        assert_eq!(puzzle.count_unknowns(), 4);
        let mask = puzzle.ambiguity_mask();
        assert_eq!(mask.count_set(), 4);
        assert!(!mask.is_unique());
    }

    #[test]
    fn partially_ambiguous_puzzle() {
        // top row is forced, the bottom left 2x2 block is a pair of swappable diagonals
        let mut puzzle = SolverGrid::new(&constraints(&["1 1", "1 1", "1"]),
                                         &constraints(&["3", "0", "1", "1"]));
        puzzle.solve();
        assert_eq!(puzzle.grid().to_string(), "xxx\n...\n??.\n??.\n");
        assert_eq!(puzzle.count_unknowns(), 4);
        assert_eq!(puzzle.grid().line(Vertical, 2), crate::grid::parse_slice("x...").unwrap());
    }

    #[test]
    fn refine_counts_contradictions() {
        // a full row can't coexist with an empty column
        let mut puzzle = SolverGrid::new(&constraints(&["0", "1"]), &constraints(&["2"]));
        let summary = puzzle.single_pass_refine();
        assert_eq!(summary.changed, 2);
        assert_eq!(summary.contradictions, 1);
        assert_eq!(puzzle.grid().line(Horizontal, 0), vec![Square::Filled; 2]);
    }

    #[test]
    fn fixed_point_is_idempotent() {
        let mut puzzle = SolverGrid::new(&constraints(&["2", "2", "2"]),
                                         &constraints(&["1 1", "3", "1"]));
        puzzle.solve();
        let grid = puzzle.grid().clone();
        let summary = puzzle.single_pass_refine();
        assert_eq!(summary.changed, 0);
        assert_eq!(puzzle.grid(), &grid);
    }

    fn pictures() -> impl Strategy<Value = Vec<Vec<bool>>> {
        (1usize..7, 1usize..7).prop_flat_map(|(w, h)| {
            prop::collection::vec(prop::collection::vec(any::<bool>(), w), h)
        })
    }

    proptest! {
        #[test]
        fn refinement_is_monotone_and_sound(picture in pictures()) {
            let (cols, rows) = clues_of(&picture);
            let mut puzzle = SolverGrid::new(&cols, &rows);
            let mut unknowns = puzzle.count_unknowns();
            loop {
                let before = puzzle.grid().clone();
                let summary = puzzle.single_pass_refine();
                prop_assert_eq!(summary.contradictions, 0);
                let after = puzzle.count_unknowns();
                prop_assert!(after <= unknowns);
                // known squares never change again
                for (old, new) in before.iter().zip(puzzle.grid().iter()) {
                    if old.is_known() { prop_assert_eq!(old, new); }
                }
                if after == unknowns { break; }
                unknowns = after;
            }
            // every settled square agrees with the picture the clues came from
            for (y, row) in picture.iter().enumerate() {
                for (x, &filled) in row.iter().enumerate() {
                    let sq = *puzzle.grid().get(x, y);
                    prop_assert!(sq.admits(filled));
                }
            }
            let settled = puzzle.count_unknowns();
            puzzle.single_pass_refine();
            prop_assert_eq!(puzzle.count_unknowns(), settled);
        }
    }
}
