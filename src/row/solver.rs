// vim: set ai et ts=4 sts=4 sw=4:
use std::collections::HashSet;
use super::{min_length, Constraints};
use super::super::grid::Square::{self, Empty, Filled};

/// Every filling of `compatible_with.len()` squares that matches the run lengths exactly
/// and agrees with all squares that are already known. Empty when there is none.
pub fn generate(constraints: &Constraints, compatible_with: &[Square]) -> HashSet<Vec<bool>> {
    let mut result = HashSet::new();
    if !constraints.fits(compatible_with.len()) {
        return result;
    }
    let mut placer = Placer::new(constraints.runs(), compatible_with);
    let mut filling = Vec::with_capacity(compatible_with.len());
    placer.enumerate(0, 0, &mut filling, &mut result);
    result
}

/// Same information as `generate` folded per position, without materialising the
/// candidate set.
pub fn summarize(constraints: &Constraints, slice: &[Square]) -> LineSummary {
    let mut summary = LineSummary {
        candidates: 0,
        can_fill:  vec![false; slice.len()],
        can_empty: vec![false; slice.len()],
    };
    if !constraints.fits(slice.len()) {
        return summary;
    }

    let runs = constraints.runs();
    let mut placer = Placer::new(runs, slice);
    summary.candidates = placer.completions(0, 0);
    if summary.candidates == 0 {
        return summary;
    }

    // walk every (run, position) state that lies on at least one complete filling
    let mut visited = vec![false; placer.memo.len()];
    let mut pending = vec![(0usize, 0usize)];
    visited[placer.state_index(0, 0)] = true;
    while let Some((run, pos)) = pending.pop() {
        if run == runs.len() {
            summary.mark(pos..slice.len(), false);
            continue;
        }
        for (start, next) in placer.placements(run, pos) {
            if placer.completions(run+1, next) == 0 { continue; }
            let end = start + runs[run];
            summary.mark(pos..start, false);
            summary.mark(start..end, true);
            summary.mark(end..next, false);

            let idx = placer.state_index(run+1, next);
            if !visited[idx] {
                visited[idx] = true;
                pending.push((run+1, next));
            }
        }
    }
    summary
}

/// Length of the confirmed run of filled squares at the end of `slice` (ignoring trailing
/// empty squares), provided it has exactly the length of the last run and its left edge is
/// settled (an empty square or the start of the line). Zero otherwise.
///
/// Only the final run is checked; earlier runs are never chained onto the count.
pub fn satisfied_suffix_length(constraints: &Constraints, slice: &[Square]) -> usize {
    let last = match constraints.last() {
        Some(len) => len,
        None      => return 0,
    };
    let mut end = slice.len();
    while end > 0 && slice[end-1] == Empty {
        end -= 1;
    }
    let mut start = end;
    while start > 0 && slice[start-1] == Filled {
        start -= 1;
    }

    let run_length = end - start;
    if run_length == 0 || run_length != last {
        return 0;
    }
    if start > 0 && slice[start-1] != Empty {
        // bounded by an unknown square: the run might still grow to the left
        return 0;
    }
    run_length
}

// -------------------------------------------------------------

/// Per-position outcome of all fillings compatible with a line.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct LineSummary {
    /// Number of compatible fillings (saturating).
    pub candidates: u64,
    can_fill:  Vec<bool>,
    can_empty: Vec<bool>,
}

impl LineSummary {
    pub fn is_contradictory(&self) -> bool {
        self.candidates == 0
    }
    fn mark(&mut self, range: std::ops::Range<usize>, filled: bool) {
        let target = if filled { &mut self.can_fill } else { &mut self.can_empty };
        for flag in &mut target[range] {
            *flag = true;
        }
    }

    /// The squares every compatible filling agrees on, applied on top of `slice`.
    /// `None` if the line has no compatible filling at all.
    pub fn deduce(&self, slice: &[Square]) -> Option<Vec<Square>> {
        if self.is_contradictory() {
            return None;
        }
        Some(slice.iter().enumerate().map(|(i, &sq)| {
            match (self.can_fill[i], self.can_empty[i]) {
                (true, false) => Filled,
                (false, true) => Empty,
                _             => sq,
            }
        }).collect())
    }
}

// -------------------------------------------------------------

/// Places runs left to right. A state (run, pos) means runs `0..run` have been placed and
/// `pos` is the first square not yet decided.
struct Placer<'a> {
    runs:  &'a [usize],
    slice: &'a [Square],
    memo:  Vec<Option<u64>>,
}

impl<'a> Placer<'a> {
    fn new(runs: &'a [usize], slice: &'a [Square]) -> Self {
        Placer {
            runs,
            slice,
            memo: vec![None; (runs.len() + 1) * (slice.len() + 1)],
        }
    }

    fn state_index(&self, run: usize, pos: usize) -> usize {
        run * (self.slice.len() + 1) + pos
    }

    /// Admissible starting positions for run `run`, paired with the first square after
    /// the run and its separating gap.
    fn placements(&self, run: usize, pos: usize) -> Vec<(usize, usize)> {
        let len = self.slice.len();
        let length = self.runs[run];
        let needed = min_length(&self.runs[run..]);
        let mut result = Vec::new();
        if pos.saturating_add(needed) > len {
            return result;
        }
        for start in pos..=(len - needed) {
            // every square skipped over becomes empty; a filled one ends the search
            if start > pos && !self.slice[start-1].admits(false) {
                break;
            }
            let end = start + length;
            if !self.slice[start..end].iter().all(|sq| sq.admits(true)) {
                continue;
            }
            if end < len {
                if !self.slice[end].admits(false) { continue; }
                result.push((start, end + 1));
            } else {
                result.push((start, end));
            }
        }
        result
    }

    fn completions(&mut self, run: usize, pos: usize) -> u64 {
        let idx = self.state_index(run, pos);
        if let Some(count) = self.memo[idx] {
            return count;
        }
        let count = if run == self.runs.len() {
            match self.slice[pos..].iter().all(|sq| sq.admits(false)) {
                true  => 1,
                false => 0,
            }
        } else {
            self.placements(run, pos)
                .into_iter()
                .fold(0u64, |acc, (_, next)| acc.saturating_add(self.completions(run+1, next)))
        };
        self.memo[idx] = Some(count);
        count
    }

    fn enumerate(&mut self, run: usize, pos: usize, filling: &mut Vec<bool>, out: &mut HashSet<Vec<bool>>) {
        if self.completions(run, pos) == 0 {
            return;
        }
        let len = self.slice.len();
        if run == self.runs.len() {
            filling.resize(len, false);
            out.insert(filling.clone());
            filling.truncate(pos);
            return;
        }
        for (start, next) in self.placements(run, pos) {
            let end = start + self.runs[run];
            filling.resize(start, false);
            filling.resize(end, true);
            filling.resize(next, false);
            self.enumerate(run+1, next, filling, out);
            filling.truncate(pos);
        }
    }
}
