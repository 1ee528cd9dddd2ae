// vim: set ai et ts=4 sts=4 sw=4:
use std::time::Duration;
use picross::{Cell, Checker, CheckerState, Output, Propagation, SolverGrid};

const TEN_BY_TEN: &str = include_str!("data/ten_by_ten.yaml");
const AMBIGUOUS: &str = include_str!("data/ambiguous.yaml");
const WAIT: Duration = Duration::from_secs(30);

#[test]
fn ten_by_ten_is_line_solvable() {
    let mut puzzle = SolverGrid::from_yaml_str(TEN_BY_TEN).unwrap();
    assert_eq!(puzzle.solve(), 4);
    assert!(puzzle.is_solved());
    assert_eq!(puzzle.grid().to_string(), "\
.xxxxx....
x....xxxx.
x.....x..x
x.x...x..x
x...x.x..x
x.x.xxx..x
x.x......x
x.x......x
xxx.xxxx.x
..xxx..xxx
");
}

#[test]
fn checker_agrees_with_synchronous_solve() {
    let checker = Checker::spawn().unwrap();
    for text in &[TEN_BY_TEN, AMBIGUOUS] {
        let mut puzzle = SolverGrid::from_yaml_str(text).unwrap();
        let output: Output = Cell::future();
        checker.check(&puzzle.column_constraints(), &puzzle.row_constraints(), output.clone());
        let mask = output.get_timeout(WAIT).expect("check finished").expect("mask delivered");
        puzzle.solve();
        assert_eq!(mask, puzzle.ambiguity_mask());
    }
    checker.join().unwrap();
}

#[test]
fn verdict_cell_follows_checker_output() {
    let puzzle = SolverGrid::from_yaml_str(AMBIGUOUS).unwrap();
    let checker = Checker::spawn().unwrap();
    let output: Output = Cell::new(None);
    let verdict = output.map(Propagation::Push, |mask| mask.map(|m| m.count_set()));
    let (_, changed) = verdict.changes();

    checker.check(&puzzle.column_constraints(), &puzzle.row_constraints(), output.clone());
    changed.recv_timeout(WAIT).unwrap();
    assert_eq!(verdict.get(), Some(4));

    let states = checker.state_cell();
    checker.join().unwrap();
    assert_eq!(states.get(), CheckerState::Killed);
}
