// vim: set ai et ts=4 sts=4 sw=4:
use std::fs;
use std::io;
use std::process;
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use log::{error, info, LevelFilter};
use thiserror::Error;

use picross::cell::Cell;
use picross::checker::{Checker, Output};
use picross::error::{CheckerError, ConstraintError, PuzzleError, SquareError};
use picross::grid::{format_filling, format_slice, parse_slice};
use picross::puzzle::SolverGrid;
use picross::row::{generate, satisfied_suffix_length, summarize, Constraints};
use picross::util::is_a_tty;

// candidate lists longer than this are only counted
const MAX_LISTED_CANDIDATES: u64 = 64;

#[derive(Error, Debug)]
enum CliError {
    #[error(transparent)]
    Puzzle(#[from] PuzzleError),
    #[error(transparent)]
    Checker(#[from] CheckerError),
    #[error(transparent)]
    Constraint(#[from] ConstraintError),
    #[error(transparent)]
    Square(#[from] SquareError),
    #[error("invalid subdivision {0:?}, expected a positive number")]
    Subdivision(String),
    #[error("checker stopped before publishing a result")]
    NoResult,
}

fn main() {
    let puzzle_arg = Arg::with_name("PUZZLE")
        .help("YAML file with 'rows' and 'cols' lists of run lengths")
        .required(true)
        .index(1);
    let subdivision_arg = Arg::with_name("subdivision")
        .short("g")
        .long("grid")
        .value_name("N")
        .takes_value(true)
        .help("Draws a subdivision line every N squares");

    let matches = App::new("picross")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Nonogram line solver and uniqueness checker")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(Arg::with_name("verbose")
             .short("v")
             .multiple(true)
             .help("Logs more (repeat for debug and trace output)"))
        .arg(Arg::with_name("no-color")
             .long("no-color")
             .help("Never emits ANSI colour codes"))
        .subcommand(SubCommand::with_name("solve")
                    .about("Refines a puzzle to its line-solving fixed point and prints the board")
                    .arg(puzzle_arg.clone())
                    .arg(subdivision_arg.clone()))
        .subcommand(SubCommand::with_name("check")
                    .about("Runs a puzzle through the background checker and prints its ambiguous squares")
                    .arg(puzzle_arg)
                    .arg(subdivision_arg))
        .subcommand(SubCommand::with_name("line")
                    .about("Lists the fillings of a single line")
                    .arg(Arg::with_name("CONSTRAINTS")
                         .help("Run lengths, e.g. \"1 4\" (0 for an empty line)")
                         .required(true)
                         .index(1))
                    .arg(Arg::with_name("SLICE")
                         .help("Known squares: '?' unknown, 'x' filled, '.' empty")
                         .required(true)
                         .index(2)))
        .get_matches();

    setup_logging(matches.occurrences_of("verbose"));

    if let Err(err) = run(&matches) {
        eprintln!("error: {}", err);
        process::exit(1);
    }
}

fn setup_logging(verbosity: u64) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    let result = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!("[{}][{}] {}", record.level(), record.target(), message))
        })
        .level(level)
        .chain(io::stderr())
        .apply();
    if let Err(err) = result {
        eprintln!("warning: logging unavailable: {}", err);
    }
}

fn run(matches: &ArgMatches) -> Result<(), CliError> {
    let emit_color = !matches.is_present("no-color") && is_a_tty(io::stdout());
    match matches.subcommand() {
        ("solve", Some(sub)) => solve(sub, emit_color),
        ("check", Some(sub)) => check(sub, emit_color),
        ("line", Some(sub))  => line(sub),
        _                    => Ok(()),
    }
}

fn load_puzzle(matches: &ArgMatches) -> Result<SolverGrid, CliError> {
    let path = matches.value_of("PUZZLE").unwrap_or_default();
    info!("loading puzzle from {}", path);
    let text = fs::read_to_string(path).map_err(PuzzleError::from)?;
    Ok(SolverGrid::from_yaml_str(&text)?)
}

fn subdivision(matches: &ArgMatches) -> Result<Option<usize>, CliError> {
    match matches.value_of("subdivision") {
        None    => Ok(None),
        Some(s) => match s.parse::<usize>() {
            Ok(n) if n > 0 => Ok(Some(n)),
            _              => Err(CliError::Subdivision(s.to_string())),
        },
    }
}

fn solve(matches: &ArgMatches, emit_color: bool) -> Result<(), CliError> {
    let mut puzzle = load_puzzle(matches)?;
    let subdivision = subdivision(matches)?;
    let passes = puzzle.solve();
    info!("{} refinement passes", passes);

    print!("{}", puzzle.render(emit_color, subdivision));
    match puzzle.count_unknowns() {
        0 => println!("solved"),
        n => println!("{} squares left unknown", n),
    }
    Ok(())
}

fn check(matches: &ArgMatches, emit_color: bool) -> Result<(), CliError> {
    let puzzle = load_puzzle(matches)?;
    let subdivision = subdivision(matches)?;

    let checker = Checker::spawn()?;
    let output: Output = Cell::future();
    checker.check(&puzzle.column_constraints(), &puzzle.row_constraints(), output.clone());
    let mask = output.get().ok_or(CliError::NoResult)?;
    if checker.join().is_err() {
        error!("checker worker panicked");
    }

    print!("{}", puzzle.render_mask(&mask, emit_color, subdivision));
    match mask.count_set() {
        0 => println!("unique: every square follows from line deduction"),
        n => println!("not line-solvable: {} ambiguous squares", n),
    }
    Ok(())
}

fn line(matches: &ArgMatches) -> Result<(), CliError> {
    let constraints: Constraints = matches.value_of("CONSTRAINTS").unwrap_or_default().parse()?;
    let slice = parse_slice(matches.value_of("SLICE").unwrap_or_default())?;

    let summary = summarize(&constraints, &slice);
    println!("{} candidates", summary.candidates);
    if summary.candidates <= MAX_LISTED_CANDIDATES {
        let mut candidates = generate(&constraints, &slice).into_iter().collect::<Vec<_>>();
        candidates.sort();
        for candidate in candidates {
            println!("  {}", format_filling(&candidate));
        }
    }
    match summary.deduce(&slice) {
        Some(deduced) => println!("deduced: {}", format_slice(&deduced)),
        None          => println!("deduced: contradiction"),
    }
    println!("satisfied suffix: {}", satisfied_suffix_length(&constraints, &slice));
    Ok(())
}
