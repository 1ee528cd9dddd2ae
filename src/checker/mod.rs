// vim: set ai et ts=4 sts=4 sw=4:
//! Background uniqueness checking.
//!
//! A `Checker` owns one worker thread that takes puzzles through line refinement one
//! pass at a time and publishes the resulting ambiguity mask into a caller-owned cell.
//! Each pass is a separate mailbox message, so a newer `check` or a `kill` queued behind
//! it gets its turn before the next pass runs.

mod messages;

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use crossbeam::channel::{self, Receiver, Sender};
use log::{debug, trace, warn};

use super::cell::Cell;
use super::error::CheckerError;
use super::grid::Grid;
use super::puzzle::SolverGrid;
use super::row::Constraints;
use super::util::lower_thread_priority;
use self::messages::CheckerMsg;

/// Where a check publishes its ambiguity mask; `None` means "no result".
pub type Output = Cell<Option<Grid<bool>>>;

const WORKER_NAME: &str = "picross-checker";
const WORKER_NICENESS: i32 = 10;

#[derive(PartialEq, Eq, Copy, Clone, Debug)]
pub enum CheckerState {
    Idle,
    Checking,
    Killed,
}

pub struct Checker {
    mailbox: Sender<CheckerMsg>,
    state: Cell<CheckerState>,
    kill_sent: AtomicBool,
    worker: Option<JoinHandle<()>>,
}

impl Checker {
    pub fn spawn() -> Result<Checker, CheckerError> {
        Self::spawn_gated(None)
    }

    /// Worker that doesn't look at its mailbox until `gate` yields or disconnects.
    #[cfg(test)]
    fn spawn_held() -> (Checker, Sender<()>) {
        let (release, gate) = channel::bounded(1);
        let checker = Self::spawn_gated(Some(gate)).expect("spawn checker");
        (checker, release)
    }

    fn spawn_gated(gate: Option<Receiver<()>>) -> Result<Checker, CheckerError> {
        let (mailbox, inbox) = channel::unbounded();
        let state = Cell::new(CheckerState::Idle);
        let worker = Worker {
            mailbox: mailbox.clone(),
            state: state.clone(),
            generation: 0,
            job: None,
        };
        let handle = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || {
                if !lower_thread_priority(WORKER_NICENESS) {
                    debug!("{}: running at normal priority", WORKER_NAME);
                }
                if let Some(gate) = gate {
                    let _ = gate.recv();
                }
                worker.run(inbox);
            })?;
        Ok(Checker {
            mailbox,
            state,
            kill_sent: AtomicBool::new(false),
            worker: Some(handle),
        })
    }

    /// Queues a check of the puzzle with these runs. Returns immediately; the mask (or
    /// `None` if the check gets superseded or killed) is written into `output` from the
    /// worker thread.
    pub fn check(&self, column_constraints: &[Constraints], row_constraints: &[Constraints], output: Output) {
        if self.kill_sent.load(Ordering::SeqCst) {
            debug!("{}: check after kill ignored", WORKER_NAME);
            return;
        }
        self.send(CheckerMsg::Check {
            columns: column_constraints.to_vec(),
            rows: row_constraints.to_vec(),
            output,
        });
    }

    /// Queues termination behind everything already in the mailbox.
    pub fn kill(&self) {
        if self.kill_sent.swap(true, Ordering::SeqCst) {
            debug!("{}: already killed", WORKER_NAME);
            return;
        }
        self.send(CheckerMsg::Kill);
    }

    pub fn state(&self) -> CheckerState {
        self.state.get()
    }

    /// Read-only view of the worker state, for subscribing to transitions.
    pub fn state_cell(&self) -> Cell<CheckerState> {
        self.state.readonly()
    }

    /// Kills the worker and waits until it has worked through its mailbox.
    pub fn join(mut self) -> thread::Result<()> {
        self.kill();
        match self.worker.take() {
            Some(handle) => handle.join(),
            None         => Ok(()),
        }
    }

    fn send(&self, msg: CheckerMsg) {
        if let Err(err) = self.mailbox.send(msg) {
            debug!("{}: worker is gone, dropping {:?}", WORKER_NAME, err.into_inner());
        }
    }
}

impl Drop for Checker {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.kill();
        }
    }
}

// ------------------------------------------------

struct Job {
    generation: u64,
    puzzle: SolverGrid,
    output: Output,
    passes: usize,
}

/// State owned by the worker thread.
struct Worker {
    // steps are re-enqueued at the tail of the worker's own mailbox
    mailbox: Sender<CheckerMsg>,
    state: Cell<CheckerState>,
    generation: u64,
    job: Option<Job>,
}

impl Worker {
    fn run(mut self, inbox: Receiver<CheckerMsg>) {
        debug!("{}: started", WORKER_NAME);
        for msg in inbox.iter() {
            match msg {
                CheckerMsg::Check { columns, rows, output } => self.start(&columns, &rows, output),
                CheckerMsg::Step { generation }            => self.step(generation),
                CheckerMsg::Kill => {
                    self.abandon();
                    self.publish_state(CheckerState::Killed);
                    break;
                }
            }
        }
        debug!("{}: stopped", WORKER_NAME);
    }

    fn start(&mut self, columns: &[Constraints], rows: &[Constraints], output: Output) {
        self.abandon();
        self.generation += 1;
        let puzzle = SolverGrid::new(columns, rows);
        debug!("{}: check #{} started on {}x{} puzzle",
               WORKER_NAME, self.generation, puzzle.width(), puzzle.height());
        self.job = Some(Job { generation: self.generation, puzzle, output, passes: 0 });
        self.publish_state(CheckerState::Checking);
        self.schedule(self.generation);
    }

    fn step(&mut self, generation: u64) {
        let settled = match self.job.as_mut() {
            Some(job) if job.generation == generation => {
                let before = job.puzzle.count_unknowns();
                let summary = job.puzzle.single_pass_refine();
                job.passes += 1;
                trace!("{}: check #{} pass {}: {:?}", WORKER_NAME, generation, job.passes, summary);
                job.puzzle.count_unknowns() == before
            }
            _ => {
                trace!("{}: dropping step of superseded check #{}", WORKER_NAME, generation);
                return;
            }
        };
        match (settled, self.job.take()) {
            (true, Some(job)) => self.finish(job),
            (false, job)      => {
                self.job = job;
                self.schedule(generation);
            }
            (true, None)      => {}
        }
    }

    fn finish(&mut self, job: Job) {
        let mask = job.puzzle.ambiguity_mask();
        debug!("{}: check #{} done after {} passes, {} ambiguous squares",
               WORKER_NAME, job.generation, job.passes, mask.count_set());
        Self::deliver(&job.output, Some(mask));
        self.publish_state(CheckerState::Idle);
    }

    /// Resets the output of an undelivered check.
    fn abandon(&mut self) {
        if let Some(job) = self.job.take() {
            debug!("{}: abandoning check #{} after {} passes", WORKER_NAME, job.generation, job.passes);
            Self::deliver(&job.output, None);
            self.publish_state(CheckerState::Idle);
        }
    }

    fn schedule(&self, generation: u64) {
        if self.mailbox.send(CheckerMsg::Step { generation }).is_err() {
            warn!("{}: cannot schedule step of check #{}", WORKER_NAME, generation);
        }
    }

    fn deliver(output: &Output, value: Option<Grid<bool>>) {
        if let Err(err) = output.set(value) {
            warn!("{}: cannot write check output ({}): {}", WORKER_NAME, output.kind_name(), err);
        }
    }

    fn publish_state(&self, state: CheckerState) {
        // the state cell is a manual cell, writes always succeed
        let _ = self.state.set(state);
    }
}
