// vim: set ai et ts=4 sts=4 sw=4:
//! Mailbox protocol of the checker worker.
//!
//! ```text
//! caller --Check/Kill--> worker --Step--> worker (tail of the same mailbox)
//! ```

use super::Output;
use crate::row::Constraints;

#[derive(Debug)]
pub(super) enum CheckerMsg {
    /// Start a check on private copies of the runs, superseding any check in flight
    Check {
        columns: Vec<Constraints>,
        rows: Vec<Constraints>,
        output: Output,
    },
    /// One refinement pass of the check started as `generation`
    Step { generation: u64 },
    /// Abandon pending work and stop the worker
    Kill,
}
