//! Command handlers for CLI subcommands
//!
//! Each handler writes its report to the given writer. `execute` maps the
//! outcome to the process exit status.

pub mod check;
pub mod diff;
pub mod watch;

use std::{io::Write, process::ExitCode};

use anyhow::Result;
use kfilter_core::ComparableFilter;

use crate::runtime::{cli::CliSubcommand, conf::Conf};

/// Process exit status, following `diff(1)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    /// The command succeeded and found no change.
    Success = 0,
    /// The command succeeded and the filter changed.
    Changed = 1,
    /// The command failed.
    Failed = 2,
}

impl Status {
    /// Errors map to [`Status::Failed`].
    pub fn of(result: &Result<Status>) -> Status {
        match result {
            Ok(status) => *status,
            Err(_) => Status::Failed,
        }
    }
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        ExitCode::from(status as u8)
    }
}

/// Execute a CLI subcommand
pub fn execute<W: Write>(
    subcommand: &CliSubcommand,
    conf: &Conf,
    filter: &ComparableFilter,
    out: &mut W,
) -> Result<Status> {
    let changed = match subcommand {
        CliSubcommand::Check { manifests } => {
            check::execute(filter, manifests, out)?;
            false
        }
        CliSubcommand::Diff { other } => {
            diff::execute(filter, other, out)? == diff::Outcome::Changed
        }
        CliSubcommand::Watch { interval, count } => {
            watch::execute(conf, filter, *interval, *count, out)?
        }
    };

    Ok(if changed {
        Status::Changed
    } else {
        Status::Success
    })
}
