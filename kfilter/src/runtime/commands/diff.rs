//! Compare the configured filter with the filter of another configuration file

use std::{io::Write, path::Path};

use anyhow::{Context, Result};
use kfilter_core::ComparableFilter;
use tracing::info;

use crate::runtime::conf::Conf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Unchanged,
    Changed,
}

pub fn execute<W: Write>(
    current: &ComparableFilter,
    other: &Path,
    out: &mut W,
) -> Result<Outcome> {
    let other_conf = Conf::from_file(other)
        .with_context(|| format!("failed to load configuration {}", other.display()))?;
    let candidate = other_conf.filter.build()?;

    let outcome = if current.equals(&candidate) {
        Outcome::Unchanged
    } else {
        Outcome::Changed
    };

    info!(
        event.name = "diff.completed",
        current = %current,
        candidate = %candidate,
        changed = outcome == Outcome::Changed,
        "compared filters"
    );

    let written = match outcome {
        Outcome::Unchanged => writeln!(out, "unchanged\t{current}"),
        Outcome::Changed => writeln!(out, "changed\t{current} -> {candidate}"),
    };
    written.context("failed to write diff result")?;

    Ok(outcome)
}
