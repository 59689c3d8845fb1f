//! Evaluate the configured filter against manifest files

use std::{io::Write, path::PathBuf};

use anyhow::{Context, Result};
use kfilter_core::{ComparableFilter, Filter, Object};
use tracing::{debug, info};

use crate::k8s::manifest;

/// Counts of objects the filter accepted and rejected.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub accepted: usize,
    pub rejected: usize,
}

/// Writes one `<verdict>\t<kind>\t<namespace/name>` line per object.
pub fn execute<W: Write>(
    filter: &ComparableFilter,
    manifests: &[PathBuf],
    out: &mut W,
) -> Result<Summary> {
    info!(
        event.name = "check.started",
        filter = %filter,
        manifests = manifests.len(),
        "evaluating filter against manifests"
    );

    let mut summary = Summary::default();
    for path in manifests {
        for object in manifest::load_file(path)? {
            let accepted = filter.accept(&object);
            if accepted {
                summary.accepted += 1;
            } else {
                summary.rejected += 1;
            }

            debug!(
                event.name = "check.evaluated",
                k8s.kind = object.kind(),
                k8s.object = %object.ns_name(),
                accepted,
                "evaluated object"
            );

            writeln!(
                out,
                "{}\t{}\t{}",
                if accepted { "accepted" } else { "rejected" },
                object.kind(),
                object.ns_name()
            )
            .context("failed to write check result")?;
        }
    }

    info!(
        event.name = "check.completed",
        accepted = summary.accepted,
        rejected = summary.rejected,
        "filter evaluation completed"
    );

    Ok(summary)
}
