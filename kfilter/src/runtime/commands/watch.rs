//! Poll the configuration file and report filter changes

use std::{io::Write, thread, time::Duration};

use anyhow::{Context, Result};
use kfilter_core::ComparableFilter;
use tracing::{info, warn};

use crate::runtime::{conf::Conf, reload::FilterReloader};

/// Writes one `changed\t<previous> -> <current>` line per filter change.
///
/// Runs until `count` polls have completed, or forever when `count` is `None`.
/// Returns whether any change was seen.
pub fn execute<W: Write>(
    conf: &Conf,
    filter: &ComparableFilter,
    interval: Duration,
    count: Option<u64>,
    out: &mut W,
) -> Result<bool> {
    let mut reloader = FilterReloader::new(conf.clone(), filter.clone())
        .context("watch needs a configuration file")?;

    info!(
        event.name = "watch.started",
        config.path = ?conf.config_path,
        interval = %humantime::format_duration(interval),
        filter = %filter,
        "watching configuration for filter changes"
    );

    let mut changed = false;
    let mut polls = 0u64;
    while count.is_none_or(|count| polls < count) {
        thread::sleep(interval);
        polls += 1;

        match reloader.poll() {
            Ok(Some(previous)) => {
                changed = true;
                writeln!(out, "changed\t{previous} -> {}", reloader.filter())
                    .and_then(|()| out.flush())
                    .context("failed to write watch result")?;
            }
            Ok(None) => {}
            Err(e) => warn!(
                event.name = "reload.failed",
                error.message = %e,
                filter = %reloader.filter(),
                "failed to reload configuration, keeping current filter"
            ),
        }
    }

    info!(event.name = "watch.completed", polls, changed, "stopped watching");

    Ok(changed)
}
