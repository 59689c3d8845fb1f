//! Reload the filter from the configuration file
//!
//! The file is polled: every poll re-reads it and rebuilds the filter, and a
//! change is reported only when the new filter is not `equals`-equal to the
//! one currently held.

use kfilter_core::ComparableFilter;
use tracing::{debug, info};

use crate::runtime::conf::{Conf, ConfigError};

/// Holds the active filter and the configuration it was built from.
#[derive(Debug)]
pub struct FilterReloader {
    conf: Conf,
    filter: ComparableFilter,
}

impl FilterReloader {
    /// # Errors
    /// * `ConfigError::NoConfigFile` - `conf` was not loaded from a file, so
    ///   there is nothing to reload.
    pub fn new(conf: Conf, filter: ComparableFilter) -> Result<Self, ConfigError> {
        if conf.config_path.is_none() {
            return Err(ConfigError::NoConfigFile);
        }
        Ok(Self { conf, filter })
    }

    pub fn filter(&self) -> &ComparableFilter {
        &self.filter
    }

    /// Re-reads the configuration file and swaps in its filter if it changed.
    ///
    /// Returns the replaced filter, or `None` when the filter is unchanged.
    /// On error the current filter is kept.
    pub fn poll(&mut self) -> Result<Option<ComparableFilter>, ConfigError> {
        let conf = self.conf.reload()?;
        let filter = conf.filter.build()?;

        if self.filter.equals(&filter) {
            debug!(
                event.name = "reload.unchanged",
                config.path = ?conf.config_path,
                filter = %filter,
                "filter unchanged after reload"
            );
            return Ok(None);
        }

        info!(
            event.name = "reload.filter_changed",
            config.path = ?conf.config_path,
            filter.previous = %self.filter,
            filter.current = %filter,
            "filter changed after reload"
        );

        self.conf = conf;
        Ok(Some(std::mem::replace(&mut self.filter, filter)))
    }
}
