use std::{path::PathBuf, time::Duration};

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use tracing::Level;

use crate::runtime::conf::conf_serde::level;

#[derive(Parser, Debug, Serialize, Deserialize)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Set the path to the configuration file (e.g., "kfilter.yaml").
    #[arg(short, long, value_name = "FILE", env = "KFILTER_CONFIG_PATH")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<PathBuf>,

    /// Set the application's log level (e.g., "debug", "warn").
    /// Overrides the level from the configuration file.
    #[arg(short, long, value_name = "LEVEL", env = "KFILTER_LOG_LEVEL")]
    #[serde(
        with = "level::option",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub log_level: Option<Level>,

    #[command(subcommand)]
    #[serde(skip)]
    pub command: Option<CliSubcommand>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum CliSubcommand {
    /// Evaluate the configured filter against Kubernetes manifests
    Check {
        /// YAML manifest files, each holding one or more documents
        #[arg(value_name = "MANIFEST", required = true)]
        manifests: Vec<PathBuf>,
    },
    /// Compare the configured filter with the filter of another configuration file
    ///
    /// Exits with status 1 when the filters differ and 2 on error.
    Diff {
        /// Configuration file holding the filter to compare against
        #[arg(value_name = "FILE")]
        other: PathBuf,
    },
    /// Re-read the configuration file periodically and report filter changes
    ///
    /// Exits with status 1 when the filter changed at least once.
    Watch {
        /// Time between reloads (e.g., "500ms", "10s")
        #[arg(short, long, default_value = "2s", value_parser = humantime::parse_duration)]
        interval: Duration,

        /// Stop after this many reloads instead of running forever
        #[arg(short = 'n', long, value_name = "N")]
        count: Option<u64>,
    },
}
