mod k8s;
mod runtime;

use std::{
    io::{self, Write},
    process::ExitCode,
};

use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::{
    EnvFilter,
    fmt::{Layer, format::FmtSpan},
    prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

use crate::runtime::{
    cli::Cli,
    commands::{self, Status},
    conf::Conf,
};

/// Logs go to stderr so that command output on stdout stays machine readable.
fn init_tracing(log_level: Level) {
    let mut fmt_layer = Layer::new()
        .with_writer(io::stderr)
        .with_span_events(FmtSpan::NONE)
        .with_ansi(std::env::var("NO_COLOR").is_err());

    if matches!(log_level, Level::DEBUG | Level::TRACE) {
        fmt_layer = fmt_layer.with_file(true).with_line_number(true);
    }

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("warn,kfilter={log_level},kfilter_core={log_level}"))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn run() -> anyhow::Result<Status> {
    let (conf, cli) = Conf::new(Cli::parse())?;
    init_tracing(conf.log_level);

    let filter = conf.filter.build()?;
    info!(
        event.name = "config.loaded",
        config.path = ?conf.config_path,
        filter = %filter,
        "configuration loaded"
    );

    let mut stdout = io::stdout().lock();
    match &cli.command {
        Some(subcommand) => commands::execute(subcommand, &conf, &filter, &mut stdout),
        None => {
            writeln!(stdout, "{filter}")?;
            Ok(Status::Success)
        }
    }
}

fn main() -> ExitCode {
    let result = run();
    if let Err(err) = &result {
        eprintln!("Error: {err:?}");
    }
    Status::of(&result).into()
}
