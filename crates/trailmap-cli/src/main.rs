//! Trailmap CLI entry point.

use std::{process, str::FromStr};

use clap::Parser;
use log::{LevelFilter, debug, error, info};

use trailmap_cli::{Args, error_adapter::to_reportables};

fn main() {
    // Panics render through miette like every other failure.
    miette::set_panic_hook();

    // Arguments come first: the log level is one of them.
    let args = Args::parse();

    // An unknown level falls back to warn instead of aborting the run.
    let log_level = LevelFilter::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!(
            "Invalid log level: {}. Using 'warn' instead.",
            args.log_level
        );
        LevelFilter::Warn
    });

    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    info!(log_level:?; "Starting Trailmap");
    debug!(args:?; "Parsed arguments");

    // Lay out the incident and write the requested outputs
    if let Err(err) = trailmap_cli::run(&args) {
        let reporter = miette::GraphicalReportHandler::new();

        // Each reportable renders with its own code and help text
        for reportable in to_reportables(&err) {
            let mut writer = String::new();
            reporter
                .render_report(&mut writer, &reportable)
                .expect("Writing to String buffer is infallible");

            error!("{writer}");
        }

        process::exit(1);
    }

    info!("Completed successfully");
}
