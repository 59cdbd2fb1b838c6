//! OMP Migrate - Main entry point
//!
//! Exports scan-manager configuration into a snapshot archive or imports
//! one onto another server.

use anyhow::{Context, Result};
use clap::Parser;
use omp_migrate::cli::{Action, Args};
use omp_migrate::omp::OmpCommand;
use omp_migrate::{commands, utils, ConnectionProfile};
use omp_snapshot::RunReport;
use std::process::ExitCode;

fn run(args: &Args) -> Result<RunReport> {
    let profile = args
        .config
        .as_deref()
        .map(ConnectionProfile::from_file)
        .transpose()
        .context("Failed to load connection profile")?;

    if let Some(profile) = &profile {
        tracing::info!("Using omp at {}:{} as {}", profile.host, profile.port, profile.username);
    }
    let slave_password = profile.as_ref().map(|profile| profile.password.clone());
    let service = OmpCommand::new(&args.omp, profile);

    match args.action {
        Action::Export => commands::export(service, &args.file, slave_password),
        Action::Import => commands::import(service, &args.file),
    }
}

fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    if let Err(e) = utils::logger::init(&args.log_level) {
        eprintln!("Failed to initialize logging: {e}");
    }

    tracing::info!("Starting omp-migrate v{}", env!("CARGO_PKG_VERSION"));

    match run(&args) {
        Ok(report) => {
            eprint!("{}", report.render());
            if report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
