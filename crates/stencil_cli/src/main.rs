//! Stencil CLI - Main entry point.
//!
//! Exit codes:
//! - 0: Success
//! - 1: General error
//! - 2: Invalid arguments
//! - 3: Compile failure
//! - 4: Render failure

use std::io;
use std::process::ExitCode;

use clap::Parser;
use stencil_templates::TemplateError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

use commands::{Cli, Commands};

/// CI-friendly exit codes
pub struct ExitCodes;

impl ExitCodes {
    pub const SUCCESS: u8 = 0;
    pub const GENERAL_ERROR: u8 = 1;
    pub const INVALID_ARGS: u8 = 2;
    pub const COMPILE_FAILURE: u8 = 3;
    pub const RENDER_FAILURE: u8 = 4;
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Render(args) => commands::render::execute(args),
        Commands::Check(args) => commands::check::execute(args),
    };

    match result {
        Ok(()) => ExitCode::from(ExitCodes::SUCCESS),
        Err(e) => {
            let exit_code = categorize_error(&e);
            eprintln!("Error: {:#}", e);
            ExitCode::from(exit_code)
        }
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = match (verbose, quiet) {
        (true, _) => "stencil=debug",
        (false, true) => "stencil=error",
        (false, false) => "stencil=info",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},warn", level)));

    let log_result = tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .try_init();

    if log_result.is_err() {
        // Logging already initialized, continue
    }
}

/// Categorize error to determine exit code
fn categorize_error(e: &anyhow::Error) -> u8 {
    for cause in e.chain() {
        if let Some(err) = cause.downcast_ref::<TemplateError>() {
            return match err {
                TemplateError::Compile(_) => ExitCodes::COMPILE_FAILURE,
                TemplateError::Render(_) => ExitCodes::RENDER_FAILURE,
                TemplateError::NotFound(_) | TemplateError::InvalidName(_) => ExitCodes::INVALID_ARGS,
                TemplateError::Io(source) if source.kind() == io::ErrorKind::NotFound => {
                    ExitCodes::INVALID_ARGS
                }
                _ => ExitCodes::GENERAL_ERROR,
            };
        }
        if let Some(source) = cause.downcast_ref::<io::Error>() {
            if source.kind() == io::ErrorKind::NotFound {
                return ExitCodes::INVALID_ARGS;
            }
        }
    }
    ExitCodes::GENERAL_ERROR
}
