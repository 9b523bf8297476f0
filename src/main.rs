//! Deckhand CLI - provision a host and deploy a pm2-supervised Node service
//!
//! Usage: deckhand [--config PATH] [--secrets PATH]
//!
//! Exit codes: 0 on full success, 1 on any fatal error at any stage.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use deckhand::{pipeline, DeployConfig, DeployContext, Logger};

/// Deckhand - idempotent provision-and-deploy tool
#[derive(Parser, Debug)]
#[command(name = "deckhand")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the deployment configuration
    #[arg(short, long, default_value = "deckhand.toml")]
    config: PathBuf,

    /// Path to the secrets document
    #[arg(short, long, default_value = "secrets.toml")]
    secrets: PathBuf,

    /// Echo collaborator output into the log
    #[arg(short, long)]
    verbose: bool,

    /// Emit machine-readable stage events for CI
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Config is validated before the logger touches the filesystem, so a
    // bad invocation leaves no side effects at all.
    let (config, warnings) = match DeployConfig::load_with_warnings(&cli.config) {
        Ok(loaded) => loaded,
        Err(err) => {
            eprintln!("deckhand: {err}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = deckhand::config::load_secrets(&cli.secrets) {
        eprintln!("deckhand: {err}");
        return ExitCode::FAILURE;
    }

    let logger = match Logger::init(&config.log_file(), config.log.max_size_bytes) {
        Ok(logger) => logger,
        Err(err) => {
            eprintln!("deckhand: could not open log file: {err}");
            return ExitCode::FAILURE;
        }
    };

    for warning in &warnings {
        logger.warn(&format!(
            "unknown configuration key '{}' in {}",
            warning.key,
            warning.file.display()
        ));
    }

    let verbose = cli.verbose || env_verbose();
    let ctx = DeployContext::new(config, logger, verbose, cli.json);

    match pipeline::run(&ctx) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            ctx.logger
                .error(&format!("stage '{}' failed: {err}", err.stage()));
            ctx.emit_event(err.stage(), "failed");
            ExitCode::FAILURE
        }
    }
}

/// `DECKHAND_VERBOSE=1` (or any value but `0`/`false`) enables verbose echo.
fn env_verbose() -> bool {
    match std::env::var("DECKHAND_VERBOSE") {
        Ok(val) => val != "0" && val.to_lowercase() != "false",
        Err(_) => false,
    }
}
