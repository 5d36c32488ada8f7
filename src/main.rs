//! relay - an audited SQL gateway for operator-submitted statements.

mod audit;
mod cli;
mod config;
mod db;
mod error;
mod export;
mod gateway;
mod query;

use std::io::Write;
use std::path::PathBuf;

use cli::{Cli, Command};
use config::Config;
use error::{RelayError, Result};
use gateway::{ExecutionRequest, Gateway};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        error!("{}: {}", e.category(), e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Load the target registry; a missing or malformed file is fatal
    let config_path = cli.config_path();
    info!("Loading targets from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let gateway = Gateway::new(config);

    match cli.command {
        Command::Submit {
            target,
            query,
            submitted_by,
            approved_by,
        } => {
            let request = ExecutionRequest {
                statement: query,
                submitted_by,
                approved_by,
                target_name: target,
            };
            validate_request(&request)?;

            let message = gateway.submit(request).await?;
            println!("{message}");
        }

        Command::Report { start, end, output } => {
            let bytes = gateway.report(&start, &end).await?;
            write_report(&bytes, output)?;
        }

        Command::Init => {
            gateway.init_audit_store().await?;
            println!("Audit store initialized.");
        }
    }

    Ok(())
}

/// Caller-side validation: all submission fields must be non-empty.
fn validate_request(request: &ExecutionRequest) -> Result<()> {
    if request.statement.trim().is_empty()
        || request.submitted_by.trim().is_empty()
        || request.approved_by.trim().is_empty()
        || request.target_name.trim().is_empty()
    {
        return Err(RelayError::config(
            "All fields (Query Text, Submitted By, Approved By, Selected DB) are required.",
        ));
    }
    Ok(())
}

/// Writes the report to the given path, stdout for "-", or the default
/// suggested filename when no path is given.
fn write_report(bytes: &[u8], output: Option<PathBuf>) -> Result<()> {
    let path = output.unwrap_or_else(|| PathBuf::from(export::REPORT_FILENAME));

    if path.as_os_str() == "-" {
        std::io::stdout()
            .write_all(bytes)
            .map_err(|e| RelayError::report(format!("failed to write report to stdout: {e}")))?;
        return Ok(());
    }

    std::fs::write(&path, bytes)
        .map_err(|e| RelayError::report(format!("failed to write {}: {e}", path.display())))?;
    println!("Report written to {}", path.display());
    Ok(())
}
