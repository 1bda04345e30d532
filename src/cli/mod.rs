//! CLI module for PMP LLM Bench
//!
//! Subcommands:
//! - `run`: execute a suite file and emit its report
//! - `reports`: inspect reports saved by earlier runs

pub mod reports;
pub mod run;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// PMP LLM Bench - Run prompt suites against LLM providers
#[derive(Parser)]
#[command(name = "pmp-llm-bench")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a suite of jobs and print or write the report
    Run(run::RunArgs),

    /// List, show and compare saved reports
    Reports(reports::ReportsArgs),
}

/// Loads `.env` and configuration, then installs logging
fn bootstrap() -> anyhow::Result<AppConfig> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;
    if let Err(e) = logging::init_logging(&config.logging) {
        eprintln!("Logging already initialized: {}", e);
    }

    Ok(config)
}
