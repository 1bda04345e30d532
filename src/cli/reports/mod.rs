//! Reports command - inspects reports saved by earlier runs

use std::collections::BTreeMap;
use std::fmt::Write;

use clap::{Args, Subcommand};

use crate::domain::{ReportStorage, Summary};
use crate::infrastructure::serialization::OutputFormat;
use crate::infrastructure::storage::FileReportStorage;

/// Arguments for the reports command
#[derive(Args, Clone, Debug)]
pub struct ReportsArgs {
    #[command(subcommand)]
    pub command: ReportsCommand,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ReportsCommand {
    /// List saved reports, oldest first
    List,

    /// Print a saved report
    Show {
        id: String,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },

    /// Compare models within a saved report
    Compare { id: String },
}

/// Run the reports command
pub async fn run(args: ReportsArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let storage = FileReportStorage::new(&config.storage.results_dir).await?;

    let output = execute(&args.command, &storage).await?;
    println!("{}", output);
    Ok(())
}

async fn execute(command: &ReportsCommand, storage: &dyn ReportStorage) -> anyhow::Result<String> {
    match command {
        ReportsCommand::List => {
            let reports = storage.list().await?;
            if reports.is_empty() {
                return Ok("No saved reports".to_string());
            }

            let mut out = String::new();
            for info in reports {
                writeln!(out, "{}\t{}\t{}", info.id, info.name, info.timestamp.to_rfc3339())?;
            }
            Ok(out.trim_end().to_string())
        }
        ReportsCommand::Show { id, format } => {
            let report = storage.load(id).await?;
            Ok(format.serializer().serialize(&report)?)
        }
        ReportsCommand::Compare { id } => {
            let report = storage.load(id).await?;
            Ok(format_comparison(&report.compare_models())?)
        }
    }
}

fn format_comparison(models: &BTreeMap<String, Summary>) -> Result<String, std::fmt::Error> {
    let width = models.keys().map(String::len).max().unwrap_or(0).max("model".len());

    let mut out = String::new();
    writeln!(
        out,
        "{:<width$}  {:>5}  {:>6}  {:>7}  {:>10}  {:>10}  {:>10}",
        "model", "total", "passed", "rate", "avg ms", "p95 ms", "cost usd"
    )?;
    for (model, summary) in models {
        writeln!(
            out,
            "{:<width$}  {:>5}  {:>6}  {:>6.1}%  {:>10.1}  {:>10.1}  {:>10.4}",
            model,
            summary.total,
            summary.passed,
            summary.pass_rate * 100.0,
            summary.avg_latency_ms,
            summary.p95_latency_ms,
            summary.total_cost_usd
        )?;
    }
    Ok(out.trim_end().to_string())
}
