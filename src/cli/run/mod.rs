//! Run command - executes a suite and emits its report

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Args;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::domain::{JobResult, ProgressError, SuiteDefinition};
use crate::infrastructure::llm::OpenRouterClient;
use crate::infrastructure::runner::{ProgressCallback, RunCancellation, Runner};
use crate::infrastructure::serialization::OutputFormat;
use crate::infrastructure::services::BenchmarkSession;
use crate::infrastructure::storage::FileReportStorage;
use crate::infrastructure::suite::load_suite_definition;

const DEFAULT_SESSION_NAME: &str = "benchmark";

/// Arguments for the run command
#[derive(Args, Clone, Debug)]
pub struct RunArgs {
    /// Suite file (.yaml, .yml or .json)
    pub suite: PathBuf,

    /// Maximum concurrent requests (overrides config)
    #[arg(short, long)]
    pub concurrency: Option<usize>,

    /// Session name used for the stored report (defaults to the suite name)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Write the report to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Do not save the report under the results directory
    #[arg(long)]
    pub no_save: bool,

    /// Extra report metadata as key=value (repeatable)
    #[arg(long = "meta", value_parser = parse_key_value)]
    pub meta: Vec<(String, String)>,
}

/// Run the suite
pub async fn run(args: RunArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    execute(args, &config).await
}

async fn execute(args: RunArgs, config: &AppConfig) -> anyhow::Result<()> {
    let suite = load_suite_definition(&args.suite).await?;
    let name = session_name(args.name.as_deref(), &suite, &args.suite);
    let jobs = suite.into_jobs()?;

    let provider = OpenRouterClient::from_config(&config.provider, config.retry.clone())?;
    let concurrency = args.concurrency.unwrap_or(config.runner.max_concurrent);
    let runner = Runner::new(Arc::new(provider), concurrency)?.with_progress(progress_logger());

    let mut session = BenchmarkSession::new(name, runner);
    session.add_jobs(jobs);

    if !args.no_save {
        let storage = FileReportStorage::new(&config.storage.results_dir).await?;
        session = session.with_storage(Arc::new(storage));
    }

    let cancellation = RunCancellation::new();
    let ctrl_c = {
        let cancellation = cancellation.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupt received, cancelling run");
                cancellation.cancel();
            }
        })
    };

    let metadata = build_metadata(&args.suite, &args.meta);
    let outcome = session.run_with_cancellation(metadata, &cancellation).await;
    ctrl_c.abort();
    let outcome = outcome?;

    let summary = outcome.report.summary();
    info!(
        total = summary.total,
        passed = summary.passed,
        failed = summary.failed,
        execution_errors = summary.execution_errors,
        "Run complete"
    );
    if let Some(id) = &outcome.report_id {
        info!(id = %id, "Report stored");
    }

    let rendered = args.format.serializer().serialize(&outcome.report)?;
    match &args.output {
        Some(path) => {
            tokio::fs::write(path, rendered)
                .await
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!(path = %path.display(), "Report written");
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

fn progress_logger() -> ProgressCallback {
    Arc::new(
        |completed: usize, total: usize, result: &JobResult| -> Result<(), ProgressError> {
            let status = if result.passed() {
                "pass"
            } else if result.is_execution_error() {
                "error"
            } else {
                "fail"
            };
            info!(
                completed,
                total,
                job = result.job().name(),
                model = result.job().model(),
                status,
                "Job finished"
            );
            Ok(())
        },
    )
}

fn session_name(explicit: Option<&str>, suite: &SuiteDefinition, path: &Path) -> String {
    explicit
        .map(str::to_string)
        .or_else(|| suite.name.clone())
        .or_else(|| {
            path.file_stem()
                .and_then(|s| s.to_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| DEFAULT_SESSION_NAME.to_string())
}

fn build_metadata(suite: &Path, meta: &[(String, String)]) -> Map<String, Value> {
    let mut metadata = Map::new();
    metadata.insert("suite_file".into(), Value::from(suite.display().to_string()));
    for (key, value) in meta {
        metadata.insert(key.clone(), Value::from(value.clone()));
    }
    metadata
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))?;
    if key.is_empty() {
        return Err(format!("empty key in '{}'", raw));
    }
    Ok((key.to_string(), value.to_string()))
}
