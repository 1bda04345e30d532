//! Benchmark session - accumulates jobs, runs them and optionally stores the report

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;

use crate::domain::{DomainError, Job, Report, ReportStorage};
use crate::infrastructure::runner::{RunCancellation, Runner};

/// Outcome of a session run
#[derive(Debug, Clone)]
pub struct BenchmarkRun {
    pub report: Report,
    /// Identifier under which the report was stored, if a storage is attached
    pub report_id: Option<String>,
}

/// Named batch of jobs executed by one runner
#[derive(Debug)]
pub struct BenchmarkSession {
    name: String,
    runner: Runner,
    jobs: Vec<Job>,
    storage: Option<Arc<dyn ReportStorage>>,
}

impl BenchmarkSession {
    pub fn new(name: impl Into<String>, runner: Runner) -> Self {
        Self {
            name: name.into(),
            runner,
            jobs: Vec::new(),
            storage: None,
        }
    }

    pub fn with_storage(mut self, storage: Arc<dyn ReportStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn jobs(&self) -> &[Job] {
        &self.jobs
    }

    pub fn add_job(&mut self, job: Job) {
        self.jobs.push(job);
    }

    pub fn add_jobs(&mut self, jobs: impl IntoIterator<Item = Job>) {
        self.jobs.extend(jobs);
    }

    pub async fn run(&self, metadata: Map<String, Value>) -> Result<BenchmarkRun, DomainError> {
        self.run_with_cancellation(metadata, &RunCancellation::new())
            .await
    }

    /// Runs all jobs; caller metadata is kept and run bookkeeping added to it
    pub async fn run_with_cancellation(
        &self,
        mut metadata: Map<String, Value>,
        cancellation: &RunCancellation,
    ) -> Result<BenchmarkRun, DomainError> {
        if self.jobs.is_empty() {
            return Ok(BenchmarkRun {
                report: Report::new(Vec::new(), metadata),
                report_id: None,
            });
        }

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(session = %self.name, %run_id, jobs = self.jobs.len(), "Running benchmark session");

        let results = self
            .runner
            .run_with_cancellation(&self.jobs, cancellation)
            .await?;

        metadata.insert("session".into(), Value::from(self.name.clone()));
        metadata.insert("run_id".into(), Value::from(run_id.to_string()));
        metadata.insert("started_at".into(), Value::from(started_at.to_rfc3339()));
        metadata.insert("finished_at".into(), Value::from(Utc::now().to_rfc3339()));
        metadata.insert(
            "max_concurrent".into(),
            Value::from(self.runner.max_concurrent()),
        );
        if cancellation.is_cancelled() {
            metadata.insert("cancelled".into(), Value::Bool(true));
        }

        let report = Report::new(results, metadata);

        let report_id = match &self.storage {
            Some(storage) => Some(storage.save(&report, &self.name).await?),
            None => None,
        };

        Ok(BenchmarkRun { report, report_id })
    }
}
