//! Runner - fans jobs out under the admission gate and joins the whole batch

use std::sync::Arc;

use serde_json::Map;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::gate::AdmissionGate;
use crate::domain::{
    DomainError, GenerateRequest, Job, JobResult, LlmProvider, ProgressError, Report,
};

/// Execution error recorded for jobs that had not finished when a run was cancelled
pub const CANCELLED_MESSAGE: &str = "run cancelled";

/// Called once per finished job with `(completed, total, result)`, in completion order
pub type ProgressCallback =
    Arc<dyn Fn(usize, usize, &JobResult) -> Result<(), ProgressError> + Send + Sync>;

/// Caller-side switch that aborts a whole run
#[derive(Debug, Clone)]
pub struct RunCancellation {
    sender: Arc<watch::Sender<bool>>,
}

impl Default for RunCancellation {
    fn default() -> Self {
        Self::new()
    }
}

impl RunCancellation {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }
}

/// Runs jobs against one provider with at most `max_concurrent` in flight
#[derive(Clone)]
pub struct Runner {
    provider: Arc<dyn LlmProvider>,
    gate: AdmissionGate,
    progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("provider", &self.provider)
            .field("gate", &self.gate)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl Runner {
    pub fn new(provider: Arc<dyn LlmProvider>, max_concurrent: usize) -> Result<Self, DomainError> {
        Ok(Self {
            provider,
            gate: AdmissionGate::new(max_concurrent)?,
            progress: None,
        })
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn max_concurrent(&self) -> usize {
        self.gate.capacity()
    }

    pub async fn run(&self, jobs: &[Job]) -> Result<Vec<JobResult>, DomainError> {
        self.run_with_cancellation(jobs, &RunCancellation::new()).await
    }

    /// Runs every job to a terminal state.
    ///
    /// Returns one result per job, in input order. Job failures become
    /// execution errors on their own result; only a failing progress
    /// callback or a panicked task fails the run.
    pub async fn run_with_cancellation(
        &self,
        jobs: &[Job],
        cancellation: &RunCancellation,
    ) -> Result<Vec<JobResult>, DomainError> {
        let total = jobs.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        info!(
            total,
            max_concurrent = self.gate.capacity(),
            provider = self.provider.provider_name(),
            "Starting run"
        );

        let mut tasks = JoinSet::new();
        for (index, job) in jobs.iter().cloned().enumerate() {
            let provider = Arc::clone(&self.provider);
            let gate = self.gate.clone();
            let mut cancelled = cancellation.subscribe();

            tasks.spawn(async move {
                let fallback = job.clone();
                let result = tokio::select! {
                    biased;
                    _ = wait_cancelled(&mut cancelled) => {
                        debug!(job = fallback.name(), "Job cancelled");
                        JobResult::failed(fallback, CANCELLED_MESSAGE)
                    }
                    result = admit_and_execute(provider.as_ref(), &gate, job) => result,
                };
                (index, result)
            });
        }

        let mut slots: Vec<Option<JobResult>> = (0..total).map(|_| None).collect();
        let mut completed = 0;

        while let Some(joined) = tasks.join_next().await {
            let (index, result) = joined
                .map_err(|e| DomainError::internal(format!("Job task failed: {}", e)))?;
            completed += 1;

            if let Some(progress) = &self.progress {
                progress(completed, total, &result).map_err(DomainError::progress)?;
            }

            slots[index] = Some(result);
        }

        let results = slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| DomainError::internal(format!("No result for job {}", index)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let passed = results.iter().filter(|r| r.passed()).count();
        info!(total, passed, "Run finished");

        Ok(results)
    }
}

/// Completes once cancellation is requested; never if the switch goes away unused
async fn wait_cancelled(receiver: &mut watch::Receiver<bool>) {
    if receiver.wait_for(|cancelled| *cancelled).await.is_err() {
        std::future::pending::<()>().await;
    }
}

async fn admit_and_execute(provider: &dyn LlmProvider, gate: &AdmissionGate, job: Job) -> JobResult {
    let admission = match gate.admit().await {
        Ok(admission) => admission,
        Err(e) => return JobResult::failed(job, e.to_string()),
    };

    let result = execute_job(provider, job).await;
    drop(admission);
    result
}

async fn execute_job(provider: &dyn LlmProvider, job: Job) -> JobResult {
    let request = GenerateRequest::from_job(&job);

    match provider.generate(request).await {
        Ok(response) => {
            let (passed, details) = job.validator().validate(&response.text);
            debug!(
                job = job.name(),
                model = job.model(),
                passed,
                latency_ms = response.metrics.latency_ms(),
                "Job completed"
            );
            JobResult::completed(job, response.text, passed, details, response.metrics)
        }
        Err(e) => {
            warn!(job = job.name(), model = job.model(), error = %e, "Job failed");
            JobResult::failed(job, e.to_string())
        }
    }
}

/// Runs `jobs` and wraps the results in a report without metadata
pub async fn run(
    provider: Arc<dyn LlmProvider>,
    jobs: &[Job],
    max_concurrent: usize,
    progress: Option<ProgressCallback>,
) -> Result<Report, DomainError> {
    let mut runner = Runner::new(provider, max_concurrent)?;
    if let Some(progress) = progress {
        runner = runner.with_progress(progress);
    }

    let results = runner.run(jobs).await?;
    Ok(Report::new(results, Map::new()))
}
