//! Serialized shapes of a report.
//!
//! Validators are not serialized, only their description. Loading a record
//! rebuilds each job with a [`PlaceholderValidator`], so a stored report
//! can be re-summarized but never re-validated.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Report, Summary};
use crate::domain::job::{Job, DEFAULT_TEMPERATURE};
use crate::domain::result::{JobResult, Metrics, TokenUsage};
use crate::domain::validation::{PlaceholderValidator, ValidationDetails};
use crate::domain::DomainError;

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub name: String,
    pub prompt: String,
    pub model: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Human-readable description of the validator used
    pub validator: String,
    /// Set when the validator was itself a placeholder (already reloaded once)
    #[serde(default)]
    pub validator_placeholder: bool,
}

impl From<&Job> for JobRecord {
    fn from(job: &Job) -> Self {
        Self {
            name: job.name().to_string(),
            prompt: job.prompt().to_string(),
            model: job.model().to_string(),
            tags: job.tags().to_vec(),
            system_prompt: job.system_prompt().map(str::to_string),
            temperature: job.temperature(),
            max_tokens: job.max_tokens(),
            metadata: job.metadata().clone(),
            validator: job.validator().describe(),
            validator_placeholder: !job.validator().is_authoritative(),
        }
    }
}

impl JobRecord {
    pub fn into_job(self) -> Job {
        let mut job = Job::new(
            self.name,
            self.prompt,
            self.model,
            Arc::new(PlaceholderValidator::new(self.validator)),
        )
        .with_tags(self.tags)
        .with_temperature(self.temperature)
        .with_metadata(self.metadata);

        if let Some(system_prompt) = self.system_prompt {
            job = job.with_system_prompt(system_prompt);
        }
        if let Some(max_tokens) = self.max_tokens {
            job = job.with_max_tokens(max_tokens);
        }
        job
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsRecord {
    pub latency_ms: f64,
    #[serde(flatten)]
    pub tokens: TokenUsage,
    #[serde(default)]
    pub cost_usd: Option<f64>,
    /// Delays slept between attempts, in seconds
    #[serde(default)]
    pub retry_delays: Vec<f64>,
    /// Derived; ignored when loading
    #[serde(default)]
    pub total_attempts: usize,
}

impl From<&Metrics> for MetricsRecord {
    fn from(metrics: &Metrics) -> Self {
        Self {
            latency_ms: metrics.latency_ms(),
            tokens: metrics.usage(),
            cost_usd: metrics.cost_usd(),
            retry_delays: metrics
                .retry_delays()
                .iter()
                .map(Duration::as_secs_f64)
                .collect(),
            total_attempts: metrics.total_attempts(),
        }
    }
}

impl TryFrom<MetricsRecord> for Metrics {
    type Error = DomainError;

    fn try_from(record: MetricsRecord) -> Result<Self, Self::Error> {
        let retry_delays = record
            .retry_delays
            .iter()
            .map(|secs| {
                Duration::try_from_secs_f64(*secs).map_err(|e| {
                    DomainError::serialization(format!("Invalid retry delay {secs}: {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut metrics = Metrics::new(record.latency_ms)
            .with_usage(record.tokens)
            .with_retry_delays(retry_delays);
        if let Some(cost) = record.cost_usd {
            metrics = metrics.with_cost(cost);
        }
        Ok(metrics)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub job: JobRecord,
    pub response: Option<String>,
    pub passed: bool,
    pub metrics: Option<MetricsRecord>,
    #[serde(default)]
    pub validation_details: ValidationDetails,
    pub execution_error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<&JobResult> for ResultRecord {
    fn from(result: &JobResult) -> Self {
        Self {
            job: JobRecord::from(result.job()),
            response: result.response().map(str::to_string),
            passed: result.passed(),
            metrics: result.metrics().map(MetricsRecord::from),
            validation_details: result.validation_details().clone(),
            execution_error: result.execution_error().map(str::to_string),
            timestamp: result.timestamp(),
        }
    }
}

impl TryFrom<ResultRecord> for JobResult {
    type Error = DomainError;

    fn try_from(record: ResultRecord) -> Result<Self, Self::Error> {
        let metrics = record.metrics.map(Metrics::try_from).transpose()?;
        Ok(JobResult::restore(
            record.job.into_job(),
            record.response,
            record.passed,
            record.validation_details,
            metrics,
            record.execution_error,
            record.timestamp,
        ))
    }
}

/// Top-level document written by serializers and storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDocument {
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Informational; recomputed from results on load
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
    pub results: Vec<ResultRecord>,
}

impl ReportDocument {
    pub fn from_report(report: &Report, include_summary: bool) -> Self {
        Self {
            metadata: report.metadata().clone(),
            summary: include_summary.then(|| report.summary()),
            results: report.results().iter().map(ResultRecord::from).collect(),
        }
    }

    pub fn into_report(self) -> Result<Report, DomainError> {
        let results = self
            .results
            .into_iter()
            .map(JobResult::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Report::new(results, self.metadata))
    }
}
