//! Job result entity

use chrono::{DateTime, Utc};

use super::Metrics;
use crate::domain::job::Job;
use crate::domain::validation::ValidationDetails;

/// Outcome of executing one job.
///
/// Either the job produced a response (which then passed or failed
/// validation), or it could not get a response at all and carries an
/// execution error. The two never mix.
#[derive(Debug, Clone)]
pub struct JobResult {
    job: Job,
    response: Option<String>,
    passed: bool,
    validation_details: ValidationDetails,
    metrics: Option<Metrics>,
    execution_error: Option<String>,
    timestamp: DateTime<Utc>,
}

impl JobResult {
    /// Create a result for a job that got a response
    pub fn completed(
        job: Job,
        response: impl Into<String>,
        passed: bool,
        validation_details: ValidationDetails,
        metrics: Metrics,
    ) -> Self {
        Self {
            job,
            response: Some(response.into()),
            passed,
            validation_details,
            metrics: Some(metrics),
            execution_error: None,
            timestamp: Utc::now(),
        }
    }

    /// Create a failed result (execution error)
    pub fn failed(job: Job, error: impl Into<String>) -> Self {
        Self {
            job,
            response: None,
            passed: false,
            validation_details: ValidationDetails::new(),
            metrics: None,
            execution_error: Some(error.into()),
            timestamp: Utc::now(),
        }
    }

    /// Rebuild a result from stored parts
    pub(crate) fn restore(
        job: Job,
        response: Option<String>,
        passed: bool,
        validation_details: ValidationDetails,
        metrics: Option<Metrics>,
        execution_error: Option<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            job,
            response,
            passed,
            validation_details,
            metrics,
            execution_error,
            timestamp,
        }
    }

    // Getters
    pub fn job(&self) -> &Job {
        &self.job
    }

    pub fn response(&self) -> Option<&str> {
        self.response.as_deref()
    }

    pub fn passed(&self) -> bool {
        self.passed
    }

    pub fn validation_details(&self) -> &ValidationDetails {
        &self.validation_details
    }

    pub fn metrics(&self) -> Option<&Metrics> {
        self.metrics.as_ref()
    }

    pub fn execution_error(&self) -> Option<&str> {
        self.execution_error.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Could not get an answer
    pub fn is_execution_error(&self) -> bool {
        self.execution_error.is_some()
    }

    /// Got an answer that did not pass the validator
    pub fn is_validation_failure(&self) -> bool {
        !self.passed && self.execution_error.is_none()
    }
}
