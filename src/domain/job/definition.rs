//! Suite definitions - serde form of jobs as written in suite files

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Job;
use crate::domain::retry::RetryPolicy;
use crate::domain::validation::ValidatorDefinition;
use crate::domain::DomainError;

/// Values applied to every job of a suite that does not set them itself
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobDefaults {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryPolicy>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

/// One job as written in a suite file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobDefinition {
    pub name: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub validator: ValidatorDefinition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<RetryPolicy>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
    /// Additional request payload fields
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl JobDefinition {
    pub fn into_job(self, defaults: &JobDefaults) -> Result<Job, DomainError> {
        let model = self
            .model
            .or_else(|| defaults.model.clone())
            .ok_or_else(|| {
                DomainError::configuration(format!(
                    "Job '{}' has no model and the suite defines no default model",
                    self.name
                ))
            })?;

        let validator = self.validator.build()?;

        let mut tags = defaults.tags.clone();
        for tag in self.tags {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }

        let mut job = Job::new(self.name, self.prompt, model, validator)
            .with_tags(tags)
            .with_metadata(self.metadata)
            .with_extra_fields(self.extra);

        if let Some(system_prompt) = self.system_prompt.or_else(|| defaults.system_prompt.clone()) {
            job = job.with_system_prompt(system_prompt);
        }

        if let Some(temperature) = self.temperature.or(defaults.temperature) {
            job = job.with_temperature(temperature);
        }

        if let Some(max_tokens) = self.max_tokens.or(defaults.max_tokens) {
            job = job.with_max_tokens(max_tokens);
        }

        if let Some(policy) = self.retry.or_else(|| defaults.retry.clone()) {
            job = job.with_retry_policy(policy);
        }

        Ok(job)
    }
}

/// A whole suite file: shared defaults plus the jobs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SuiteDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub defaults: JobDefaults,
    #[serde(default)]
    pub jobs: Vec<JobDefinition>,
}

impl SuiteDefinition {
    pub fn into_jobs(self) -> Result<Vec<Job>, DomainError> {
        let defaults = self.defaults;
        self.jobs
            .into_iter()
            .map(|definition| definition.into_job(&defaults))
            .collect()
    }
}
