//! Job entity - one prompt to send to one model

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::domain::retry::RetryPolicy;
use crate::domain::validation::Validator;

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 1.0;

/// An immutable unit of work: prompt, target model, validator and policy
#[derive(Debug, Clone)]
pub struct Job {
    name: String,
    prompt: String,
    model: String,
    validator: Arc<dyn Validator>,
    system_prompt: Option<String>,
    temperature: f32,
    max_tokens: Option<u32>,
    retry_policy: Option<RetryPolicy>,
    tags: Vec<String>,
    metadata: Map<String, Value>,
    extra_fields: Map<String, Value>,
}

impl Job {
    pub fn new(
        name: impl Into<String>,
        prompt: impl Into<String>,
        model: impl Into<String>,
        validator: Arc<dyn Validator>,
    ) -> Self {
        Self {
            name: name.into(),
            prompt: prompt.into(),
            model: model.into(),
            validator,
            system_prompt: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            retry_policy: None,
            tags: Vec::new(),
            metadata: Map::new(),
            extra_fields: Map::new(),
        }
    }

    // Builder methods
    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Override the provider's default retry policy for this job
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Extra request payload field sent alongside the reserved ones
    pub fn with_extra_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra_fields.insert(key.into(), value);
        self
    }

    pub fn with_extra_fields(mut self, fields: Map<String, Value>) -> Self {
        self.extra_fields = fields;
        self
    }

    // Getters
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn validator(&self) -> &Arc<dyn Validator> {
        &self.validator
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    pub fn retry_policy(&self) -> Option<&RetryPolicy> {
        self.retry_policy.as_ref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        self.tags.iter().any(|tag| tags.contains(tag))
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn extra_fields(&self) -> &Map<String, Value> {
        &self.extra_fields
    }
}
