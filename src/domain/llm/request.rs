use serde_json::{Map, Value};

use super::Message;
use crate::domain::job::{Job, DEFAULT_TEMPERATURE};
use crate::domain::retry::RetryPolicy;
use crate::domain::DomainError;

/// Payload fields set by the client itself; extra fields may not override them
pub const RESERVED_FIELDS: [&str; 4] = ["model", "messages", "temperature", "max_tokens"];

/// Request for one logical generate call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    pub prompt: String,
    pub model: String,
    pub system_prompt: Option<String>,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
    /// Overrides the provider's default policy when set
    pub retry_policy: Option<RetryPolicy>,
    pub extra_fields: Map<String, Value>,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            system_prompt: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: None,
            retry_policy: None,
            extra_fields: Map::new(),
        }
    }

    pub fn from_job(job: &Job) -> Self {
        Self {
            prompt: job.prompt().to_string(),
            model: job.model().to_string(),
            system_prompt: job.system_prompt().map(str::to_string),
            temperature: job.temperature(),
            max_tokens: job.max_tokens(),
            retry_policy: job.retry_policy().cloned(),
            extra_fields: job.extra_fields().clone(),
        }
    }

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

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    pub fn with_extra_field(mut self, key: impl Into<String>, value: Value) -> Self {
        self.extra_fields.insert(key.into(), value);
        self
    }

    /// Chat messages: optional system prompt followed by the user prompt
    pub fn messages(&self) -> Vec<Message> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = self.system_prompt.as_deref().filter(|s| !s.is_empty()) {
            messages.push(Message::system(system));
        }
        messages.push(Message::user(&self.prompt));
        messages
    }

    /// Fails with a configuration error when an extra field shadows a reserved one
    pub fn ensure_no_reserved_fields(&self) -> Result<(), DomainError> {
        let mut conflicts: Vec<&str> = RESERVED_FIELDS
            .iter()
            .copied()
            .filter(|field| self.extra_fields.contains_key(*field))
            .collect();

        if conflicts.is_empty() {
            return Ok(());
        }

        conflicts.sort_unstable();
        Err(DomainError::configuration(format!(
            "Cannot override reserved payload fields: {}",
            conflicts.join(", ")
        )))
    }
}
