//! Per-job measurements

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Token counts reported by the provider; any of them may be missing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: Option<u32>,
    pub completion_tokens: Option<u32>,
    pub total_tokens: Option<u32>,
}

/// Measurement of one successful generate call.
///
/// `retry_delays` holds the delays actually slept between attempts, in
/// order; it is empty when the first attempt succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct Metrics {
    latency_ms: f64,
    usage: TokenUsage,
    cost_usd: Option<f64>,
    retry_delays: Vec<Duration>,
}

impl Metrics {
    pub fn new(latency_ms: f64) -> Self {
        Self {
            latency_ms,
            usage: TokenUsage::default(),
            cost_usd: None,
            retry_delays: Vec::new(),
        }
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_cost(mut self, cost_usd: f64) -> Self {
        self.cost_usd = Some(cost_usd);
        self
    }

    pub fn with_retry_delays(mut self, retry_delays: Vec<Duration>) -> Self {
        self.retry_delays = retry_delays;
        self
    }

    pub fn latency_ms(&self) -> f64 {
        self.latency_ms
    }

    pub fn usage(&self) -> TokenUsage {
        self.usage
    }

    pub fn prompt_tokens(&self) -> Option<u32> {
        self.usage.prompt_tokens
    }

    pub fn completion_tokens(&self) -> Option<u32> {
        self.usage.completion_tokens
    }

    pub fn total_tokens(&self) -> Option<u32> {
        self.usage.total_tokens
    }

    pub fn cost_usd(&self) -> Option<f64> {
        self.cost_usd
    }

    pub fn retry_delays(&self) -> &[Duration] {
        &self.retry_delays
    }

    /// Attempts made, including the successful one
    pub fn total_attempts(&self) -> usize {
        self.retry_delays.len() + 1
    }
}
