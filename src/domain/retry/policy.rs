//! Retry policy entity and backoff computation

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Status codes retried when no explicit set is configured
pub const DEFAULT_RETRYABLE_STATUS_CODES: [u16; 5] = [429, 500, 502, 503, 504];

/// How the delay between attempts grows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryStrategy {
    /// `initial_delay * base^attempt`, capped at `max_delay`
    #[default]
    ExponentialBackoff,
    /// Always `initial_delay`
    FixedDelay,
}

impl std::fmt::Display for RetryStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryStrategy::ExponentialBackoff => write!(f, "exponential_backoff"),
            RetryStrategy::FixedDelay => write!(f, "fixed_delay"),
        }
    }
}

/// Immutable retry configuration.
///
/// Only constructible through [`RetryPolicyBuilder::build`], so
/// `max_attempts >= 1` and `exponential_base >= 1` always hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RetryPolicyBuilder", into = "RetryPolicyBuilder")]
pub struct RetryPolicy {
    max_attempts: u32,
    strategy: RetryStrategy,
    initial_delay: Duration,
    max_delay: Duration,
    exponential_base: f64,
    retryable_status_codes: Vec<u16>,
    timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            strategy: RetryStrategy::ExponentialBackoff,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            exponential_base: 2.0,
            retryable_status_codes: DEFAULT_RETRYABLE_STATUS_CODES.to_vec(),
            timeout: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// Delay to sleep after the failed attempt with the given 0-based index
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self.strategy {
            RetryStrategy::ExponentialBackoff if self.initial_delay.is_zero() => Duration::ZERO,
            RetryStrategy::ExponentialBackoff => {
                let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
                let secs = self.initial_delay.as_secs_f64() * self.exponential_base.powi(exponent);

                if !secs.is_finite() || secs >= self.max_delay.as_secs_f64() {
                    self.max_delay
                } else {
                    Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(self.max_delay)
                }
            }
            RetryStrategy::FixedDelay => self.initial_delay.min(self.max_delay),
        }
    }

    /// Whether another attempt is allowed after the attempt with this index failed
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt.saturating_add(1) < self.max_attempts
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retryable_status_codes.contains(&status)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn strategy(&self) -> RetryStrategy {
        self.strategy
    }

    pub fn initial_delay(&self) -> Duration {
        self.initial_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn exponential_base(&self) -> f64 {
        self.exponential_base
    }

    pub fn retryable_status_codes(&self) -> &[u16] {
        &self.retryable_status_codes
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Builder and serde form of [`RetryPolicy`]; durations are in seconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicyBuilder {
    pub max_attempts: u32,
    pub strategy: RetryStrategy,
    pub initial_delay_secs: f64,
    pub max_delay_secs: f64,
    pub exponential_base: f64,
    pub retryable_status_codes: Vec<u16>,
    pub timeout_secs: f64,
}

impl Default for RetryPolicyBuilder {
    fn default() -> Self {
        RetryPolicy::default().into()
    }
}

impl RetryPolicyBuilder {
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn strategy(mut self, strategy: RetryStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay_secs = delay.as_secs_f64();
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay_secs = delay.as_secs_f64();
        self
    }

    pub fn exponential_base(mut self, base: f64) -> Self {
        self.exponential_base = base;
        self
    }

    pub fn retryable_status_codes(mut self, codes: impl IntoIterator<Item = u16>) -> Self {
        self.retryable_status_codes = codes.into_iter().collect();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs_f64();
        self
    }

    pub fn build(self) -> Result<RetryPolicy, DomainError> {
        if self.max_attempts == 0 {
            return Err(DomainError::configuration(
                "Retry policy max_attempts must be at least 1",
            ));
        }

        if !self.exponential_base.is_finite() || self.exponential_base < 1.0 {
            return Err(DomainError::configuration(format!(
                "Retry policy exponential_base must be a finite number >= 1, got {}",
                self.exponential_base
            )));
        }

        let initial_delay = non_negative_secs("initial_delay_secs", self.initial_delay_secs)?;
        let max_delay = non_negative_secs("max_delay_secs", self.max_delay_secs)?;
        let timeout = non_negative_secs("timeout_secs", self.timeout_secs)?;

        if timeout.is_zero() {
            return Err(DomainError::configuration(
                "Retry policy timeout_secs must be greater than 0",
            ));
        }

        let mut retryable_status_codes = self.retryable_status_codes;
        retryable_status_codes.sort_unstable();
        retryable_status_codes.dedup();

        Ok(RetryPolicy {
            max_attempts: self.max_attempts,
            strategy: self.strategy,
            initial_delay,
            max_delay,
            exponential_base: self.exponential_base,
            retryable_status_codes,
            timeout,
        })
    }
}

fn non_negative_secs(field: &str, secs: f64) -> Result<Duration, DomainError> {
    if !secs.is_finite() || secs < 0.0 {
        return Err(DomainError::configuration(format!(
            "Retry policy {} must be a finite, non-negative number of seconds, got {}",
            field, secs
        )));
    }

    Duration::try_from_secs_f64(secs).map_err(|e| {
        DomainError::configuration(format!("Retry policy {} is out of range: {}", field, e))
    })
}

impl From<RetryPolicy> for RetryPolicyBuilder {
    fn from(policy: RetryPolicy) -> Self {
        Self {
            max_attempts: policy.max_attempts,
            strategy: policy.strategy,
            initial_delay_secs: policy.initial_delay.as_secs_f64(),
            max_delay_secs: policy.max_delay.as_secs_f64(),
            exponential_base: policy.exponential_base,
            retryable_status_codes: policy.retryable_status_codes,
            timeout_secs: policy.timeout.as_secs_f64(),
        }
    }
}

impl TryFrom<RetryPolicyBuilder> for RetryPolicy {
    type Error = DomainError;

    fn try_from(builder: RetryPolicyBuilder) -> Result<Self, Self::Error> {
        builder.build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exponential(initial: u64, max: u64, base: f64) -> RetryPolicy {
        RetryPolicy::builder()
            .initial_delay(Duration::from_secs(initial))
            .max_delay(Duration::from_secs(max))
            .exponential_base(base)
            .build()
            .unwrap()
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.strategy(), RetryStrategy::ExponentialBackoff);
        assert_eq!(policy.initial_delay(), Duration::from_secs(1));
        assert_eq!(policy.max_delay(), Duration::from_secs(60));
        assert_eq!(policy.exponential_base(), 2.0);
        assert_eq!(policy.retryable_status_codes(), &[429, 500, 502, 503, 504]);
        assert_eq!(policy.timeout(), Duration::from_secs(60));
    }

    #[test]
    fn test_exponential_delays() {
        let policy = exponential(1, 60, 2.0);
        assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_secs(4));
        assert_eq!(policy.delay_for_attempt(5), Duration::from_secs(32));
    }

    #[test]
    fn test_exponential_delay_is_capped() {
        let policy = exponential(1, 10, 2.0);
        assert_eq!(policy.delay_for_attempt(4), Duration::from_secs(10));
        assert_eq!(policy.delay_for_attempt(1000), Duration::from_secs(10));
        assert_eq!(policy.delay_for_attempt(u32::MAX), Duration::from_secs(10));
    }

    #[test]
    fn test_exponential_delays_never_decrease_and_never_exceed_cap() {
        for base in [1.0, 1.5, 2.0, 3.0, 10.0] {
            let policy = exponential(1, 45, base);
            let mut previous = Duration::ZERO;
            for attempt in 0..64 {
                let delay = policy.delay_for_attempt(attempt);
                assert!(delay >= previous, "base {} attempt {}", base, attempt);
                assert!(delay <= policy.max_delay());
                previous = delay;
            }
        }
    }

    #[test]
    fn test_fixed_delay_is_constant() {
        let policy = RetryPolicy::builder()
            .strategy(RetryStrategy::FixedDelay)
            .initial_delay(Duration::from_millis(2500))
            .build()
            .unwrap();

        for attempt in 0..10 {
            assert_eq!(policy.delay_for_attempt(attempt), Duration::from_millis(2500));
        }
    }

    #[test]
    fn test_fixed_delay_is_clamped_to_max_delay() {
        let policy = RetryPolicy::builder()
            .strategy(RetryStrategy::FixedDelay)
            .initial_delay(Duration::from_secs(30))
            .max_delay(Duration::from_secs(5))
            .build()
            .unwrap();

        assert_eq!(policy.delay_for_attempt(0), Duration::from_secs(5));
    }

    #[test]
    fn test_should_retry_respects_max_attempts() {
        let policy = RetryPolicy::builder().max_attempts(3).build().unwrap();
        assert!(policy.should_retry(0));
        assert!(policy.should_retry(1));
        assert!(!policy.should_retry(2));

        let single = RetryPolicy::builder().max_attempts(1).build().unwrap();
        assert!(!single.should_retry(0));
    }

    #[test]
    fn test_retryable_status() {
        let policy = RetryPolicy::builder()
            .retryable_status_codes([503, 429, 503])
            .build()
            .unwrap();

        assert!(policy.is_retryable_status(429));
        assert!(policy.is_retryable_status(503));
        assert!(!policy.is_retryable_status(500));
        assert_eq!(policy.retryable_status_codes(), &[429, 503]);
    }

    #[test]
    fn test_builder_rejects_zero_attempts() {
        let result = RetryPolicy::builder().max_attempts(0).build();
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[test]
    fn test_builder_rejects_shrinking_base() {
        let result = RetryPolicy::builder().exponential_base(0.5).build();
        assert!(result.is_err());

        let result = RetryPolicy::builder().exponential_base(f64::NAN).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_rejects_negative_delay_and_zero_timeout() {
        let mut builder = RetryPolicy::builder();
        builder.initial_delay_secs = -1.0;
        assert!(builder.build().is_err());

        let result = RetryPolicy::builder().timeout(Duration::ZERO).build();
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let policy: RetryPolicy =
            serde_json::from_str(r#"{"max_attempts": 5, "strategy": "fixed_delay", "initial_delay_secs": 0.5}"#)
                .unwrap();

        assert_eq!(policy.max_attempts(), 5);
        assert_eq!(policy.strategy(), RetryStrategy::FixedDelay);
        assert_eq!(policy.initial_delay(), Duration::from_millis(500));
        assert_eq!(policy.max_delay(), Duration::from_secs(60));
    }

    #[test]
    fn test_deserialize_rejects_invalid_policy() {
        let result: Result<RetryPolicy, _> = serde_json::from_str(r#"{"max_attempts": 0}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_serialization_roundtrip_keeps_policy() {
        let policy = exponential(2, 30, 3.0);
        let json = serde_json::to_string(&policy).unwrap();
        let restored: RetryPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, policy);
    }
}
