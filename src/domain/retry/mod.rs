//! Retry domain - Backoff policy for transient provider failures

mod policy;

pub use policy::{RetryPolicy, RetryPolicyBuilder, RetryStrategy, DEFAULT_RETRYABLE_STATUS_CODES};
