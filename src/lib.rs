//! PMP LLM Bench
//!
//! Runs suites of prompts against an OpenRouter-compatible provider with:
//! - Per-job validators and retry policies
//! - Bounded concurrency and caller-side cancellation
//! - Report summaries, model comparison and file storage

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;
pub use domain::{DomainError, Job, JobResult, Report, RetryPolicy};
pub use infrastructure::runner::{run, RunCancellation, Runner};
