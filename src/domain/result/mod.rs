//! Result domain - Per-job outcomes and measurements

mod entity;
mod metrics;

pub use entity::JobResult;
pub use metrics::{Metrics, TokenUsage};
