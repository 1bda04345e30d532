//! Domain layer - Core entities, traits and errors

pub mod error;
pub mod job;
pub mod llm;
pub mod report;
pub mod result;
pub mod retry;
pub mod storage;
pub mod validation;

pub use error::{DomainError, ProgressError};
pub use job::{Job, JobDefaults, JobDefinition, SuiteDefinition, DEFAULT_TEMPERATURE};
pub use llm::{
    GenerateRequest, GenerateResponse, LlmProvider, Message, MessageRole, RESERVED_FIELDS,
};
pub use report::{JobRecord, MetricsRecord, Report, ReportDocument, ReportFilter, ResultRecord, Summary};
pub use result::{JobResult, Metrics, TokenUsage};
pub use retry::{RetryPolicy, RetryPolicyBuilder, RetryStrategy, DEFAULT_RETRYABLE_STATUS_CODES};
pub use storage::{ReportStorage, StoredReportInfo};
pub use validation::{
    Contains, ExactMatch, JsonSchema, PlaceholderValidator, RegexMatch, ValidationDetails,
    Validator, ValidatorDefinition,
};
