//! LLM provider domain models and traits

mod message;
mod provider;
mod request;
mod response;

pub use message::{Message, MessageRole};
pub use provider::LlmProvider;
pub use request::{GenerateRequest, RESERVED_FIELDS};
pub use response::GenerateResponse;

#[cfg(test)]
pub use provider::mock::{MockBehavior, MockLlmProvider};
