use async_trait::async_trait;
use std::fmt::Debug;

use super::{GenerateRequest, GenerateResponse};
use crate::domain::DomainError;

/// Trait for LLM providers (OpenRouter and test doubles)
#[async_trait]
pub trait LlmProvider: Send + Sync + Debug {
    /// Perform one logical generate call, retrying transient failures
    /// according to the request's policy or the provider's default
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}


#[cfg(test)]
mod tests {
    use super::mock::*;
    use super::*;

    #[tokio::test]
    async fn test_mock_provider_responds_by_prompt() {
        let provider = MockLlmProvider::new()
            .on_prompt("hello", MockBehavior::respond("Hi there"))
            .on_prompt("boom", MockBehavior::fail("exploded"));

        let response = provider
            .generate(GenerateRequest::new("hello", "m"))
            .await
            .unwrap();
        assert_eq!(response.text, "Hi there");

        let error = provider
            .generate(GenerateRequest::new("boom", "m"))
            .await
            .unwrap_err();
        assert!(error.to_string().contains("exploded"));

        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.provider_name(), "mock");
    }
}
