use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::http_client::{HttpClient, HttpClientTrait, HttpResponse};
use crate::config::{ProviderConfig, DEFAULT_BASE_URL};
use crate::domain::{
    DomainError, GenerateRequest, GenerateResponse, LlmProvider, Metrics, RetryPolicy, TokenUsage,
};

const PROVIDER_NAME: &str = "openrouter";

/// OpenRouter (OpenAI-compatible chat completions) provider
#[derive(Debug)]
pub struct OpenRouterClient<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
    default_policy: RwLock<RetryPolicy>,
}

/// How a single attempt ended when it did not produce a response
enum AttemptFailure {
    /// Worth another attempt; carries the error message
    Transient(String),
    Terminal(DomainError),
}

impl<C: HttpClientTrait> OpenRouterClient<C> {
    pub fn new(client: C, api_key: impl Into<String>) -> Result<Self, DomainError> {
        Self::with_base_url(client, api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(
        client: C,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(DomainError::configuration("OpenRouter API key is required"));
        }

        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(DomainError::configuration("OpenRouter base URL is required"));
        }

        Ok(Self {
            client,
            auth_header: format!("Bearer {}", api_key),
            base_url,
            default_policy: RwLock::new(RetryPolicy::default()),
        })
    }

    pub fn with_default_retry_policy(self, policy: RetryPolicy) -> Self {
        Self {
            default_policy: RwLock::new(policy),
            ..self
        }
    }

    /// Replaces the policy used by later calls that carry no override
    pub async fn set_default_retry_policy(&self, policy: RetryPolicy) {
        *self.default_policy.write().await = policy;
    }

    pub async fn default_retry_policy(&self) -> RetryPolicy {
        self.default_policy.read().await.clone()
    }

    pub fn http_client(&self) -> &C {
        &self.client
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn chat_completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn headers(&self) -> Vec<(&str, &str)> {
        vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ]
    }

    fn build_payload(request: &GenerateRequest) -> Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": request.messages(),
            "temperature": request.temperature,
        });

        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if let Some(payload) = body.as_object_mut() {
            for (key, value) in &request.extra_fields {
                payload.insert(key.clone(), value.clone());
            }
        }

        body
    }

    async fn attempt(
        &self,
        url: &str,
        body: &Value,
        policy: &RetryPolicy,
    ) -> Result<(String, Metrics), AttemptFailure> {
        let started = Instant::now();
        let outcome = tokio::time::timeout(
            policy.timeout(),
            self.client
                .post_json(url, self.headers(), body, policy.timeout()),
        )
        .await;
        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;

        match outcome {
            Err(_) => Err(AttemptFailure::Transient(format!(
                "Request timed out after {:?}",
                policy.timeout()
            ))),
            Ok(Err(e)) if e.is_transient() => Err(AttemptFailure::Transient(e.to_string())),
            Ok(Err(e)) => Err(AttemptFailure::Terminal(DomainError::provider(
                PROVIDER_NAME,
                e.to_string(),
            ))),
            Ok(Ok(response)) if response.is_success() => parse_response(&response, latency_ms)
                .map_err(AttemptFailure::Terminal),
            Ok(Ok(response)) => {
                let error = DomainError::http(response.status, response.body);
                if policy.is_retryable_status(response.status) {
                    Err(AttemptFailure::Transient(error.to_string()))
                } else {
                    Err(AttemptFailure::Terminal(error))
                }
            }
        }
    }
}

impl OpenRouterClient<HttpClient> {
    /// Client over the real reqwest transport
    pub fn from_config(
        config: &ProviderConfig,
        default_policy: RetryPolicy,
    ) -> Result<Self, DomainError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            DomainError::configuration(
                "OpenRouter API key is required (set provider.api_key or OPENROUTER_API_KEY)",
            )
        })?;

        Ok(Self::with_base_url(HttpClient::new(), api_key, &config.base_url)?
            .with_default_retry_policy(default_policy))
    }
}

#[async_trait]
impl<C: HttpClientTrait> LlmProvider for OpenRouterClient<C> {
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, DomainError> {
        request.ensure_no_reserved_fields()?;

        let policy = match request.retry_policy.clone() {
            Some(policy) => policy,
            None => self.default_retry_policy().await,
        };

        let url = self.chat_completions_url();
        let body = Self::build_payload(&request);
        let mut retry_delays = Vec::new();
        let mut attempt: u32 = 0;

        loop {
            debug!(
                model = %request.model,
                attempt = attempt + 1,
                max_attempts = policy.max_attempts(),
                "Sending chat completion request"
            );

            match self.attempt(&url, &body, &policy).await {
                Ok((text, metrics)) => {
                    return Ok(GenerateResponse::new(
                        text,
                        metrics.with_retry_delays(retry_delays),
                    ));
                }
                Err(AttemptFailure::Terminal(error)) => return Err(error),
                Err(AttemptFailure::Transient(message)) => {
                    if !policy.should_retry(attempt) {
                        warn!(
                            model = %request.model,
                            attempts = policy.max_attempts(),
                            error = %message,
                            "Giving up after exhausting retries"
                        );
                        return Err(DomainError::retries_exhausted(
                            policy.max_attempts(),
                            retry_delays,
                            message,
                        ));
                    }

                    let delay = policy.delay_for_attempt(attempt);
                    warn!(
                        model = %request.model,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %message,
                        "Transient failure, retrying"
                    );
                    retry_delays.push(delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
    /// Read field by field; a malformed usage block never rejects the completion
    #[serde(default)]
    usage: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn parse_response(response: &HttpResponse, latency_ms: f64) -> Result<(String, Metrics), DomainError> {
    let completion: ChatCompletion = serde_json::from_str(&response.body)
        .map_err(|e| DomainError::protocol(e.to_string()))?;

    let content = completion
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| DomainError::protocol("no choices in response"))?
        .message
        .content
        .ok_or_else(|| DomainError::protocol("missing choices[0].message.content"))?;

    let usage = completion.usage.unwrap_or(Value::Null);
    let mut metrics = Metrics::new(latency_ms).with_usage(TokenUsage {
        prompt_tokens: token_count(&usage, "prompt_tokens"),
        completion_tokens: token_count(&usage, "completion_tokens"),
        total_tokens: token_count(&usage, "total_tokens"),
    });
    if let Some(cost) = usage_cost(&usage) {
        metrics = metrics.with_cost(cost);
    }

    Ok((content, metrics))
}

fn token_count(usage: &Value, key: &str) -> Option<u32> {
    usage
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok())
}

/// `cost`, unless it is zero and `total_cost` is reported
fn usage_cost(usage: &Value) -> Option<f64> {
    let read = |key: &str| usage.get(key).and_then(Value::as_f64);
    let cost = read("cost");

    cost.filter(|c| *c != 0.0)
        .or_else(|| read("total_cost"))
        .or(cost)
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::super::http_client::mock::{MockHttpClient, MockReply};
    use super::super::http_client::TransportError;
    use super::*;

    fn completion(text: &str) -> MockReply {
        MockReply::json(
            200,
            json!({
                "id": "gen-1",
                "choices": [{"message": {"role": "assistant", "content": text}}],
                "usage": {
                    "prompt_tokens": 12,
                    "completion_tokens": 3,
                    "total_tokens": 15,
                    "cost": 0.0004
                }
            }),
        )
    }

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::builder()
            .max_attempts(max_attempts)
            .initial_delay(Duration::from_secs(1))
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    fn client(mock: MockHttpClient) -> OpenRouterClient<MockHttpClient> {
        OpenRouterClient::with_base_url(mock, "sk-test", "https://example.test/api/v1/")
            .unwrap()
            .with_default_retry_policy(policy(3))
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_success() {
        let provider = client(
            MockHttpClient::new()
                .with_reply(completion("Paris"))
                .with_delay(Duration::from_millis(100)),
        );

        let request = GenerateRequest::new("Capital of France?", "openai/gpt-4o-mini")
            .with_system_prompt("Answer in one word")
            .with_temperature(0.0)
            .with_max_tokens(16)
            .with_extra_field("top_p", json!(0.9));
        let response = provider.generate(request).await.unwrap();

        assert_eq!(response.text, "Paris");
        assert!(response.metrics.latency_ms() >= 100.0);
        assert_eq!(response.metrics.prompt_tokens(), Some(12));
        assert_eq!(response.metrics.total_tokens(), Some(15));
        assert_eq!(response.metrics.cost_usd(), Some(0.0004));
        assert!(response.metrics.retry_delays().is_empty());
        assert_eq!(response.metrics.total_attempts(), 1);

        let mock = &provider.client;
        assert_eq!(mock.urls(), vec!["https://example.test/api/v1/chat/completions"]);
        assert!(mock.headers()[0].contains(&("Authorization".to_string(), "Bearer sk-test".to_string())));

        let body = &mock.bodies()[0];
        assert_eq!(body["model"], "openai/gpt-4o-mini");
        assert_eq!(body["temperature"], 0.0);
        assert_eq!(body["max_tokens"], 16);
        assert_eq!(body["top_p"], 0.9);
        assert_eq!(
            body["messages"],
            json!([
                {"role": "system", "content": "Answer in one word"},
                {"role": "user", "content": "Capital of France?"}
            ])
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_retryable_status_exhausts_attempts() {
        let provider = client(MockHttpClient::new().with_reply(MockReply::status(503, "busy")));

        let error = provider
            .generate(GenerateRequest::new("hi", "m"))
            .await
            .unwrap_err();

        match error {
            DomainError::RetriesExhausted {
                attempts,
                ref retry_delays,
                ref last_error,
            } => {
                assert_eq!(attempts, 3);
                assert_eq!(retry_delays, &[Duration::from_secs(1), Duration::from_secs(2)]);
                assert_eq!(last_error, "HTTP error 503: busy");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(provider.client.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_then_success_records_delays() {
        let provider = client(MockHttpClient::new().with_replies([
            MockReply::status(429, "slow down"),
            MockReply::Error(TransportError::Network("connection reset".into())),
            completion("ok"),
        ]));

        let started = Instant::now();
        let response = provider.generate(GenerateRequest::new("hi", "m")).await.unwrap();

        assert_eq!(response.text, "ok");
        assert_eq!(
            response.metrics.retry_delays(),
            &[Duration::from_secs(1), Duration::from_secs(2)]
        );
        assert_eq!(response.metrics.total_attempts(), 3);
        assert!(started.elapsed() >= Duration::from_secs(3));
        assert_eq!(provider.client.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_retryable_status_fails_immediately() {
        let provider = client(MockHttpClient::new().with_reply(MockReply::status(401, "unauthorized")));

        let error = provider
            .generate(GenerateRequest::new("hi", "m"))
            .await
            .unwrap_err();

        assert!(matches!(error, DomainError::Http { status: 401, .. }));
        assert_eq!(error.to_string(), "HTTP error 401: unauthorized");
        assert_eq!(provider.client.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_success_is_not_retried() {
        let provider = client(MockHttpClient::new().with_reply(MockReply::json(200, json!({"choices": []}))));

        let error = provider
            .generate(GenerateRequest::new("hi", "m"))
            .await
            .unwrap_err();

        assert!(matches!(error, DomainError::Protocol { .. }));
        assert!(error.to_string().starts_with("Invalid API response structure"));
        assert_eq!(provider.client.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_null_content_is_a_protocol_error() {
        let provider = client(MockHttpClient::new().with_reply(MockReply::json(
            200,
            json!({"choices": [{"message": {"content": null}}]}),
        )));

        let error = provider
            .generate(GenerateRequest::new("hi", "m"))
            .await
            .unwrap_err();
        assert!(matches!(error, DomainError::Protocol { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reserved_field_collision_makes_no_call() {
        let provider = client(MockHttpClient::new().with_reply(completion("ok")));

        let request = GenerateRequest::new("hi", "m").with_extra_field("model", json!("other"));
        let error = provider.generate(request).await.unwrap_err();

        assert!(error.is_configuration());
        assert_eq!(provider.client.call_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_transport_times_out_and_retries() {
        let provider = client(MockHttpClient::new().with_reply(MockReply::Hang));
        let request = GenerateRequest::new("hi", "m").with_retry_policy(policy(2));

        let error = provider.generate(request).await.unwrap_err();

        match error {
            DomainError::RetriesExhausted {
                attempts,
                retry_delays,
                last_error,
            } => {
                assert_eq!(attempts, 2);
                assert_eq!(retry_delays, vec![Duration::from_secs(1)]);
                assert!(last_error.contains("timed out"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(provider.client.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_request_is_terminal() {
        let provider = client(
            MockHttpClient::new().with_reply(MockReply::Error(TransportError::Request("bad url".into()))),
        );

        let error = provider
            .generate(GenerateRequest::new("hi", "m"))
            .await
            .unwrap_err();

        assert!(matches!(error, DomainError::Provider { .. }));
        assert_eq!(provider.client.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_policy_is_resolved_per_call() {
        let provider = client(MockHttpClient::new().with_reply(MockReply::status(500, "oops")));

        provider.set_default_retry_policy(policy(1)).await;
        let error = provider
            .generate(GenerateRequest::new("hi", "m"))
            .await
            .unwrap_err();
        assert!(matches!(error, DomainError::RetriesExhausted { attempts: 1, .. }));
        assert_eq!(provider.client.call_count(), 1);

        // A request override wins over the default
        let error = provider
            .generate(GenerateRequest::new("hi", "m").with_retry_policy(policy(2)))
            .await
            .unwrap_err();
        assert!(matches!(error, DomainError::RetriesExhausted { attempts: 2, .. }));
        assert_eq!(provider.client.call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cost_falls_back_to_total_cost() {
        let provider = client(MockHttpClient::new().with_reply(MockReply::json(
            200,
            json!({
                "choices": [{"message": {"content": "ok"}}],
                "usage": {"total_cost": 0.002}
            }),
        )));

        let response = provider.generate(GenerateRequest::new("hi", "m")).await.unwrap();
        assert_eq!(response.metrics.cost_usd(), Some(0.002));
        assert!(response.metrics.total_tokens().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_malformed_usage_keeps_the_completion() {
        let provider = client(MockHttpClient::new().with_reply(MockReply::json(
            200,
            json!({
                "choices": [{"message": {"content": "Paris"}}],
                "usage": {"prompt_tokens": "twelve", "completion_tokens": 3, "cost": "0.001"}
            }),
        )));

        let response = provider.generate(GenerateRequest::new("hi", "m")).await.unwrap();

        assert_eq!(response.text, "Paris");
        assert!(response.metrics.prompt_tokens().is_none());
        assert_eq!(response.metrics.completion_tokens(), Some(3));
        assert!(response.metrics.cost_usd().is_none());
        assert_eq!(provider.client.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_object_usage_is_ignored() {
        let provider = client(MockHttpClient::new().with_reply(MockReply::json(
            200,
            json!({"choices": [{"message": {"content": "ok"}}], "usage": "n/a"}),
        )));

        let response = provider.generate(GenerateRequest::new("hi", "m")).await.unwrap();
        assert_eq!(response.text, "ok");
        assert!(response.metrics.total_tokens().is_none());
    }

    #[test]
    fn test_zero_cost_falls_back_to_total_cost() {
        assert_eq!(usage_cost(&json!({"cost": 0, "total_cost": 0.5})), Some(0.5));
        assert_eq!(usage_cost(&json!({"cost": 0.25, "total_cost": 0.5})), Some(0.25));
        assert_eq!(usage_cost(&json!({"cost": 0.0})), Some(0.0));
        assert_eq!(usage_cost(&json!({})), None);
    }

    #[test]
    fn test_construction_requires_key_and_base_url() {
        assert!(OpenRouterClient::new(MockHttpClient::new(), "").unwrap_err().is_configuration());
        assert!(
            OpenRouterClient::with_base_url(MockHttpClient::new(), "sk", "")
                .unwrap_err()
                .is_configuration()
        );

        let provider = OpenRouterClient::new(MockHttpClient::new(), "sk").unwrap();
        assert_eq!(provider.base_url(), DEFAULT_BASE_URL);
        assert_eq!(provider.provider_name(), "openrouter");
    }
}
