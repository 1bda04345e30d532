use serde::Deserialize;

use crate::domain::RetryPolicy;

/// OpenRouter-compatible API endpoint
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub provider: ProviderConfig,
    /// Default retry policy for jobs that do not set their own
    pub retry: RetryPolicy,
    pub runner: RunnerConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Falls back to `OPENROUTER_API_KEY` when unset
    pub api_key: Option<String>,
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub max_concurrent: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub results_dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self { max_concurrent: 5 }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            results_dir: "results".to_string(),
        }
    }
}

impl ProviderConfig {
    /// Configured key, or the conventional environment variable
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.is_empty())
            .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
            .filter(|key| !key.is_empty())
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false));

        Self::from_builder(builder)
    }

    fn from_builder(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, config::ConfigError> {
        let config = builder
            .add_source(
                config::Environment::with_prefix("BENCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RetryStrategy;
    use std::time::Duration;

    fn from_yaml(yaml: &str) -> AppConfig {
        let builder = config::Config::builder()
            .add_source(config::File::from_str(yaml, config::FileFormat::Yaml));
        AppConfig::from_builder(builder).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.provider.base_url, DEFAULT_BASE_URL);
        assert!(config.provider.api_key.is_none());
        assert_eq!(config.runner.max_concurrent, 5);
        assert_eq!(config.storage.results_dir, "results");
        assert_eq!(config.retry, RetryPolicy::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let config = from_yaml(
            r#"
logging:
  format: json
runner:
  max_concurrent: 2
retry:
  max_attempts: 5
  strategy: fixed_delay
  initial_delay_secs: 0.5
"#,
        );

        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.runner.max_concurrent, 2);
        assert_eq!(config.retry.max_attempts(), 5);
        assert_eq!(config.retry.strategy(), RetryStrategy::FixedDelay);
        assert_eq!(config.retry.delay_for_attempt(3), Duration::from_millis(500));
        assert_eq!(config.storage.results_dir, "results");
    }

    #[test]
    fn test_invalid_retry_section_is_rejected() {
        let builder = config::Config::builder().add_source(config::File::from_str(
            "retry:\n  max_attempts: 0\n",
            config::FileFormat::Yaml,
        ));
        assert!(AppConfig::from_builder(builder).is_err());
    }

    #[test]
    fn test_configured_api_key_wins() {
        let provider = ProviderConfig {
            api_key: Some("sk-configured".into()),
            ..ProviderConfig::default()
        };
        assert_eq!(provider.resolve_api_key().as_deref(), Some("sk-configured"));
    }
}
