//! Suite file loading (YAML or JSON)

use std::path::Path;

use tracing::debug;

use crate::domain::{DomainError, Job, SuiteDefinition};

enum SuiteFormat {
    Yaml,
    Json,
}

impl SuiteFormat {
    fn from_path(path: &Path) -> Result<Self, DomainError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("yaml") | Some("yml") => Ok(Self::Yaml),
            Some("json") => Ok(Self::Json),
            _ => Err(DomainError::configuration(format!(
                "Unsupported suite file '{}': expected .yaml, .yml or .json",
                path.display()
            ))),
        }
    }
}

/// Parses a suite file without building validators
pub async fn load_suite_definition(path: impl AsRef<Path>) -> Result<SuiteDefinition, DomainError> {
    let path = path.as_ref();
    let format = SuiteFormat::from_path(path)?;

    let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            DomainError::not_found(format!("Suite file not found: {}", path.display()))
        } else {
            DomainError::storage(format!("{}: {}", path.display(), e))
        }
    })?;

    let suite: SuiteDefinition = match format {
        SuiteFormat::Yaml => serde_yaml::from_str(&contents).map_err(|e| {
            DomainError::configuration(format!("Invalid suite {}: {}", path.display(), e))
        })?,
        SuiteFormat::Json => serde_json::from_str(&contents).map_err(|e| {
            DomainError::configuration(format!("Invalid suite {}: {}", path.display(), e))
        })?,
    };

    debug!(path = %path.display(), jobs = suite.jobs.len(), "Suite parsed");
    Ok(suite)
}

/// Loads a suite file into runnable jobs
pub async fn load_suite(path: impl AsRef<Path>) -> Result<Vec<Job>, DomainError> {
    load_suite_definition(path).await?.into_jobs()
}
