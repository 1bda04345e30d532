//! Serializable validator definitions used by suite files

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{Contains, ExactMatch, JsonSchema, RegexMatch, Validator};
use crate::domain::DomainError;

fn default_true() -> bool {
    true
}

/// Declarative form of the built-in validators
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValidatorDefinition {
    ExactMatch {
        expected: String,
        #[serde(default = "default_true")]
        case_sensitive: bool,
    },
    Contains {
        substring: String,
        #[serde(default = "default_true")]
        case_sensitive: bool,
    },
    Regex {
        pattern: String,
        #[serde(default)]
        case_insensitive: bool,
    },
    JsonSchema {
        #[serde(default)]
        required_keys: Vec<String>,
    },
}

impl ValidatorDefinition {
    /// Build the validator, failing on invalid patterns
    pub fn build(&self) -> Result<Arc<dyn Validator>, DomainError> {
        let validator: Arc<dyn Validator> = match self {
            ValidatorDefinition::ExactMatch {
                expected,
                case_sensitive,
            } => Arc::new(ExactMatch::new(expected).case_sensitive(*case_sensitive)),
            ValidatorDefinition::Contains {
                substring,
                case_sensitive,
            } => Arc::new(Contains::new(substring).case_sensitive(*case_sensitive)),
            ValidatorDefinition::Regex {
                pattern,
                case_insensitive: false,
            } => Arc::new(RegexMatch::new(pattern)?),
            ValidatorDefinition::Regex {
                pattern,
                case_insensitive: true,
            } => Arc::new(RegexMatch::case_insensitive(pattern)?),
            ValidatorDefinition::JsonSchema { required_keys } => {
                Arc::new(JsonSchema::with_required_keys(required_keys.iter().cloned()))
            }
        };

        Ok(validator)
    }
}
