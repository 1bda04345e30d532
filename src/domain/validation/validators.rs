//! Built-in validators

use regex::{Regex, RegexBuilder};
use serde_json::{json, Value};

use super::{ValidationDetails, Validator};
use crate::domain::DomainError;

fn details(value: Value) -> ValidationDetails {
    match value {
        Value::Object(map) => map,
        _ => ValidationDetails::new(),
    }
}

fn mode(case_sensitive: bool) -> &'static str {
    if case_sensitive {
        "case-sensitive"
    } else {
        "case-insensitive"
    }
}

/// Response must equal the expected string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactMatch {
    expected: String,
    case_sensitive: bool,
}

impl ExactMatch {
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
            case_sensitive: true,
        }
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }
}

impl Validator for ExactMatch {
    fn validate(&self, response: &str) -> (bool, ValidationDetails) {
        let passed = if self.case_sensitive {
            response == self.expected
        } else {
            response.to_lowercase() == self.expected.to_lowercase()
        };

        (
            passed,
            details(json!({
                "expected": self.expected,
                "actual": response,
                "case_sensitive": self.case_sensitive,
            })),
        )
    }

    fn describe(&self) -> String {
        format!("Exact match ({}): {:?}", mode(self.case_sensitive), self.expected)
    }
}

/// Response must contain the substring
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contains {
    substring: String,
    case_sensitive: bool,
}

impl Contains {
    pub fn new(substring: impl Into<String>) -> Self {
        Self {
            substring: substring.into(),
            case_sensitive: true,
        }
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }
}

impl Validator for Contains {
    fn validate(&self, response: &str) -> (bool, ValidationDetails) {
        let passed = if self.case_sensitive {
            response.contains(&self.substring)
        } else {
            response
                .to_lowercase()
                .contains(&self.substring.to_lowercase())
        };

        (
            passed,
            details(json!({
                "substring": self.substring,
                "case_sensitive": self.case_sensitive,
            })),
        )
    }

    fn describe(&self) -> String {
        format!("Contains ({}): {:?}", mode(self.case_sensitive), self.substring)
    }
}

/// Response must contain a match of the pattern anywhere
#[derive(Debug, Clone)]
pub struct RegexMatch {
    pattern: String,
    regex: Regex,
}

impl RegexMatch {
    pub fn new(pattern: impl Into<String>) -> Result<Self, DomainError> {
        Self::build(pattern.into(), false)
    }

    pub fn case_insensitive(pattern: impl Into<String>) -> Result<Self, DomainError> {
        Self::build(pattern.into(), true)
    }

    fn build(pattern: String, case_insensitive: bool) -> Result<Self, DomainError> {
        let regex = RegexBuilder::new(&pattern)
            .case_insensitive(case_insensitive)
            .build()
            .map_err(|e| DomainError::validation(format!("Invalid regex '{}': {}", pattern, e)))?;

        Ok(Self { pattern, regex })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

impl Validator for RegexMatch {
    fn validate(&self, response: &str) -> (bool, ValidationDetails) {
        let matched = self.regex.find(response).map(|m| m.as_str().to_string());

        (
            matched.is_some(),
            details(json!({
                "pattern": self.pattern,
                "matched": matched,
            })),
        )
    }

    fn describe(&self) -> String {
        format!("Regex: {:?}", self.pattern)
    }
}

/// Response must be a JSON object containing the required keys
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonSchema {
    required_keys: Vec<String>,
}

impl JsonSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_required_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required_keys: keys.into_iter().map(Into::into).collect(),
        }
    }
}

impl Validator for JsonSchema {
    fn validate(&self, response: &str) -> (bool, ValidationDetails) {
        let parsed: Value = match serde_json::from_str(response) {
            Ok(value) => value,
            Err(e) => return (false, details(json!({ "error": format!("Invalid JSON: {}", e) }))),
        };

        let Some(object) = parsed.as_object() else {
            return (false, details(json!({ "error": "Response is not a JSON object" })));
        };

        let missing_keys: Vec<&str> = self
            .required_keys
            .iter()
            .filter(|key| !object.contains_key(key.as_str()))
            .map(String::as_str)
            .collect();

        (
            missing_keys.is_empty(),
            details(json!({
                "parsed": parsed,
                "missing_keys": missing_keys,
            })),
        )
    }

    fn describe(&self) -> String {
        if self.required_keys.is_empty() {
            "Valid JSON object".to_string()
        } else {
            format!("Valid JSON with keys: {}", self.required_keys.join(", "))
        }
    }
}

/// Stand-in for a validator that could not be reconstructed from storage.
///
/// Always passes. Results produced with it are informational only; the
/// original validation logic is gone and only its description survives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderValidator {
    description: String,
}

impl PlaceholderValidator {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

impl Validator for PlaceholderValidator {
    fn validate(&self, _response: &str) -> (bool, ValidationDetails) {
        (
            true,
            details(json!({
                "placeholder": true,
                "note": "Original validator could not be reconstructed",
            })),
        )
    }

    fn describe(&self) -> String {
        self.description.clone()
    }

    fn is_authoritative(&self) -> bool {
        false
    }
}
