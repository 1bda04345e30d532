use super::super::result::Metrics;

/// Normalized outcome of a successful generate call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateResponse {
    pub text: String,
    pub metrics: Metrics,
}

impl GenerateResponse {
    pub fn new(text: impl Into<String>, metrics: Metrics) -> Self {
        Self {
            text: text.into(),
            metrics,
        }
    }
}
