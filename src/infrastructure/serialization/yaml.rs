use super::ReportSerializer;
use crate::domain::{DomainError, Report, ReportDocument};

/// Same document as the JSON serializer, in YAML
#[derive(Debug, Clone, Copy, Default)]
pub struct YamlSerializer;

impl ReportSerializer for YamlSerializer {
    fn serialize(&self, report: &Report) -> Result<String, DomainError> {
        let document = ReportDocument::from_report(report, true);
        serde_yaml::to_string(&document)
            .map_err(|e| DomainError::serialization(format!("Failed to write YAML: {}", e)))
    }

    fn file_extension(&self) -> &'static str {
        "yaml"
    }
}
