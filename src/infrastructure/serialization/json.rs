use super::ReportSerializer;
use crate::domain::{DomainError, Report, ReportDocument};

/// Pretty-printed JSON: metadata, summary and results
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl ReportSerializer for JsonSerializer {
    fn serialize(&self, report: &Report) -> Result<String, DomainError> {
        let document = ReportDocument::from_report(report, true);
        serde_json::to_string_pretty(&document)
            .map_err(|e| DomainError::serialization(format!("Failed to write JSON: {}", e)))
    }

    fn file_extension(&self) -> &'static str {
        "json"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{Map, Value};

    use super::*;
    use crate::domain::{Contains, Job, JobResult};

    #[test]
    fn test_json_output_is_a_loadable_document() {
        let job = Job::new("a", "prompt", "model-a", Arc::new(Contains::new("ok")));
        let report = Report::new(vec![JobResult::failed(job, "boom")], Map::new());

        let output = JsonSerializer.serialize(&report).unwrap();
        let value: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["summary"]["execution_errors"], 1);
        assert_eq!(value["results"][0]["execution_error"], "boom");

        let document: ReportDocument = serde_json::from_str(&output).unwrap();
        assert_eq!(document.into_report().unwrap().len(), 1);
    }
}
