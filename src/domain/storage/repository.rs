//! Report storage trait definition

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::report::Report;
use crate::domain::DomainError;

/// Index entry for a stored report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredReportInfo {
    pub id: String,
    pub name: String,
    pub path: String,
    pub timestamp: DateTime<Utc>,
}

/// Persistence for finished reports
#[async_trait]
pub trait ReportStorage: Send + Sync + Debug {
    /// Stores a report and returns its identifier
    async fn save(&self, report: &Report, name: &str) -> Result<String, DomainError>;

    /// Loads a report; validators come back as placeholders
    async fn load(&self, id: &str) -> Result<Report, DomainError>;

    /// Lists stored reports in the order they were saved
    async fn list(&self) -> Result<Vec<StoredReportInfo>, DomainError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;

    use crate::domain::report::ReportDocument;

    /// In-memory storage for testing
    #[derive(Debug, Default)]
    pub struct MockReportStorage {
        reports: Mutex<Vec<(StoredReportInfo, ReportDocument)>>,
    }

    impl MockReportStorage {
        pub fn new() -> Self {
            Self::default()
        }
    }

    #[async_trait]
    impl ReportStorage for MockReportStorage {
        async fn save(&self, report: &Report, name: &str) -> Result<String, DomainError> {
            let mut reports = self.reports.lock().unwrap();
            let id = format!("{}_{}", reports.len() + 1, name);
            let info = StoredReportInfo {
                id: id.clone(),
                name: name.to_string(),
                path: format!("memory://{}", id),
                timestamp: Utc::now(),
            };
            reports.push((info, ReportDocument::from_report(report, false)));
            Ok(id)
        }

        async fn load(&self, id: &str) -> Result<Report, DomainError> {
            let document = self
                .reports
                .lock()
                .unwrap()
                .iter()
                .find(|(info, _)| info.id == id)
                .map(|(_, document)| document.clone())
                .ok_or_else(|| DomainError::not_found(format!("Report not found: {}", id)))?;
            document.into_report()
        }

        async fn list(&self) -> Result<Vec<StoredReportInfo>, DomainError> {
            Ok(self
                .reports
                .lock()
                .unwrap()
                .iter()
                .map(|(info, _)| info.clone())
                .collect())
        }
    }
}
