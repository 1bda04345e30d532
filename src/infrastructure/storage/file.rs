//! File-backed report storage
//!
//! Layout under the base directory:
//! - `reports/<id>.json`: one report document per saved run
//! - `metadata.json`: index of saved reports, in save order

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{DomainError, Report, ReportDocument, ReportStorage, StoredReportInfo};

const REPORTS_DIR: &str = "reports";
const INDEX_FILE: &str = "metadata.json";

/// Stores reports as JSON files; writes go through a temp file and a rename
#[derive(Debug)]
pub struct FileReportStorage {
    base_dir: PathBuf,
    reports_dir: PathBuf,
    index_path: PathBuf,
    /// Serializes saves so id allocation and index updates do not interleave
    write_lock: Mutex<()>,
}

impl FileReportStorage {
    pub async fn new(base_dir: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let base_dir = base_dir.into();
        let reports_dir = base_dir.join(REPORTS_DIR);
        let index_path = base_dir.join(INDEX_FILE);

        tokio::fs::create_dir_all(&reports_dir)
            .await
            .map_err(|e| io_error(&reports_dir, e))?;

        Ok(Self {
            base_dir,
            reports_dir,
            index_path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn report_path(&self, id: &str) -> PathBuf {
        self.reports_dir.join(format!("{}.json", id))
    }

    async fn read_index(&self) -> Result<Vec<StoredReportInfo>, DomainError> {
        match tokio::fs::read_to_string(&self.index_path).await {
            Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
                DomainError::serialization(format!(
                    "Corrupt report index {}: {}",
                    self.index_path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(io_error(&self.index_path, e)),
        }
    }

    async fn allocate_id(&self, name: &str) -> Result<String, DomainError> {
        let base = format!("{}_{}", Utc::now().format("%Y-%m-%d_%H-%M-%S"), sanitize_name(name));
        let mut candidate = base.clone();
        let mut suffix = 2;

        while tokio::fs::try_exists(self.report_path(&candidate))
            .await
            .map_err(|e| io_error(&self.reports_dir, e))?
        {
            candidate = format!("{}_{}", base, suffix);
            suffix += 1;
        }

        Ok(candidate)
    }
}

#[async_trait]
impl ReportStorage for FileReportStorage {
    async fn save(&self, report: &Report, name: &str) -> Result<String, DomainError> {
        let _guard = self.write_lock.lock().await;

        let id = self.allocate_id(name).await?;
        let path = self.report_path(&id);

        let document = ReportDocument::from_report(report, true);
        let contents = serde_json::to_string_pretty(&document)
            .map_err(|e| DomainError::serialization(format!("Failed to encode report: {}", e)))?;
        write_atomic(&path, contents.as_bytes()).await?;

        let mut index = self.read_index().await?;
        index.push(StoredReportInfo {
            id: id.clone(),
            name: name.to_string(),
            path: path.display().to_string(),
            timestamp: Utc::now(),
        });
        let encoded = serde_json::to_string_pretty(&index)
            .map_err(|e| DomainError::serialization(format!("Failed to encode index: {}", e)))?;
        write_atomic(&self.index_path, encoded.as_bytes()).await?;

        info!(id = %id, path = %path.display(), results = report.len(), "Report saved");
        Ok(id)
    }

    async fn load(&self, id: &str) -> Result<Report, DomainError> {
        if !is_valid_id(id) {
            return Err(DomainError::not_found(format!("Report not found: {}", id)));
        }

        let path = self.report_path(id);
        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(DomainError::not_found(format!("Report not found: {}", id)));
            }
            Err(e) => return Err(io_error(&path, e)),
        };

        debug!(id, path = %path.display(), "Loading report");
        let document: ReportDocument = serde_json::from_str(&contents).map_err(|e| {
            DomainError::serialization(format!("Invalid report {}: {}", path.display(), e))
        })?;
        document.into_report()
    }

    async fn list(&self) -> Result<Vec<StoredReportInfo>, DomainError> {
        self.read_index().await
    }
}

/// Keeps `[A-Za-z0-9_-]`, replacing everything else with `_`
fn sanitize_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "report".to_string()
    } else {
        sanitized
    }
}

fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

async fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), DomainError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

    tokio::fs::write(&tmp_path, contents)
        .await
        .map_err(|e| io_error(&tmp_path, e))?;

    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(io_error(path, e));
    }

    Ok(())
}

fn io_error(path: &Path, e: std::io::Error) -> DomainError {
    DomainError::storage(format!("{}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{Map, Value};

    use super::*;
    use crate::domain::{Contains, Job, JobResult, Metrics};

    fn report() -> Report {
        let job = Job::new("capital", "Capital of France?", "model-a", Arc::new(Contains::new("Paris")));
        let (passed, details) = job.validator().validate("Paris");
        let result = JobResult::completed(job, "Paris", passed, details, Metrics::new(80.0));
        let mut metadata = Map::new();
        metadata.insert("suite".into(), Value::from("geo"));
        Report::new(vec![result], metadata)
    }

    #[tokio::test]
    async fn test_save_load_and_list() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileReportStorage::new(dir.path()).await.unwrap();

        let id = storage.save(&report(), "geo run").await.unwrap();
        assert!(id.ends_with("_geo_run"));
        assert!(dir.path().join("reports").join(format!("{id}.json")).exists());
        assert!(dir.path().join("metadata.json").exists());

        let loaded = storage.load(&id).await.unwrap();
        assert_eq!(loaded.metadata()["suite"], "geo");
        assert_eq!(loaded.summary(), report().summary());
        assert!(!loaded.results()[0].job().validator().is_authoritative());

        let listed = storage.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
        assert_eq!(listed[0].name, "geo run");
    }

    #[tokio::test]
    async fn test_same_second_saves_get_distinct_ids() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileReportStorage::new(dir.path()).await.unwrap();

        let first = storage.save(&report(), "dup").await.unwrap();
        let second = storage.save(&report(), "dup").await.unwrap();

        assert_ne!(first, second);
        let ids: Vec<String> = storage.list().await.unwrap().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[tokio::test]
    async fn test_missing_report_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileReportStorage::new(dir.path()).await.unwrap();

        assert!(matches!(
            storage.load("2024-01-01_00-00-00_nope").await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(matches!(
            storage.load("../metadata").await,
            Err(DomainError::NotFound { .. })
        ));
        assert!(storage.list().await.unwrap().is_empty());
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("nightly run/v2"), "nightly_run_v2");
        assert_eq!(sanitize_name("ok-name_1"), "ok-name_1");
        assert_eq!(sanitize_name(""), "report");
    }
}
