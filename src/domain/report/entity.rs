//! Report entity - ordered results plus run metadata

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::Summary;
use crate::domain::result::JobResult;

/// Criteria for [`Report::filter`]; unset criteria match everything
#[derive(Debug, Clone, Default)]
pub struct ReportFilter {
    pub model: Option<String>,
    /// Keeps results whose job shares at least one of these tags
    pub tags: Option<Vec<String>>,
    pub passed: Option<bool>,
}

impl ReportFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = Some(tags.into_iter().map(Into::into).collect());
        self
    }

    pub fn passed(mut self, passed: bool) -> Self {
        self.passed = Some(passed);
        self
    }

    fn matches(&self, result: &JobResult) -> bool {
        if let Some(model) = &self.model {
            if result.job().model() != model {
                return false;
            }
        }
        if let Some(tags) = &self.tags {
            if !result.job().has_any_tag(tags) {
                return false;
            }
        }
        if let Some(passed) = self.passed {
            if result.passed() != passed {
                return false;
            }
        }
        true
    }
}

/// Results of one run, in job submission order
#[derive(Debug, Clone, Default)]
pub struct Report {
    results: Vec<JobResult>,
    metadata: Map<String, Value>,
}

impl Report {
    pub fn new(results: Vec<JobResult>, metadata: Map<String, Value>) -> Self {
        Self { results, metadata }
    }

    pub fn results(&self) -> &[JobResult] {
        &self.results
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn into_results(self) -> Vec<JobResult> {
        self.results
    }

    pub fn summary(&self) -> Summary {
        Summary::from_results(&self.results)
    }

    /// Subset of this report keeping order and metadata
    pub fn filter(&self, filter: &ReportFilter) -> Report {
        let results = self
            .results
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        Report::new(results, self.metadata.clone())
    }

    pub fn group_by<F>(&self, key: F) -> BTreeMap<String, Report>
    where
        F: Fn(&JobResult) -> String,
    {
        let mut groups: BTreeMap<String, Vec<JobResult>> = BTreeMap::new();
        for result in &self.results {
            groups.entry(key(result)).or_default().push(result.clone());
        }

        groups
            .into_iter()
            .map(|(k, results)| (k, Report::new(results, self.metadata.clone())))
            .collect()
    }

    /// Summary per target model
    pub fn compare_models(&self) -> BTreeMap<String, Summary> {
        self.group_by(|r| r.job().model().to_string())
            .into_iter()
            .map(|(model, report)| (model, report.summary()))
            .collect()
    }
}
