use handlebars::Handlebars;
use serde_json::{json, Value};

use super::ReportSerializer;
use crate::domain::{DomainError, JobResult, Report, Summary};

const TEMPLATE: &str = include_str!("report.hbs");

/// Standalone HTML page: summary, per-model comparison and result rows.
///
/// All interpolated values are HTML-escaped by handlebars.
#[derive(Debug)]
pub struct HtmlSerializer {
    hbs: Handlebars<'static>,
}

impl Default for HtmlSerializer {
    fn default() -> Self {
        Self::new()
    }
}

impl HtmlSerializer {
    pub fn new() -> Self {
        let mut hbs = Handlebars::new();
        hbs.set_strict_mode(false);
        Self { hbs }
    }

    fn context(report: &Report) -> Value {
        let summary = report.summary();
        let title = report
            .metadata()
            .get("session")
            .and_then(Value::as_str)
            .map(|name| format!("Benchmark report: {}", name))
            .unwrap_or_else(|| "Benchmark report".to_string());

        let models: Vec<Value> = report
            .compare_models()
            .into_iter()
            .map(|(model, s)| {
                json!({
                    "model": model,
                    "total": s.total,
                    "passed": s.passed,
                    "pass_rate": percent(&s),
                    "avg_latency": format!("{:.1}", s.avg_latency_ms),
                })
            })
            .collect();

        let results: Vec<Value> = report.results().iter().map(result_row).collect();

        json!({
            "title": title,
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "summary": summary,
            "pass_rate": percent(&summary),
            "avg_latency": format!("{:.1}", summary.avg_latency_ms),
            "p95_latency": format!("{:.1}", summary.p95_latency_ms),
            "total_cost": format!("{:.6}", summary.total_cost_usd),
            "models": models,
            "results": results,
        })
    }
}

fn percent(summary: &Summary) -> String {
    format!("{:.1}%", summary.pass_rate * 100.0)
}

fn result_row(result: &JobResult) -> Value {
    let status = if result.is_execution_error() {
        "error"
    } else if result.passed() {
        "pass"
    } else {
        "fail"
    };

    let job = result.job();
    json!({
        "name": job.name(),
        "model": job.model(),
        "tags": job.tags().join(", "),
        "status": status,
        "validator": job.validator().describe(),
        "latency": result.metrics().map(|m| format!("{:.1}", m.latency_ms())).unwrap_or_default(),
        "attempts": result.metrics().map(|m| m.total_attempts().to_string()).unwrap_or_default(),
        "response": result.response().unwrap_or_default(),
        "error": result.execution_error(),
    })
}

impl ReportSerializer for HtmlSerializer {
    fn serialize(&self, report: &Report) -> Result<String, DomainError> {
        self.hbs
            .render_template(TEMPLATE, &Self::context(report))
            .map_err(|e| DomainError::serialization(format!("Failed to render HTML report: {}", e)))
    }

    fn file_extension(&self) -> &'static str {
        "html"
    }
}
