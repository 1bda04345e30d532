//! Summary statistics over a set of results

use serde::{Deserialize, Serialize};

use crate::domain::result::JobResult;

/// Aggregates over a result set; every field is zero for an empty set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub pass_rate: f64,
    pub avg_latency_ms: f64,
    pub min_latency_ms: f64,
    pub max_latency_ms: f64,
    pub p50_latency_ms: f64,
    pub p95_latency_ms: f64,
    pub p99_latency_ms: f64,
    pub total_cost_usd: f64,
    pub total_tokens: u64,
    pub execution_errors: usize,
    pub validation_failures: usize,
}

impl Summary {
    pub fn from_results(results: &[JobResult]) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.passed()).count();
        let execution_errors = results.iter().filter(|r| r.is_execution_error()).count();
        let validation_failures = results.iter().filter(|r| r.is_validation_failure()).count();

        let mut latencies: Vec<f64> = results
            .iter()
            .filter_map(|r| r.metrics())
            .map(|m| m.latency_ms())
            .collect();
        latencies.sort_by(|a, b| a.total_cmp(b));

        let total_cost_usd = results
            .iter()
            .filter_map(|r| r.metrics())
            .filter_map(|m| m.cost_usd())
            .sum();
        let total_tokens = results
            .iter()
            .filter_map(|r| r.metrics())
            .filter_map(|m| m.total_tokens())
            .map(u64::from)
            .sum();

        let avg_latency_ms = if latencies.is_empty() {
            0.0
        } else {
            latencies.iter().sum::<f64>() / latencies.len() as f64
        };

        Self {
            total,
            passed,
            failed: total - passed,
            pass_rate: if total > 0 {
                passed as f64 / total as f64
            } else {
                0.0
            },
            avg_latency_ms,
            min_latency_ms: latencies.first().copied().unwrap_or(0.0),
            max_latency_ms: latencies.last().copied().unwrap_or(0.0),
            p50_latency_ms: percentile(&latencies, 0.50),
            p95_latency_ms: percentile(&latencies, 0.95),
            p99_latency_ms: percentile(&latencies, 0.99),
            total_cost_usd,
            total_tokens,
            execution_errors,
            validation_failures,
        }
    }
}

/// Nearest-rank percentile over already sorted values
fn percentile(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let index = (sorted.len() as f64 * p).floor() as usize;
    sorted[index.min(sorted.len() - 1)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_indexing() {
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        assert_eq!(percentile(&values, 0.5), 6.0);
        assert_eq!(percentile(&values, 0.95), 10.0);
        assert_eq!(percentile(&values, 0.99), 10.0);
        assert_eq!(percentile(&[42.0], 0.5), 42.0);
        assert_eq!(percentile(&[], 0.5), 0.0);
    }

    #[test]
    fn test_empty_summary_is_all_zero() {
        assert_eq!(Summary::from_results(&[]), Summary::default());
    }
}
