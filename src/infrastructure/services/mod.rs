//! Infrastructure services

mod benchmark_service;

pub use benchmark_service::{BenchmarkRun, BenchmarkSession};
