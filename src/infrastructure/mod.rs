//! Infrastructure layer - External service implementations

pub mod llm;
pub mod logging;
pub mod runner;
pub mod serialization;
pub mod services;
pub mod storage;
pub mod suite;
