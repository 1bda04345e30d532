//! Storage infrastructure - Report storage implementations

mod file;

pub use file::FileReportStorage;
