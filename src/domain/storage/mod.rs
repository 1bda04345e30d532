//! Storage domain - persistence of finished reports

mod repository;

pub use repository::{ReportStorage, StoredReportInfo};

#[cfg(test)]
pub use repository::mock;
