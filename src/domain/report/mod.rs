//! Report domain - aggregated results of one run

mod entity;
mod record;
mod summary;

pub use entity::{Report, ReportFilter};
pub use record::{JobRecord, MetricsRecord, ReportDocument, ResultRecord};
pub use summary::Summary;
