//! Job domain - Units of work and their suite-file definitions

mod definition;
mod entity;

pub use definition::{JobDefaults, JobDefinition, SuiteDefinition};
pub use entity::{Job, DEFAULT_TEMPERATURE};
