//! Report serializers

mod html;
mod json;
mod yaml;

pub use html::HtmlSerializer;
pub use json::JsonSerializer;
pub use yaml::YamlSerializer;

use crate::domain::{DomainError, Report};

/// Renders a report into a text format
pub trait ReportSerializer: Send + Sync {
    fn serialize(&self, report: &Report) -> Result<String, DomainError>;

    fn file_extension(&self) -> &'static str;
}

/// Output format selectable from the command line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Html,
}

impl OutputFormat {
    pub fn serializer(self) -> Box<dyn ReportSerializer> {
        match self {
            OutputFormat::Json => Box::new(JsonSerializer),
            OutputFormat::Yaml => Box::new(YamlSerializer),
            OutputFormat::Html => Box::new(HtmlSerializer::new()),
        }
    }
}
