//! CLI enum types for the check command.

use clap::ValueEnum;
use pagelint_core::ReportFormat;

/// Supported report formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable report
    Text,
    /// Single JSON object
    Json,
    /// One JSON object per folder, then a summary line
    Jsonl,
}

impl OutputFormat {
    /// Parse the `report.format` config value.
    pub fn from_config(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "text" => Some(Self::Text),
            other => ReportFormat::parse(other).map(Self::from),
        }
    }
}

impl From<ReportFormat> for OutputFormat {
    fn from(format: ReportFormat) -> Self {
        match format {
            ReportFormat::Json => OutputFormat::Json,
            ReportFormat::JsonLines => OutputFormat::Jsonl,
        }
    }
}
