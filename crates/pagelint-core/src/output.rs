//! Machine-readable report output in JSON and JSON Lines.
//!
//! JSON output is a single [`RunReport`] object. JSON Lines output is one
//! tagged record per folder followed by a summary record, so it can be
//! streamed while the run is still going:
//!
//! ```text
//! {"type":"folder","path":"/scans/007_episode",...}
//! {"type":"summary","folders":1,"files":4,...}
//! ```

use serde::{Deserialize, Serialize};
use std::io::{self, Write};

use crate::types::{FolderReport, RunReport, RunStats};

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Single JSON object
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

impl ReportFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// One line of JSON Lines output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReportRecord {
    Folder(FolderReport),
    Summary(RunStats),
}

/// Serializes reports to JSON or JSONL.
pub struct ReportWriter<W: Write> {
    writer: W,
    format: ReportFormat,
    pretty: bool,
    records_written: usize,
}

impl<W: Write> ReportWriter<W> {
    /// Create a new report writer. `pretty` only affects JSON output.
    pub fn new(writer: W, format: ReportFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            records_written: 0,
        }
    }

    pub fn format(&self) -> ReportFormat {
        self.format
    }

    /// Write one folder as soon as it is classified.
    pub fn write_folder(&mut self, folder: &FolderReport) -> io::Result<()> {
        self.write_record(&ReportRecord::Folder(folder.clone()))
    }

    /// Write the closing summary line.
    pub fn write_summary(&mut self, stats: &RunStats) -> io::Result<()> {
        self.write_record(&ReportRecord::Summary(stats.clone()))
    }

    /// Write a complete run.
    ///
    /// JSON gets one object; JSONL gets every folder, then the summary.
    pub fn write_run(&mut self, report: &RunReport) -> io::Result<()> {
        match self.format {
            ReportFormat::Json => {
                if self.pretty {
                    serde_json::to_writer_pretty(&mut self.writer, report)
                        .map_err(io::Error::other)?;
                } else {
                    serde_json::to_writer(&mut self.writer, report).map_err(io::Error::other)?;
                }
                writeln!(self.writer)?;
                self.records_written += 1;
            }
            ReportFormat::JsonLines => {
                for folder in &report.folders {
                    self.write_folder(folder)?;
                }
                self.write_summary(&report.stats)?;
            }
        }
        Ok(())
    }

    fn write_record(&mut self, record: &ReportRecord) -> io::Result<()> {
        // Records are always one per line, whatever the format
        serde_json::to_writer(&mut self.writer, record).map_err(io::Error::other)?;
        writeln!(self.writer)?;
        self.records_written += 1;
        Ok(())
    }

    /// Get the number of records written.
    pub fn records_written(&self) -> usize {
        self.records_written
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Consume the writer and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}
