//! Pagelint Core - quality checks for scanned comic archives.
//!
//! Pagelint walks an archive of episode folders, normalizes page numbering,
//! and checks every folder against the limits of its content type: the
//! dominant page width, per-page and per-thumbnail byte budgets, the folder
//! budget, thumbnail presence and unbroken page numbering. Optionally it
//! downsamples oversized pages and writes them back in place.
//!
//! # Architecture
//!
//! ```text
//! Scan → Rename → Decode → Classify → FolderReport
//!                              └→ Resize → Persist
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use pagelint_core::{Config, PageProcessor, ProcessOptions};
//!
//! #[tokio::main]
//! async fn main() -> pagelint_core::Result<()> {
//!     let processor = PageProcessor::new(Config::load()?)?;
//!     let report = processor.run("./scans".as_ref(), &ProcessOptions::default()).await?;
//!     for (finding, episodes) in report.findings() {
//!         println!("{}: {:?}", finding.description(), episodes);
//!     }
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod error;
pub mod naming;
pub mod output;
pub mod pipeline;
pub mod profile;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, PagelintError, PipelineError, PipelineResult, Result};
pub use naming::Locale;
pub use output::{ReportFormat, ReportRecord, ReportWriter};
pub use pipeline::{PageProcessor, PipelineRun, ProcessOptions};
pub use profile::{ContentType, LimitProfile};
pub use types::{FileReport, Finding, FolderReport, RunReport, RunStats};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
