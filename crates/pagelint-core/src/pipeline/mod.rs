//! Page checking pipeline components.
//!
//! This module contains all the stages of the pipeline:
//! - **scan**: Find episode images and group them by folder
//! - **rename**: Zero-pad page numbers on disk
//! - **decode**: Load images and read thumbnail dimensions
//! - **classify**: Per-folder width vote and limit checks
//! - **resize**: Downsample oversized pages
//! - **persist**: Write resized pages back atomically
//! - **processor**: Orchestrates the full pipeline
//! - **channel**: Bounded channels for backpressure
//! - **codec**: In-memory encoding shared by resize and persist

pub mod channel;
pub mod classify;
pub mod codec;
pub mod decode;
pub mod persist;
pub mod processor;
pub mod rename;
pub mod resize;
pub mod scan;

// Re-exports for convenient access
pub use classify::{ClassifyStats, Classifier};
pub use decode::ImageDecoder;
pub use persist::{PersistStats, Persister};
pub use processor::{PageProcessor, PipelineRun, ProcessOptions};
pub use rename::{RenameOutcome, Renamer};
pub use resize::{ResizeOutcome, ResizeStats, ResizeStep, Resizer};
pub use scan::{ScanSummary, Scanner};
