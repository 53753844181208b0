//! Error types for the pagelint pipeline.
//!
//! Errors are organized by stage so every message carries the file path and
//! the operation that failed. Only the root-path errors abort a run; every
//! other variant is reported per item and the pipeline moves on.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for pagelint operations.
#[derive(Error, Debug)]
pub enum PagelintError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    /// Content-type key with no limit profile
    #[error("Unknown content type '{0}' (expected one of: comic, magazine_comic)")]
    UnknownContentType(String),
}

/// Pipeline processing errors, organized by stage.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Directory traversal failed part-way
    #[error("Traversal error under {path}: {message}")]
    Traversal { path: PathBuf, message: String },

    /// On-disk rename failed
    #[error("Rename failed for {from} -> {to}: {message}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        message: String,
    },

    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Re-encoding a raster failed
    #[error("Encode error for {path}: {message}")]
    Encode { path: PathBuf, message: String },

    /// Unsupported image format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// Writing the re-encoded image back to disk failed
    #[error("Persist failed for {path}: {message}")]
    Persist { path: PathBuf, message: String },

    /// Root path does not exist
    #[error("Root path not found: {0}")]
    RootNotFound(PathBuf),

    /// Root path is not a directory
    #[error("Root path is not a directory: {0}")]
    RootNotDirectory(PathBuf),

    /// Root path exists but cannot be listed
    #[error("Root path is not readable: {path}: {message}")]
    RootUnreadable { path: PathBuf, message: String },
}

/// Convenience type alias for pagelint results.
pub type Result<T> = std::result::Result<T, PagelintError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
