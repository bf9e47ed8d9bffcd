use std::io;

use serde_json::Value;
use thiserror::Error;

/// Failures of local tool extraction.
///
/// All are terminal for the invocation; the temporary copy of the object is
/// removed before the error reaches the caller.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The event had no download URI.
    #[error("event has no download uri")]
    MissingSource,
    /// Invalid local extraction settings.
    #[error("invalid local extraction config: {0}")]
    InvalidConfig(String),
    /// Fetching the object's bytes failed.
    #[error("download failed: {0}")]
    Download(String),
    /// Creating or writing the temporary file failed.
    #[error("temporary file error: {0}")]
    TempFile(#[from] io::Error),
    /// The metadata tool could not be started or exited unsuccessfully.
    #[error("metadata tool failed: {0}")]
    ToolExecution(String),
    /// The tool ran but its output does not match the format template.
    #[error("unexpected tool output: {0}")]
    ToolOutput(String),
}

/// A callback payload missing part of the required
/// `results.original_meta.original_exif` chain.
///
/// Each variant keeps the value found at the level above the missing one so
/// the log shows what the service actually sent.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CallbackSchemaError {
    #[error("missing results")]
    MissingResults(Value),
    #[error("missing original_meta")]
    MissingOriginalMeta(Value),
    #[error("missing original_exif")]
    MissingOriginalExif(Value),
}

impl CallbackSchemaError {
    /// Dotted path of the first missing level.
    pub fn missing_path(&self) -> &'static str {
        match self {
            CallbackSchemaError::MissingResults(_) => "results",
            CallbackSchemaError::MissingOriginalMeta(_) => "results.original_meta",
            CallbackSchemaError::MissingOriginalExif(_) => "results.original_meta.original_exif",
        }
    }

    /// What was present at the parent level.
    pub fn received(&self) -> &Value {
        match self {
            CallbackSchemaError::MissingResults(v)
            | CallbackSchemaError::MissingOriginalMeta(v)
            | CallbackSchemaError::MissingOriginalExif(v) => v,
        }
    }
}
