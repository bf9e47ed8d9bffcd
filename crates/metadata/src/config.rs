use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ExtractionError;

/// Program run when no other is configured.
pub const DEFAULT_TOOL_PROGRAM: &str = "identify";

/// Settings for local tool extraction.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LocalExtractionConfig {
    /// Metadata reader invoked as `<tool_program> -format <template> <file>`.
    pub tool_program: String,
    /// Where temporary copies of objects are written. `None` uses the system
    /// temp dir.
    pub temp_dir: Option<PathBuf>,
    /// Timeout for downloading an object, in seconds.
    pub download_timeout_secs: u64,
    /// How long the tool may run before it is killed, in seconds.
    pub tool_timeout_secs: u64,
}

impl Default for LocalExtractionConfig {
    fn default() -> Self {
        Self {
            tool_program: DEFAULT_TOOL_PROGRAM.into(),
            temp_dir: None,
            download_timeout_secs: 60,
            tool_timeout_secs: 30,
        }
    }
}

impl LocalExtractionConfig {
    pub fn validate(&self) -> Result<(), ExtractionError> {
        if self.tool_program.trim().is_empty() {
            return Err(ExtractionError::InvalidConfig(
                "tool_program is required".into(),
            ));
        }
        if self.download_timeout_secs == 0 {
            return Err(ExtractionError::InvalidConfig(
                "download_timeout_secs must be greater than zero".into(),
            ));
        }
        if self.tool_timeout_secs == 0 {
            return Err(ExtractionError::InvalidConfig(
                "tool_timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.tool_timeout_secs)
    }
}
