//! YAML pipeline configuration.
//!
//! Selects the extraction strategy and carries the settings of both. Only the
//! section of the selected strategy is validated.
//!
//! ## Example
//!
//! ```yaml
//! version: "1.0"
//! strategy: remote
//!
//! remote:
//!   application_id: "my-blitline-app"
//!   postback_url: "https://example.com/callback"
//!   # endpoint: "http://api.blitline.com/job"
//!   # api_version: 1.21
//!   # peek: true
//!
//! local:
//!   tool_program: "identify"
//!   temp_dir: "/tmp/imgmeta"
//!   download_timeout_secs: 60
//!   tool_timeout_secs: 30
//! ```

use std::fs;
use std::path::Path;
use std::sync::Arc;

use jobs::{JobClient, JobClientConfig};
use metadata::{LocalExtractionConfig, LocalExtractor, MetadataSink};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::strategy::{ExtractionStrategy, LocalExtraction, RemoteExtraction};

/// Errors that can occur when loading or applying a pipeline configuration.
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Which extraction strategy a process runs. Exactly one is active.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Submit a job to the processing service and wait for its callback.
    #[default]
    Remote,
    /// Download the object and run the metadata tool here.
    Local,
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    /// Configuration format version
    pub version: String,

    #[serde(default)]
    pub strategy: StrategyKind,

    #[serde(default)]
    pub remote: JobClientConfig,

    #[serde(default)]
    pub local: LocalExtractionConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            strategy: StrategyKind::default(),
            remote: JobClientConfig::default(),
            local: LocalExtractionConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: PipelineConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => {}
            v => return Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }

        match self.strategy {
            StrategyKind::Remote => self
                .remote
                .validate()
                .map_err(|e| ConfigLoadError::Validation(format!("remote: {e}"))),
            StrategyKind::Local => self
                .local
                .validate()
                .map_err(|e| ConfigLoadError::Validation(format!("local: {e}"))),
        }
    }

    /// Build the configured strategy. `sink` receives results of local
    /// extraction; the remote strategy's results arrive via the callback.
    pub fn build_strategy(
        &self,
        sink: Arc<dyn MetadataSink>,
    ) -> Result<Arc<dyn ExtractionStrategy>, ConfigLoadError> {
        self.validate()?;
        let strategy: Arc<dyn ExtractionStrategy> = match self.strategy {
            StrategyKind::Remote => {
                let client = JobClient::new(self.remote.clone())
                    .map_err(|e| ConfigLoadError::Validation(format!("remote: {e}")))?;
                Arc::new(RemoteExtraction::new(client))
            }
            StrategyKind::Local => {
                let extractor = LocalExtractor::from_config(&self.local)
                    .map_err(|e| ConfigLoadError::Validation(format!("local: {e}")))?;
                Arc::new(LocalExtraction::new(extractor, sink))
            }
        };
        Ok(strategy)
    }
}
