use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::JobError;

/// Default job endpoint of the processing service.
pub const DEFAULT_ENDPOINT: &str = "http://api.blitline.com/job";

/// Protocol version sent in the `v` field.
pub const DEFAULT_API_VERSION: f64 = 1.21;

/// Settings for the job submission client.
///
/// # Example
/// ```
/// use jobs::JobClientConfig;
///
/// let cfg = JobClientConfig {
///     application_id: "my-app".into(),
///     postback_url: "https://example.com/callback".into(),
///     ..Default::default()
/// };
/// cfg.validate().unwrap();
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct JobClientConfig {
    /// Full URL jobs are POSTed to.
    pub endpoint: String,
    /// Application identifier issued by the processing service.
    pub application_id: String,
    /// Public URL of this system's callback endpoint.
    pub postback_url: String,
    /// Value of the `v` field.
    pub api_version: f64,
    /// Ask the service to inspect headers only instead of processing the image.
    pub peek: bool,
    /// Overall request timeout in seconds.
    pub timeout_secs: u64,
    /// Connect timeout in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for JobClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.into(),
            application_id: String::new(),
            postback_url: String::new(),
            api_version: DEFAULT_API_VERSION,
            peek: true,
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl JobClientConfig {
    pub fn validate(&self) -> Result<(), JobError> {
        if self.endpoint.trim().is_empty() {
            return Err(JobError::InvalidConfig("endpoint is required".into()));
        }
        if self.application_id.trim().is_empty() {
            return Err(JobError::InvalidConfig("application_id is required".into()));
        }
        if self.postback_url.trim().is_empty() {
            return Err(JobError::InvalidConfig("postback_url is required".into()));
        }
        if !(self.api_version.is_finite() && self.api_version > 0.0) {
            return Err(JobError::InvalidConfig(format!(
                "api_version must be positive, got {}",
                self.api_version
            )));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
