//! Wire format of a job submission.
//!
//! The service expects a form body with one field, `json`, holding the job as
//! JSON text:
//!
//! ```text
//! json={"application_id":"...","src":"https%3A%2F%2F...","postback_url":"...","v":1.21,"pre_process":{"peek":true}}
//! ```
//!
//! The body is written verbatim; the JSON text is not form-escaped a second
//! time. `src` is the only value that is percent-encoded, exactly once.
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use crate::config::JobClientConfig;
use crate::error::JobError;

/// Name of the single form field carrying the job.
pub const FORM_FIELD: &str = "json";

/// Bytes left unescaped by `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a URI for use as a single component.
pub fn encode_source_uri(uri: &str) -> String {
    utf8_percent_encode(uri, URI_COMPONENT).to_string()
}

/// Pre-processing options sent with every job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PreProcessOptions {
    pub peek: bool,
}

/// One job submission. Field order is the wire order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionJobRequest {
    pub application_id: String,
    /// Percent-encoded download URI of the image.
    #[serde(rename = "src")]
    pub source_uri: String,
    /// Where the service posts the result.
    #[serde(rename = "postback_url")]
    pub callback_uri: String,
    #[serde(rename = "v")]
    pub protocol_version: f64,
    #[serde(rename = "pre_process")]
    pub pre_process_options: PreProcessOptions,
}

impl ExtractionJobRequest {
    /// Build a request for `download_uri`. The URI is encoded here, so pass it
    /// exactly as the storage system reported it.
    pub fn new(config: &JobClientConfig, download_uri: &str) -> Self {
        Self {
            application_id: config.application_id.clone(),
            source_uri: encode_source_uri(download_uri),
            callback_uri: config.postback_url.clone(),
            protocol_version: config.api_version,
            pre_process_options: PreProcessOptions { peek: config.peek },
        }
    }

    /// Compact JSON text of the job.
    pub fn to_json(&self) -> Result<String, JobError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Request body: `json=` followed by the JSON text.
    pub fn form_body(&self) -> Result<String, JobError> {
        Ok(format!("{FORM_FIELD}={}", self.to_json()?))
    }
}
