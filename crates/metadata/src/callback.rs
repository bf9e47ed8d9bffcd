//! Parsing of the processing service's asynchronous result callback.
//!
//! Expected shape (only the nesting chain is required):
//!
//! ```json
//! {
//!   "results": {
//!     "job_id": "...",
//!     "error": "...",
//!     "original_meta": {
//!       "original_exif": {
//!         "Title": "...", "Description": "...", "Subject": ["a", "b"],
//!         "Headline": "...", "Caption-Abstract": "...", "City": "..."
//!       }
//!     },
//!     "pre_processor_results": { }
//!   }
//! }
//! ```
//!
//! A callback is processed on its own; nothing ties it back to the job that
//! produced it except the `job_id` we log.
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::CallbackSchemaError;
use crate::sink::MetadataSink;
use crate::types::{non_empty, MetadataOrigin, MetadataResult};

/// A validated callback.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackPayload {
    pub job_id: Option<String>,
    /// `results.error`, when the service reported one alongside the metadata.
    pub error: Option<String>,
    pub has_pre_processor_results: bool,
    pub metadata: MetadataResult,
}

/// Validate the `results.original_meta.original_exif` chain and extract the
/// metadata fields.
pub fn parse_callback(payload: &Value) -> Result<CallbackPayload, CallbackSchemaError> {
    let results = payload
        .get("results")
        .and_then(Value::as_object)
        .ok_or_else(|| CallbackSchemaError::MissingResults(payload.clone()))?;

    let original_meta = results
        .get("original_meta")
        .and_then(Value::as_object)
        .ok_or_else(|| CallbackSchemaError::MissingOriginalMeta(Value::Object(results.clone())))?;

    let exif = original_meta
        .get("original_exif")
        .and_then(Value::as_object)
        .ok_or_else(|| {
            CallbackSchemaError::MissingOriginalExif(Value::Object(original_meta.clone()))
        })?;

    Ok(CallbackPayload {
        job_id: results.get("job_id").and_then(scalar_text),
        error: results.get("error").and_then(scalar_text),
        has_pre_processor_results: results
            .get("pre_processor_results")
            .is_some_and(|v| !v.is_null()),
        metadata: metadata_from_exif(exif),
    })
}

/// Parse a raw request body. Bodies that are not JSON fail as
/// [`CallbackSchemaError::MissingResults`].
pub fn parse_callback_body(body: &[u8]) -> Result<CallbackPayload, CallbackSchemaError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(value) => parse_callback(&value),
        Err(_) => Err(CallbackSchemaError::MissingResults(Value::String(
            String::from_utf8_lossy(body).into_owned(),
        ))),
    }
}

/// Handle one callback body end to end: validate, log, and report to `sink`.
///
/// The caller acknowledges the request whatever this returns.
pub fn ingest_callback(
    body: &[u8],
    sink: &dyn MetadataSink,
) -> Result<CallbackPayload, CallbackSchemaError> {
    let parsed = parse_callback_body(body);
    match &parsed {
        Ok(payload) => {
            info!(
                job_id = ?payload.job_id,
                service_error = ?payload.error,
                pre_processor_results = payload.has_pre_processor_results,
                "callback_received"
            );
            let origin = MetadataOrigin::Callback {
                job_id: payload.job_id.clone(),
            };
            sink.report(&origin, &payload.metadata);
        }
        Err(err) => warn!(
            missing = err.missing_path(),
            received = %err.received(),
            "callback_schema_error: {err}"
        ),
    }
    parsed
}

fn metadata_from_exif(exif: &Map<String, Value>) -> MetadataResult {
    let text = |key: &str| exif.get(key).and_then(scalar_text);

    let keywords = exif
        .get("Subject")
        .or_else(|| exif.get("Keywords"))
        .map(keyword_list)
        .unwrap_or_default();

    MetadataResult {
        title: text("Title"),
        description: text("Description"),
        headline: text("Headline"),
        caption_abstract: text("Caption-Abstract"),
        keywords,
        raw: exif.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
    }
}

/// Metadata readers emit numeric-looking values as JSON numbers.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn keyword_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
        other => scalar_text(other).into_iter().collect(),
    }
}
