use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Descriptive metadata of one image.
///
/// Built either from a processing-service callback or from local tool output,
/// handed to a [`MetadataSink`](crate::MetadataSink), and then dropped.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetadataResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption_abstract: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Every field the source reported, by its original name.
    #[serde(default)]
    pub raw: BTreeMap<String, Value>,
}

impl MetadataResult {
    /// True when none of the descriptive fields are set.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.headline.is_none()
            && self.caption_abstract.is_none()
            && self.keywords.is_empty()
    }
}

/// Where a [`MetadataResult`] came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "origin", rename_all = "snake_case")]
pub enum MetadataOrigin {
    /// Posted back by the processing service.
    Callback { job_id: Option<String> },
    /// Read locally from a downloaded copy of the object.
    LocalTool { object_path: String },
}

/// Trimmed text, with empty strings treated as absent.
pub(crate) fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
