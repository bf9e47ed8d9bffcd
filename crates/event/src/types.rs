//! Data model for storage notifications and the events derived from them.
//!
//! ```text
//! StorageChangeNotification (Cloud Storage object resource)
//! ├── name: Option<String>
//! ├── bucket: Option<String>
//! ├── content_type: Option<String>
//! ├── resource_state: Option<String>   "exists" | "not_exists"
//! ├── media_link: Option<String>       download URI
//! ├── generation / metageneration      logged only
//! └── size, metadata                   carried through
//!
//!         ↓ classify()
//!
//! ClassifiedEvent
//! ├── kind: EventKind
//! ├── object_path / bucket / content_type / download_uri / generation
//! └── diagnostic: Option<ClassifyError>  (set for Ignored)
//! ```
use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ClassifyError;

/// Resource-state marker used by the storage system for removed objects.
pub const RESOURCE_STATE_NOT_EXISTS: &str = "not_exists";

/// Resource-state marker used by the storage system for live objects.
pub const RESOURCE_STATE_EXISTS: &str = "exists";

/// A change notification for a single stored object.
///
/// Field names follow the Cloud Storage JSON object resource. Every field is
/// optional because the storage system does not guarantee any of them; the
/// classifier decides what a missing field means.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StorageChangeNotification {
    /// Object name, i.e. its path inside the bucket (`photos/a.jpg`).
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bucket: Option<String>,
    /// MIME type reported by the storage system.
    #[serde(default)]
    pub content_type: Option<String>,
    /// `"exists"` or `"not_exists"`.
    #[serde(default)]
    pub resource_state: Option<String>,
    /// URI from which the object's bytes can be downloaded.
    #[serde(default)]
    pub media_link: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub generation: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub metageneration: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub size: Option<String>,
    /// User-supplied object metadata.
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
}

impl StorageChangeNotification {
    /// Convenience constructor for an existing object.
    pub fn new(name: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            content_type: Some(content_type.into()),
            resource_state: Some(RESOURCE_STATE_EXISTS.to_string()),
            ..Default::default()
        }
    }

    pub fn with_resource_state(mut self, state: impl Into<String>) -> Self {
        self.resource_state = Some(state.into());
        self
    }

    pub fn with_media_link(mut self, uri: impl Into<String>) -> Self {
        self.media_link = Some(uri.into());
        self
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    pub fn with_generation(mut self, generation: impl Into<String>) -> Self {
        self.generation = Some(generation.into());
        self
    }
}

/// Background-function envelope: `{ eventType, resource, data }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BackgroundEvent {
    #[serde(default)]
    pub(crate) event_type: Option<String>,
    #[serde(default)]
    pub(crate) resource: Option<serde_json::Value>,
    pub(crate) data: StorageChangeNotification,
}

/// Pub/Sub push envelope: `{ message: { data: <base64>, attributes } }`.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PushEnvelope {
    pub(crate) message: PushMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PushMessage {
    #[serde(default)]
    pub(crate) data: Option<String>,
    #[serde(default)]
    pub(crate) attributes: HashMap<String, String>,
}

/// Semantic kind of a classified notification.
///
/// The classifier does not distinguish creation from update: both surface as
/// [`Created`](EventKind::Created). [`Modified`](EventKind::Modified) is never
/// produced by [`classify`](crate::classify) and exists for storage signals
/// that can tell the two apart.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Created,
    Modified,
    Deleted,
    Ignored,
}

impl EventKind {
    /// Only created/modified objects are handed to an extraction strategy.
    pub fn is_actionable(self) -> bool {
        matches!(self, EventKind::Created | EventKind::Modified)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Created => "created",
            EventKind::Modified => "modified",
            EventKind::Deleted => "deleted",
            EventKind::Ignored => "ignored",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The normalized interpretation of one notification.
///
/// Lives for a single invocation and is never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedEvent {
    pub kind: EventKind,
    pub object_path: Option<String>,
    pub bucket: Option<String>,
    pub content_type: Option<String>,
    pub download_uri: Option<String>,
    pub generation: Option<String>,
    /// Why the event was ignored. Always `None` for other kinds.
    pub diagnostic: Option<ClassifyError>,
}

impl ClassifiedEvent {
    pub(crate) fn ignored(diagnostic: ClassifyError) -> Self {
        Self {
            kind: EventKind::Ignored,
            object_path: None,
            bucket: None,
            content_type: None,
            download_uri: None,
            generation: None,
            diagnostic: Some(diagnostic),
        }
    }

    /// Last path segment of the object name (`photos/a.jpg` → `a.jpg`).
    pub fn file_name(&self) -> Option<&str> {
        self.object_path
            .as_deref()
            .and_then(|path| path.rsplit('/').next())
            .filter(|name| !name.is_empty())
    }
}

/// Storage systems serialize 64-bit counters as strings; older emitters use
/// numbers. Accept both.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
