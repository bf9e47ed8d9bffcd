//! Storage event classification
//!
//! This is where a storage-change notification enters the pipeline. We take
//! whatever the storage system sent and decide what it means for us: an image
//! that needs metadata, a deletion, or something to ignore.
//!
//! ## Rules, in order
//!
//! 1. No object name → [`EventKind::Ignored`]. Nameless notifications show up
//!    during function deployment; they are noise, not errors.
//! 2. `resourceState == "not_exists"` → [`EventKind::Deleted`].
//! 3. Content type not starting with `image/` → [`EventKind::Ignored`].
//! 4. Anything else → [`EventKind::Created`]. Creates and updates are not told
//!    apart.
//!
//! Classification is a pure function. It never fails and never touches the
//! network or filesystem; malformed input becomes an ignored event with a
//! [`ClassifyError`] diagnostic, and every decision is logged via `tracing`.
//!
//! ## Example
//!
//! ```
//! use event::{classify, EventKind, StorageChangeNotification};
//!
//! let notification = StorageChangeNotification::new("photos/a.jpg", "image/jpeg")
//!     .with_media_link("https://x/y?a=1&b=2");
//!
//! let event = classify(&notification);
//! assert_eq!(event.kind, EventKind::Created);
//! assert_eq!(event.download_uri.as_deref(), Some("https://x/y?a=1&b=2"));
//! ```
use tracing::{info, warn};

mod envelope;
mod error;
mod types;

pub use crate::envelope::decode_notification;
pub use crate::error::ClassifyError;
pub use crate::types::{
    ClassifiedEvent, EventKind, StorageChangeNotification, RESOURCE_STATE_EXISTS,
    RESOURCE_STATE_NOT_EXISTS,
};

/// MIME prefix of the objects we annotate.
pub const IMAGE_CONTENT_TYPE_PREFIX: &str = "image/";

/// Classify a decoded notification.
pub fn classify(notification: &StorageChangeNotification) -> ClassifiedEvent {
    let event = classify_inner(notification);
    log_classification(&event);
    event
}

/// Decode and classify a raw JSON payload in any supported envelope.
///
/// Payloads that cannot be decoded classify as [`EventKind::Ignored`] with a
/// [`ClassifyError::MalformedNotification`] diagnostic.
pub fn classify_json(value: &serde_json::Value) -> ClassifiedEvent {
    match decode_notification(value) {
        Ok(notification) => classify(&notification),
        Err(err) => {
            let event = ClassifiedEvent::ignored(err);
            log_classification(&event);
            event
        }
    }
}

fn classify_inner(notification: &StorageChangeNotification) -> ClassifiedEvent {
    let name = match notification.name.as_deref() {
        Some(name) if !name.is_empty() => name,
        _ => {
            return ClassifiedEvent::ignored(ClassifyError::MalformedNotification(
                "object name is missing".to_string(),
            ))
        }
    };

    let mut event = ClassifiedEvent {
        kind: EventKind::Created,
        object_path: Some(name.to_string()),
        bucket: notification.bucket.clone(),
        content_type: notification.content_type.clone(),
        download_uri: notification.media_link.clone(),
        generation: notification.generation.clone(),
        diagnostic: None,
    };

    if notification.resource_state.as_deref() == Some(RESOURCE_STATE_NOT_EXISTS) {
        event.kind = EventKind::Deleted;
        return event;
    }

    let is_image = notification
        .content_type
        .as_deref()
        .is_some_and(|ct| ct.starts_with(IMAGE_CONTENT_TYPE_PREFIX));
    if !is_image {
        event.kind = EventKind::Ignored;
        event.diagnostic = Some(ClassifyError::UnsupportedContentType(
            notification.content_type.clone(),
        ));
    }

    event
}

fn log_classification(event: &ClassifiedEvent) {
    match &event.diagnostic {
        Some(diagnostic) if diagnostic.is_malformed() => warn!(
            object_path = ?event.object_path,
            kind = %event.kind,
            diagnostic = %diagnostic,
            "event_classified"
        ),
        Some(diagnostic) => info!(
            object_path = ?event.object_path,
            kind = %event.kind,
            content_type = ?event.content_type,
            diagnostic = %diagnostic,
            "event_classified"
        ),
        None => info!(
            object_path = ?event.object_path,
            kind = %event.kind,
            content_type = ?event.content_type,
            generation = ?event.generation,
            "event_classified"
        ),
    }
}
