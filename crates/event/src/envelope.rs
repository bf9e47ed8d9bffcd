//! Decoding of the envelopes a storage notification can arrive in.
//!
//! Three shapes are accepted:
//!
//! 1. A bare object resource (`{ "name": ..., "contentType": ... }`).
//! 2. A background-function event (`{ "eventType", "resource", "data": {..} }`).
//! 3. A Pub/Sub push message whose `data` is the base64 object resource and
//!    whose `attributes.eventType` names the storage event.
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;
use tracing::debug;

use crate::error::ClassifyError;
use crate::types::{
    BackgroundEvent, PushEnvelope, StorageChangeNotification, RESOURCE_STATE_NOT_EXISTS,
};

/// Pub/Sub attribute value for a deleted object.
const PUSH_EVENT_OBJECT_DELETE: &str = "OBJECT_DELETE";

/// Decode any supported envelope into a notification.
pub fn decode_notification(value: &Value) -> Result<StorageChangeNotification, ClassifyError> {
    let Value::Object(map) = value else {
        return Err(ClassifyError::MalformedNotification(format!(
            "expected a JSON object, got {}",
            json_type_name(value)
        )));
    };

    if map.contains_key("message") {
        let envelope: PushEnvelope = serde_json::from_value(value.clone()).map_err(|e| {
            ClassifyError::MalformedNotification(format!("invalid push envelope: {e}"))
        })?;
        return decode_push(envelope);
    }

    if matches!(map.get("data"), Some(Value::Object(_))) {
        let event: BackgroundEvent = serde_json::from_value(value.clone()).map_err(|e| {
            ClassifyError::MalformedNotification(format!("invalid event envelope: {e}"))
        })?;
        debug!(
            event_type = ?event.event_type,
            resource = ?event.resource,
            "background_event_envelope"
        );
        return Ok(event.data);
    }

    serde_json::from_value(value.clone())
        .map_err(|e| ClassifyError::MalformedNotification(format!("invalid object resource: {e}")))
}

fn decode_push(envelope: PushEnvelope) -> Result<StorageChangeNotification, ClassifyError> {
    let message = envelope.message;
    let data = message.data.ok_or_else(|| {
        ClassifyError::MalformedNotification("push message has no data".to_string())
    })?;
    let bytes = STANDARD.decode(data.trim()).map_err(|e| {
        ClassifyError::MalformedNotification(format!("push data is not base64: {e}"))
    })?;
    let mut notification: StorageChangeNotification = serde_json::from_slice(&bytes)
        .map_err(|e| ClassifyError::MalformedNotification(format!("push data is not JSON: {e}")))?;

    let event_type = message.attributes.get("eventType").map(String::as_str);
    debug!(event_type = ?event_type, "push_envelope");

    // Pub/Sub payloads omit resourceState; the attribute carries the same fact.
    if notification.resource_state.is_none() && event_type == Some(PUSH_EVENT_OBJECT_DELETE) {
        notification.resource_state = Some(RESOURCE_STATE_NOT_EXISTS.to_string());
    }

    Ok(notification)
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
