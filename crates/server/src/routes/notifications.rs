//! Storage-change notifications.
//!
//! Each request is one pipeline invocation. The invocation runs on its own
//! task so a client that hangs up does not cut a job submission or tool run
//! short; the handler waits for the completion signal and then answers 200
//! with an empty body, whatever the outcome.

use crate::state::ServerState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use imgmeta::{completion_channel, handle_notification};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, warn};

pub async fn receive_notification(
    State(state): State<Arc<ServerState>>,
    body: Bytes,
) -> StatusCode {
    let payload = match serde_json::from_slice::<Value>(&body) {
        Ok(value) => value,
        Err(err) => {
            // Still classified, as a malformed notification.
            warn!(error = %err, bytes = body.len(), "notification_body_not_json");
            Value::Null
        }
    };

    let (done, completion) = completion_channel();
    let strategy = state.strategy.clone();
    tokio::spawn(async move {
        handle_notification(&payload, strategy.as_ref(), done).await;
    });

    match completion.await {
        Ok(outcome) => debug!(outcome = outcome.label(), "notification_acknowledged"),
        // Only reachable if the invocation task panicked.
        Err(_) => error!("invocation ended without completing"),
    }

    StatusCode::OK
}
