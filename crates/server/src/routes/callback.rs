use crate::state::ServerState;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use std::sync::Arc;

/// Results posted back by the processing service.
///
/// Always 200 with an empty body. Schema problems are logged by
/// [`metadata::ingest_callback`].
pub async fn receive_callback(State(state): State<Arc<ServerState>>, body: Bytes) -> StatusCode {
    let _ = metadata::ingest_callback(&body, state.sink.as_ref());
    StatusCode::OK
}
