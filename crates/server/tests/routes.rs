//! Route-level tests driven through the full router with `oneshot`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use imgmeta::{
    ActionableEvent, ExtractionStrategy, InvocationOutcome, MetadataOrigin, MetadataResult,
    MetadataSink,
};
use serde_json::{json, Value};
use server::{build_router, ServerConfig, ServerState};
use tower::ServiceExt;

#[derive(Default)]
struct CountingStrategy {
    seen: Mutex<Vec<String>>,
}

#[async_trait]
impl ExtractionStrategy for CountingStrategy {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn extract(&self, event: ActionableEvent<'_>) -> InvocationOutcome {
        self.seen.lock().unwrap().push(event.object_path().to_string());
        InvocationOutcome::Submitted { job_id: None }
    }
}

#[derive(Default)]
struct CountingSink {
    reports: AtomicUsize,
    last: Mutex<Option<(MetadataOrigin, MetadataResult)>>,
}

impl MetadataSink for CountingSink {
    fn report(&self, origin: &MetadataOrigin, metadata: &MetadataResult) {
        self.reports.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some((origin.clone(), metadata.clone()));
    }
}

struct Harness {
    app: Router,
    strategy: Arc<CountingStrategy>,
    sink: Arc<CountingSink>,
}

fn harness(config: ServerConfig) -> Harness {
    let strategy = Arc::new(CountingStrategy::default());
    let sink = Arc::new(CountingSink::default());
    let state = ServerState::with_parts(config, strategy.clone(), sink.clone());
    Harness {
        app: build_router(Arc::new(state)),
        strategy,
        sink,
    }
}

fn post(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

#[tokio::test]
async fn created_image_notification_runs_strategy_and_acks_empty() {
    let h = harness(ServerConfig::default());
    let payload = json!({
        "name": "photos/a.jpg",
        "contentType": "image/jpeg",
        "resourceState": "exists",
        "mediaLink": "https://x/y"
    });

    let response = h
        .app
        .oneshot(post("/notifications", payload.to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    assert!(body_bytes(response).await.is_empty());
    assert_eq!(h.strategy.seen.lock().unwrap().as_slice(), ["photos/a.jpg"]);
}

#[tokio::test]
async fn skipped_and_malformed_notifications_still_ack() {
    let h = harness(ServerConfig::default());
    let bodies = [
        json!({"name": "a.jpg", "contentType": "image/jpeg", "resourceState": "not_exists"})
            .to_string(),
        json!({"name": "a.txt", "contentType": "text/plain"}).to_string(),
        json!({"contentType": "image/jpeg"}).to_string(),
        "this is not json".to_string(),
    ];

    for body in bodies {
        let response = h
            .app
            .clone()
            .oneshot(post("/notifications", body.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{body}");
        assert!(body_bytes(response).await.is_empty());
    }
    assert!(h.strategy.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn push_envelope_notification_is_decoded() {
    use base64::Engine as _;

    let h = harness(ServerConfig::default());
    let resource = json!({"name": "b.png", "contentType": "image/png", "mediaLink": "https://x/b"});
    let data = base64::engine::general_purpose::STANDARD.encode(resource.to_string());
    let envelope = json!({
        "message": {"data": data, "attributes": {"eventType": "OBJECT_FINALIZE"}},
        "subscription": "projects/p/subscriptions/s"
    });

    let response = h
        .app
        .oneshot(post("/notifications", envelope.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(h.strategy.seen.lock().unwrap().as_slice(), ["b.png"]);
}

#[tokio::test]
async fn callback_validation_levels_all_ack_with_empty_body() {
    let h = harness(ServerConfig::default());
    let payloads = [
        json!({}),
        json!({"results": {}}),
        json!({"results": {"original_meta": {}}}),
    ];

    for payload in payloads {
        let response = h
            .app
            .clone()
            .oneshot(post("/callback", payload.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{payload}");
        assert!(body_bytes(response).await.is_empty());
    }
    assert_eq!(h.sink.reports.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn full_callback_reports_metadata() {
    let h = harness(ServerConfig::default());
    let payload = json!({
        "results": {
            "job_id": "42",
            "original_meta": {"original_exif": {"Title": "T", "Description": "D"}}
        }
    });

    let response = h
        .app
        .oneshot(post("/callback", payload.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await.is_empty());

    assert_eq!(h.sink.reports.load(Ordering::SeqCst), 1);
    let (origin, metadata) = h.sink.last.lock().unwrap().clone().unwrap();
    assert_eq!(
        origin,
        MetadataOrigin::Callback {
            job_id: Some("42".into())
        }
    );
    assert_eq!(metadata.title.as_deref(), Some("T"));
    assert_eq!(metadata.description.as_deref(), Some("D"));
}

#[tokio::test]
async fn callback_path_is_configurable() {
    let h = harness(ServerConfig {
        callback_path: "/hooks/blitline".into(),
        ..Default::default()
    });
    let body = json!({"results": {"original_meta": {"original_exif": {"Title": "T"}}}}).to_string();

    let response = h
        .app
        .clone()
        .oneshot(post("/hooks/blitline", body.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(h.sink.reports.load(Ordering::SeqCst), 1);

    let response = h.app.oneshot(post("/callback", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oversized_callback_is_still_ingested() {
    let h = harness(ServerConfig {
        max_body_size_mb: 1,
        ..Default::default()
    });
    let payload = json!({
        "results": {
            "original_meta": {
                "original_exif": {"Title": "T", "Comment": "x".repeat(1_200_000)}
            }
        }
    });

    let response = h
        .app
        .oneshot(post("/callback", payload.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await.is_empty());

    assert_eq!(h.sink.reports.load(Ordering::SeqCst), 1);
    let (_, metadata) = h.sink.last.lock().unwrap().clone().unwrap();
    assert_eq!(metadata.title.as_deref(), Some("T"));
}

#[tokio::test]
async fn notification_body_limit_still_applies() {
    let h = harness(ServerConfig {
        max_body_size_mb: 1,
        ..Default::default()
    });
    let payload = json!({
        "name": "a.jpg",
        "contentType": "image/jpeg",
        "metadata": {"note": "x".repeat(1_200_000)}
    });

    let response = h
        .app
        .oneshot(post("/notifications", payload.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(h.strategy.seen.lock().unwrap().is_empty());
}

/// Takes a while before finishing, like a slow tool run.
struct SlowStrategy;

#[async_trait]
impl ExtractionStrategy for SlowStrategy {
    fn name(&self) -> &'static str {
        "slow"
    }

    async fn extract(&self, _event: ActionableEvent<'_>) -> InvocationOutcome {
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        InvocationOutcome::Submitted { job_id: None }
    }
}

#[tokio::test]
async fn request_timeout_does_not_cut_notifications_short() {
    let config = ServerConfig {
        timeout_secs: 0,
        ..Default::default()
    };
    let state = ServerState::with_parts(
        config,
        Arc::new(SlowStrategy),
        Arc::new(CountingSink::default()),
    );
    let app = build_router(Arc::new(state));
    let payload = json!({"name": "a.jpg", "contentType": "image/jpeg", "mediaLink": "https://x/a"});

    let response = app
        .oneshot(post("/notifications", payload.to_string()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_bytes(response).await.is_empty());
}

#[tokio::test]
async fn probes_and_fallback() {
    let h = harness(ServerConfig::default());

    let response = h
        .app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let health: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(health["status"], "healthy");

    let response = h
        .app
        .clone()
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let ready: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(ready["components"]["strategy"], "counting");
    assert_eq!(ready["components"]["callback_path"], "/callback");

    let response = h
        .app
        .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let err: Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(err["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn request_id_is_echoed() {
    let h = harness(ServerConfig::default());
    let request = Request::get("/health")
        .header("x-request-id", "req-123")
        .body(Body::empty())
        .unwrap();

    let response = h.app.oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "req-123");
}

#[test]
fn state_from_config_requires_valid_pipeline() {
    assert!(ServerState::new(ServerConfig::default()).is_err());

    let mut config = ServerConfig::default();
    config.pipeline.remote.application_id = "app".into();
    config.pipeline.remote.postback_url = "https://example.com/callback".into();
    let state = ServerState::new(config).unwrap();
    assert_eq!(state.strategy.name(), "remote");
}
