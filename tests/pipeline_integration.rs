//! End-to-end invocations: classification, strategy dispatch, completion.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Bytes;
use axum::extract::State;
use axum::routing::post;
use axum::Router;
use imgmeta::{
    completion_channel, handle_notification, handle_storage_notification, ActionableEvent,
    EventKind, ExtractionStrategy, InvocationOutcome, LocalExtraction, MetadataOrigin,
    MetadataResult, MetadataSink, RemoteExtraction, StorageChangeNotification,
};
use jobs::{JobClient, JobClientConfig};
use metadata::{ExtractionError, LocalExtractor, MetadataTool, ObjectDownloader};
use serde_json::{json, Value};

/// Counts calls and otherwise does nothing.
#[derive(Default)]
struct CountingStrategy {
    calls: AtomicUsize,
}

#[async_trait]
impl ExtractionStrategy for CountingStrategy {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn extract(&self, _event: ActionableEvent<'_>) -> InvocationOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        InvocationOutcome::Submitted { job_id: None }
    }
}

async fn run(payload: Value, strategy: &dyn ExtractionStrategy) -> InvocationOutcome {
    let (done, completion) = completion_channel();
    handle_notification(&payload, strategy, done).await;
    completion.await.expect("completion fired")
}

#[tokio::test]
async fn deleted_object_skips_strategy_and_completes_once() {
    let strategy = CountingStrategy::default();
    let outcome = run(
        json!({"name": "photos/a.jpg", "contentType": "image/jpeg", "resourceState": "not_exists"}),
        &strategy,
    )
    .await;

    assert_eq!(outcome, InvocationOutcome::Skipped { kind: EventKind::Deleted });
    assert_eq!(strategy.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn non_image_and_nameless_notifications_are_ignored() {
    let strategy = CountingStrategy::default();

    let cases = [
        json!({"name": "notes.txt", "contentType": "text/plain", "resourceState": "exists"}),
        json!({"contentType": "image/jpeg", "resourceState": "exists"}),
        json!({"name": "", "contentType": "image/jpeg"}),
        json!("not an object"),
    ];
    for payload in cases {
        let outcome = run(payload.clone(), &strategy).await;
        assert_eq!(
            outcome,
            InvocationOutcome::Skipped { kind: EventKind::Ignored },
            "{payload}"
        );
    }
    assert_eq!(strategy.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn created_image_reaches_strategy_exactly_once() {
    let strategy = CountingStrategy::default();
    let (done, completion) = completion_channel();
    let notification = StorageChangeNotification::new("photos/a.jpg", "image/jpeg")
        .with_media_link("https://storage.example.com/a.jpg");

    handle_storage_notification(&notification, &strategy, done).await;

    assert_eq!(
        completion.await.unwrap(),
        InvocationOutcome::Submitted { job_id: None }
    );
    assert_eq!(strategy.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn dropped_receiver_does_not_break_the_invocation() {
    let strategy = CountingStrategy::default();
    let (done, completion) = completion_channel();
    drop(completion);

    let payload = json!({"name": "a.jpg", "contentType": "image/png"});
    handle_notification(&payload, &strategy, done).await;
    assert_eq!(strategy.calls.load(Ordering::SeqCst), 1);
}

type Received = Arc<Mutex<Vec<String>>>;

async fn spawn_job_service(reply: &'static str) -> (String, Received) {
    async fn job(State((received, reply)): State<(Received, &'static str)>, body: Bytes) -> &'static str {
        received
            .lock()
            .unwrap()
            .push(String::from_utf8_lossy(&body).into_owned());
        reply
    }

    let received: Received = Arc::default();
    let app = Router::new()
        .route("/job", post(job))
        .with_state((received.clone(), reply));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://{addr}/job"), received)
}

fn remote_strategy(endpoint: String) -> RemoteExtraction {
    RemoteExtraction::new(
        JobClient::new(JobClientConfig {
            endpoint,
            application_id: "app-123".into(),
            postback_url: "https://example.com/callback".into(),
            ..Default::default()
        })
        .unwrap(),
    )
}

#[tokio::test]
async fn created_image_submits_one_job_with_encoded_source() {
    let (endpoint, received) = spawn_job_service(r#"{"results":{"job_id":"42"}}"#).await;
    let strategy = remote_strategy(endpoint);

    let outcome = run(
        json!({
            "name": "photos/a.jpg",
            "contentType": "image/jpeg",
            "resourceState": "exists",
            "mediaLink": "https://x/y?a=1&b=2",
            "generation": "1490000000000000"
        }),
        &strategy,
    )
    .await;

    assert_eq!(
        outcome,
        InvocationOutcome::Submitted {
            job_id: Some("42".into())
        }
    );
    let bodies = received.lock().unwrap().clone();
    assert_eq!(bodies.len(), 1);
    let job: Value = serde_json::from_str(bodies[0].strip_prefix("json=").unwrap()).unwrap();
    assert_eq!(job["src"], "https%3A%2F%2Fx%2Fy%3Fa%3D1%26b%3D2");
}

#[tokio::test]
async fn rejected_job_still_completes() {
    let (endpoint, received) = spawn_job_service(r#"{"results":{"error":"Invalid app id"}}"#).await;
    let strategy = remote_strategy(endpoint);

    let outcome = run(
        json!({"name": "a.jpg", "contentType": "image/jpeg", "mediaLink": "https://x/a.jpg"}),
        &strategy,
    )
    .await;

    match outcome {
        InvocationOutcome::SubmissionFailed { error } => assert!(error.contains("Invalid app id")),
        other => panic!("expected submission failure, got {other:?}"),
    }
    assert_eq!(received.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn deleted_object_makes_no_outbound_call() {
    let (endpoint, received) = spawn_job_service(r#"{"results":{}}"#).await;
    let strategy = remote_strategy(endpoint);

    let outcome = run(
        json!({"name": "a.jpg", "contentType": "image/jpeg", "resourceState": "not_exists"}),
        &strategy,
    )
    .await;

    assert_eq!(outcome, InvocationOutcome::Skipped { kind: EventKind::Deleted });
    assert!(received.lock().unwrap().is_empty());
}

struct StaticDownloader;

#[async_trait]
impl ObjectDownloader for StaticDownloader {
    async fn download(&self, _uri: &str, dest: &Path) -> Result<(), ExtractionError> {
        tokio::fs::write(dest, b"image").await?;
        Ok(())
    }
}

struct StaticTool(&'static str);

#[async_trait]
impl MetadataTool for StaticTool {
    async fn read(&self, _path: &Path, _format: &str) -> Result<String, ExtractionError> {
        Ok(self.0.to_string())
    }
}

#[derive(Default)]
struct RecordingSink {
    reports: Mutex<Vec<(MetadataOrigin, MetadataResult)>>,
}

impl MetadataSink for RecordingSink {
    fn report(&self, origin: &MetadataOrigin, metadata: &MetadataResult) {
        self.reports
            .lock()
            .unwrap()
            .push((origin.clone(), metadata.clone()));
    }
}

#[tokio::test]
async fn local_strategy_reports_extracted_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(RecordingSink::default());
    let strategy = LocalExtraction::new(
        LocalExtractor::new(
            Arc::new(StaticDownloader),
            Arc::new(StaticTool("Keywords a;b Headline H Title T Caption C")),
            Some(dir.path().to_path_buf()),
        ),
        sink.clone(),
    );

    let outcome = run(
        json!({"name": "photos/a.jpg", "contentType": "image/jpeg", "mediaLink": "https://x/a.jpg"}),
        &strategy,
    )
    .await;

    let InvocationOutcome::Extracted { metadata } = outcome else {
        panic!("expected extracted metadata, got {outcome:?}");
    };
    assert_eq!(metadata.title.as_deref(), Some("T"));
    assert_eq!(metadata.keywords, vec!["a", "b"]);

    let reports = sink.reports.lock().unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(
        reports[0].0,
        MetadataOrigin::LocalTool {
            object_path: "photos/a.jpg".into()
        }
    );
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[tokio::test]
async fn local_strategy_failure_reports_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let sink = Arc::new(RecordingSink::default());
    let strategy = LocalExtraction::new(
        LocalExtractor::new(
            Arc::new(StaticDownloader),
            Arc::new(StaticTool("identify: improper image header")),
            Some(dir.path().to_path_buf()),
        ),
        sink.clone(),
    );

    let outcome = run(
        json!({"name": "a.jpg", "contentType": "image/jpeg", "mediaLink": "https://x/a.jpg"}),
        &strategy,
    )
    .await;

    assert!(matches!(outcome, InvocationOutcome::ExtractionFailed { .. }));
    assert!(sink.reports.lock().unwrap().is_empty());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
