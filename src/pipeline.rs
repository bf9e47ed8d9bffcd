//! One invocation: classify, dispatch to the active strategy, signal the host.

use event::{ClassifiedEvent, EventKind, StorageChangeNotification};
use metadata::MetadataResult;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, info};

use crate::strategy::{ActionableEvent, ExtractionStrategy};

/// How an invocation ended.
///
/// Every variant is a successful completion from the host's point of view;
/// failures have already been logged where they happened.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InvocationOutcome {
    /// The event was deleted or ignored and reached no strategy.
    Skipped { kind: EventKind },
    /// The processing service accepted the job.
    Submitted { job_id: Option<String> },
    SubmissionFailed { error: String },
    /// Local extraction produced metadata.
    Extracted { metadata: MetadataResult },
    ExtractionFailed { error: String },
}

impl InvocationOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            InvocationOutcome::Skipped { .. } => "skipped",
            InvocationOutcome::Submitted { .. } => "submitted",
            InvocationOutcome::SubmissionFailed { .. } => "submission_failed",
            InvocationOutcome::Extracted { .. } => "extracted",
            InvocationOutcome::ExtractionFailed { .. } => "extraction_failed",
        }
    }
}

/// Sending half of an invocation's completion signal.
///
/// [`complete`](Self::complete) takes `self`, so an invocation can signal at
/// most once.
#[derive(Debug)]
pub struct CompletionSignal {
    tx: oneshot::Sender<InvocationOutcome>,
}

impl CompletionSignal {
    pub fn complete(self, outcome: InvocationOutcome) {
        if self.tx.send(outcome).is_err() {
            debug!("completion receiver dropped before invocation finished");
        }
    }
}

/// Receiving half, held by the host.
pub type Completion = oneshot::Receiver<InvocationOutcome>;

/// Create a linked completion signal and receiver.
pub fn completion_channel() -> (CompletionSignal, Completion) {
    let (tx, rx) = oneshot::channel();
    (CompletionSignal { tx }, rx)
}

/// Run one invocation from a raw notification payload in any supported
/// envelope, then fire `done` exactly once.
pub async fn handle_notification(
    payload: &Value,
    strategy: &dyn ExtractionStrategy,
    done: CompletionSignal,
) {
    let event = event::classify_json(payload);
    finish(&event, strategy, done).await;
}

/// Same as [`handle_notification`] for an already decoded notification.
pub async fn handle_storage_notification(
    notification: &StorageChangeNotification,
    strategy: &dyn ExtractionStrategy,
    done: CompletionSignal,
) {
    let event = event::classify(notification);
    finish(&event, strategy, done).await;
}

/// Dispatch a classified event. Deleted and ignored events return
/// [`InvocationOutcome::Skipped`] without touching `strategy`.
pub async fn process_event(
    event: &ClassifiedEvent,
    strategy: &dyn ExtractionStrategy,
) -> InvocationOutcome {
    match ActionableEvent::new(event) {
        Some(actionable) => strategy.extract(actionable).await,
        None => InvocationOutcome::Skipped { kind: event.kind },
    }
}

async fn finish(event: &ClassifiedEvent, strategy: &dyn ExtractionStrategy, done: CompletionSignal) {
    let outcome = process_event(event, strategy).await;
    info!(
        object_path = event.object_path.as_deref().unwrap_or("<none>"),
        kind = %event.kind,
        strategy = strategy.name(),
        outcome = outcome.label(),
        "invocation_completed"
    );
    done.complete(outcome);
}
