//! The two ways of getting metadata for a created image.

use std::ops::Deref;
use std::sync::Arc;

use async_trait::async_trait;
use event::ClassifiedEvent;
use jobs::JobClient;
use metadata::{LocalExtractor, MetadataOrigin, MetadataSink};

use crate::pipeline::InvocationOutcome;

/// A classified event that may be handed to a strategy.
///
/// Only [`ActionableEvent::new`] builds one, and it refuses deleted and
/// ignored events, so a strategy never sees them.
#[derive(Debug, Clone, Copy)]
pub struct ActionableEvent<'a> {
    event: &'a ClassifiedEvent,
}

impl<'a> ActionableEvent<'a> {
    pub fn new(event: &'a ClassifiedEvent) -> Option<Self> {
        event.kind.is_actionable().then_some(Self { event })
    }

    /// Object path; empty only if the classifier let a nameless event through.
    pub fn object_path(&self) -> &'a str {
        self.event.object_path.as_deref().unwrap_or_default()
    }

    pub fn download_uri(&self) -> Option<&'a str> {
        self.event.download_uri.as_deref()
    }
}

impl Deref for ActionableEvent<'_> {
    type Target = ClassifiedEvent;

    fn deref(&self) -> &ClassifiedEvent {
        self.event
    }
}

/// How metadata is obtained for a created image.
///
/// Implementations log their own failures and fold them into the returned
/// outcome; they never panic or retry.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    /// Short name for logs and config (`remote`, `local`).
    fn name(&self) -> &'static str;

    async fn extract(&self, event: ActionableEvent<'_>) -> InvocationOutcome;
}

/// Delegate extraction to the processing service. The metadata arrives
/// later through the callback endpoint.
pub struct RemoteExtraction {
    client: JobClient,
}

impl RemoteExtraction {
    pub fn new(client: JobClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ExtractionStrategy for RemoteExtraction {
    fn name(&self) -> &'static str {
        "remote"
    }

    async fn extract(&self, event: ActionableEvent<'_>) -> InvocationOutcome {
        match self
            .client
            .submit(event.object_path(), event.download_uri())
            .await
        {
            Ok(ack) => InvocationOutcome::Submitted { job_id: ack.job_id },
            Err(err) => InvocationOutcome::SubmissionFailed {
                error: err.to_string(),
            },
        }
    }
}

/// Download the object and run the metadata tool in-process.
pub struct LocalExtraction {
    extractor: LocalExtractor,
    sink: Arc<dyn MetadataSink>,
}

impl LocalExtraction {
    pub fn new(extractor: LocalExtractor, sink: Arc<dyn MetadataSink>) -> Self {
        Self { extractor, sink }
    }
}

#[async_trait]
impl ExtractionStrategy for LocalExtraction {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn extract(&self, event: ActionableEvent<'_>) -> InvocationOutcome {
        let object_path = event.object_path();
        match self
            .extractor
            .extract(object_path, event.download_uri())
            .await
        {
            Ok(metadata) => {
                let origin = MetadataOrigin::LocalTool {
                    object_path: object_path.to_string(),
                };
                self.sink.report(&origin, &metadata);
                InvocationOutcome::Extracted { metadata }
            }
            Err(err) => InvocationOutcome::ExtractionFailed {
                error: err.to_string(),
            },
        }
    }
}
