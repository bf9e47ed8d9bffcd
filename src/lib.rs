//! Workspace umbrella crate for the image metadata pipeline.
//!
//! An invocation starts with a storage-change notification and ends with
//! exactly one [`InvocationOutcome`] on its [`CompletionSignal`]:
//!
//! 1. [`event::classify_json`] turns the notification into a
//!    [`ClassifiedEvent`]. Deleted and ignored objects stop here.
//! 2. The configured [`ExtractionStrategy`] handles created images, either
//!    [`RemoteExtraction`] (submit a job, metadata arrives later through
//!    [`metadata::ingest_callback`]) or [`LocalExtraction`] (download and run
//!    `identify` in-process).
//! 3. The outcome is sent to the host, which turns it into a response.
//!
//! Nothing is kept between invocations.
//!
//! ## Example
//!
//! ```
//! use imgmeta::{
//!     completion_channel, handle_notification, ActionableEvent, ExtractionStrategy,
//!     InvocationOutcome,
//! };
//! use event::EventKind;
//!
//! struct Unreachable;
//!
//! #[async_trait::async_trait]
//! impl ExtractionStrategy for Unreachable {
//!     fn name(&self) -> &'static str { "unreachable" }
//!     async fn extract(&self, _: ActionableEvent<'_>) -> InvocationOutcome {
//!         unreachable!("deleted objects never reach a strategy")
//!     }
//! }
//!
//! # tokio_test_block_on(async {
//! let payload = serde_json::json!({
//!     "name": "photos/a.jpg",
//!     "contentType": "image/jpeg",
//!     "resourceState": "not_exists"
//! });
//! let (done, completion) = completion_channel();
//! handle_notification(&payload, &Unreachable, done).await;
//! assert_eq!(
//!     completion.await.unwrap(),
//!     InvocationOutcome::Skipped { kind: EventKind::Deleted }
//! );
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

pub mod config;

mod pipeline;
mod strategy;

pub use event::{ClassifiedEvent, EventKind, StorageChangeNotification};
pub use metadata::{MetadataOrigin, MetadataResult, MetadataSink, TracingSink};

pub use crate::config::{ConfigLoadError, PipelineConfig, StrategyKind};
pub use crate::pipeline::{
    completion_channel, handle_notification, handle_storage_notification, process_event,
    Completion, CompletionSignal, InvocationOutcome,
};
pub use crate::strategy::{ActionableEvent, ExtractionStrategy, LocalExtraction, RemoteExtraction};
