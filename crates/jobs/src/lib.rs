//! Delegated metadata extraction jobs
//!
//! This crate talks to the external image processing service. Given the
//! download URI of an image it builds a job, POSTs it, and reads the
//! synchronous acknowledgement. The service does the real work later and posts
//! the result to the callback URL in the job; this crate never sees it.
//!
//! A few quirks of the service are baked in:
//!
//! - The body is a form with a single `json` field holding the job as JSON
//!   text, not a JSON request body.
//! - `src` must be percent-encoded exactly once, like `encodeURIComponent`.
//! - Success is a 2xx status *and* no `results.error` in the body.
//!
//! Nothing is retried and nothing is remembered. Each failure is logged with
//! `tracing` and handed back as a [`JobError`].
//!
//! ## Example
//!
//! ```no_run
//! use jobs::{JobClient, JobClientConfig};
//!
//! # async fn run() -> Result<(), jobs::JobError> {
//! let client = JobClient::new(JobClientConfig {
//!     application_id: "my-app".into(),
//!     postback_url: "https://example.com/callback".into(),
//!     ..Default::default()
//! })?;
//!
//! let ack = client
//!     .submit("photos/a.jpg", Some("https://storage.example.com/a.jpg?alt=media"))
//!     .await?;
//! println!("job id: {:?}", ack.job_id);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod request;

mod client;

pub use crate::client::{parse_acknowledgement, JobAcknowledgement, JobClient};
pub use crate::config::{JobClientConfig, DEFAULT_API_VERSION, DEFAULT_ENDPOINT};
pub use crate::error::JobError;
pub use crate::request::{encode_source_uri, ExtractionJobRequest, PreProcessOptions, FORM_FIELD};
