//! Image metadata results
//!
//! Two independent ways of obtaining a [`MetadataResult`] for an image:
//!
//! - [`ingest_callback`] handles the asynchronous result the processing
//!   service posts back after a delegated job. It validates the
//!   `results.original_meta.original_exif` chain, stopping at the first
//!   missing level, and maps the EXIF/IPTC fields.
//! - [`LocalExtractor`] downloads the object into a scratch file and runs
//!   `identify -format` ([`IDENTIFY_FORMAT`]) against it, then parses the
//!   output positionally.
//!
//! Either way the result goes to a [`MetadataSink`] and is then dropped;
//! nothing is stored.
//!
//! ## Example
//!
//! ```
//! use metadata::{ingest_callback, TracingSink};
//!
//! let body = br#"{"results":{"original_meta":{"original_exif":{"Title":"Harbor"}}}}"#;
//! let payload = ingest_callback(body, &TracingSink).unwrap();
//! assert_eq!(payload.metadata.title.as_deref(), Some("Harbor"));
//!
//! let err = ingest_callback(br#"{"results":{}}"#, &TracingSink).unwrap_err();
//! assert_eq!(err.to_string(), "missing original_meta");
//! ```

pub mod config;
pub mod error;
pub mod template;

mod callback;
mod local;
mod sink;
mod types;

pub use crate::callback::{ingest_callback, parse_callback, parse_callback_body, CallbackPayload};
pub use crate::config::{LocalExtractionConfig, DEFAULT_TOOL_PROGRAM};
pub use crate::error::{CallbackSchemaError, ExtractionError};
pub use crate::local::{HttpDownloader, IdentifyTool, LocalExtractor, MetadataTool, ObjectDownloader};
pub use crate::sink::{MetadataSink, TracingSink};
pub use crate::template::{parse_tool_output, IDENTIFY_FORMAT};
pub use crate::types::{MetadataOrigin, MetadataResult};
