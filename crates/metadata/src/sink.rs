use tracing::info;

use crate::types::{MetadataOrigin, MetadataResult};

/// Receives every extracted [`MetadataResult`].
///
/// Implementations must not block for long; they run inside request handling.
pub trait MetadataSink: Send + Sync {
    fn report(&self, origin: &MetadataOrigin, metadata: &MetadataResult);
}

/// Default sink: one structured log line per result.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl MetadataSink for TracingSink {
    fn report(&self, origin: &MetadataOrigin, metadata: &MetadataResult) {
        let raw_fields = metadata.raw.len();
        match origin {
            MetadataOrigin::Callback { job_id } => info!(
                origin = "callback",
                job_id = ?job_id,
                title = ?metadata.title,
                description = ?metadata.description,
                headline = ?metadata.headline,
                caption_abstract = ?metadata.caption_abstract,
                keywords = ?metadata.keywords,
                raw_fields,
                "metadata_extracted"
            ),
            MetadataOrigin::LocalTool { object_path } => info!(
                origin = "local_tool",
                object_path = %object_path,
                title = ?metadata.title,
                headline = ?metadata.headline,
                caption_abstract = ?metadata.caption_abstract,
                keywords = ?metadata.keywords,
                "metadata_extracted"
            ),
        }
    }
}
