use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use imgmeta::{ExtractionStrategy, MetadataSink, TracingSink};
use std::sync::Arc;

/// Shared application state
///
/// Everything here is read-only after startup; invocations share nothing
/// mutable.
#[derive(Clone)]
pub struct ServerState {
    /// Server configuration
    pub config: Arc<ServerConfig>,

    /// The one active extraction strategy
    pub strategy: Arc<dyn ExtractionStrategy>,

    /// Receives metadata from callbacks and from local extraction
    pub sink: Arc<dyn MetadataSink>,
}

impl ServerState {
    /// Build state from config, with results logged through [`TracingSink`].
    pub fn new(config: ServerConfig) -> ServerResult<Self> {
        config
            .validate()
            .map_err(|e| ServerError::Config(e.to_string()))?;
        let sink: Arc<dyn MetadataSink> = Arc::new(TracingSink);
        let pipeline = config.resolve_pipeline()?;
        let strategy = pipeline.build_strategy(sink.clone())?;
        Ok(Self::with_parts(config, strategy, sink))
    }

    /// Build state around an existing strategy and sink.
    pub fn with_parts(
        config: ServerConfig,
        strategy: Arc<dyn ExtractionStrategy>,
        sink: Arc<dyn MetadataSink>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            strategy,
            sink,
        }
    }
}
