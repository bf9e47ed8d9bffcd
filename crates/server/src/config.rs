use imgmeta::{ConfigLoadError, PipelineConfig};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Routes the callback path may not take.
const RESERVED_PATHS: [&str; 4] = ["/", "/health", "/ready", "/notifications"];

/// Log output format
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// Human-readable, multi-line
    Pretty,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds for the probe routes
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum notification body size in MB
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,

    /// Enable CORS
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Log level (any `EnvFilter` directive)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Route the processing service posts results to. Must match the path of
    /// the configured `postback_url`.
    #[serde(default = "default_callback_path")]
    pub callback_path: String,

    /// YAML pipeline config. When set it replaces `pipeline`.
    #[serde(default)]
    pub pipeline_file: Option<PathBuf>,

    /// Inline pipeline config
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            max_body_size_mb: default_max_body_size_mb(),
            enable_cors: default_true(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            callback_path: default_callback_path(),
            pipeline_file: None,
            pipeline: PipelineConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from `.env`, an optional `server.*` file and
    /// `IMGMETA_SERVER__*` environment variables, in increasing precedence.
    pub fn load() -> anyhow::Result<Self> {
        // A missing .env is normal outside development.
        let _ = dotenvy::dotenv();

        let builder = config::Config::builder()
            // Load from file if exists
            .add_source(config::File::with_name("server").required(false))
            // Override with environment variables
            .add_source(config::Environment::with_prefix("IMGMETA_SERVER").separator("__"));

        let mut config: ServerConfig = builder.build()?.try_deserialize()?;
        config.pipeline = config.resolve_pipeline()?;
        config.validate()?;
        Ok(config)
    }

    /// The effective pipeline config, read from `pipeline_file` when set.
    pub fn resolve_pipeline(&self) -> Result<PipelineConfig, ConfigLoadError> {
        match &self.pipeline_file {
            Some(path) => PipelineConfig::from_file(path),
            None => {
                self.pipeline.validate()?;
                Ok(self.pipeline.clone())
            }
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if !self.callback_path.starts_with('/') {
            anyhow::bail!(
                "callback_path must start with '/', got {:?}",
                self.callback_path
            );
        }
        if RESERVED_PATHS.contains(&self.callback_path.as_str()) {
            anyhow::bail!("callback_path {:?} collides with a built-in route", self.callback_path);
        }
        Ok(())
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        Ok(addr_str.parse()?)
    }

    /// Get request timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get max body size in bytes
    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_body_size_mb() -> usize {
    2
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_callback_path() -> String {
    "/callback".to_string()
}
