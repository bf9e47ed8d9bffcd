//! imgmeta server - HTTP host for the image metadata pipeline
//!
//! Hosts the pipeline invocations: every storage-change notification posted
//! to `/notifications` runs one invocation with the configured extraction
//! strategy, and the processing service's results arrive on the callback
//! route.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```
//!
//! # API Endpoints
//!
//! - `GET /` - Service information and active strategy
//! - `GET /health` - Liveness probe
//! - `GET /ready` - Readiness probe
//! - `POST /notifications` - Storage-change notification (bare object
//!   resource, background event or Pub/Sub push envelope). Always 200, empty
//!   body, once the invocation has completed.
//! - `POST /callback` - Processing-service result (path set by
//!   `callback_path`). Always 200, empty body.
//!
//! # Configuration
//!
//! `ServerConfig::load` reads `.env`, then an optional `server.{toml,yaml,json}`,
//! then `IMGMETA_SERVER__*` variables, e.g.
//! `IMGMETA_SERVER__PIPELINE__REMOTE__APPLICATION_ID=my-app` or
//! `IMGMETA_SERVER__PIPELINE_FILE=/etc/imgmeta/pipeline.yaml`.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{LogFormat, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use server::{build_router, init_tracing, start_server};
pub use state::ServerState;
