//! Server initialization and routing
//!
//! This module handles the Axum server setup including:
//! - Router configuration for the pipeline endpoints and probes
//! - Middleware stack (logging, request ids, compression, CORS, timeouts)
//! - Graceful shutdown handling

use crate::config::{LogFormat, ServerConfig};
use crate::middleware::{log_requests, request_id};
use crate::routes::{api_info, callback, health, not_found, notifications};
use crate::state::ServerState;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

/// Build the Axum router with all routes and middleware
///
/// - `GET /`, `/health`, `/ready`: service info and probes
/// - `POST /notifications`: one pipeline invocation per request
/// - `POST <callback_path>`: processing-service results
///
/// Middleware, outermost first: trace, request id, request logging, CORS,
/// compression. Only the probes carry the request timeout and only
/// `/notifications` carries the body limit; callbacks are always read whole.
pub fn build_router(state: Arc<ServerState>) -> Router {
    // CORS layer
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    let probes = Router::new()
        .route("/", get(api_info))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            state.config.timeout(),
        ));

    // Invocations bound their own run time through the collaborator timeouts.
    let notification_routes = Router::new()
        .route("/notifications", post(notifications::receive_notification))
        .layer(DefaultBodyLimit::max(state.config.max_body_size()));

    let callback_routes = Router::new()
        .route(
            state.config.callback_path.as_str(),
            post(callback::receive_callback),
        )
        .layer(DefaultBodyLimit::disable());

    Router::new()
        .merge(probes)
        .merge(notification_routes)
        .merge(callback_routes)
        .fallback(not_found)
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(from_fn(log_requests))
        .layer(from_fn(request_id))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Install the global `tracing` subscriber.
///
/// Does nothing if one is already installed (tests, embedding hosts).
pub fn init_tracing(config: &ServerConfig) {
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|err| {
        eprintln!("invalid log_level {:?} ({err}), using info", config.log_level);
        EnvFilter::new("info")
    });

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = match config.log_format {
        LogFormat::Json => builder
            .with_thread_ids(true)
            .with_thread_names(true)
            .json()
            .try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Start the HTTP server
///
/// Builds the configured extraction strategy, binds the configured address
/// and serves until SIGTERM or Ctrl+C.
///
/// # Example
///
/// ```rust,no_run
/// use server::ServerConfig;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let config = ServerConfig::load()?;
///     server::start_server(config).await?;
///     Ok(())
/// }
/// ```
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    init_tracing(&config);

    let state = Arc::new(ServerState::new(config.clone())?);
    let strategy = state.strategy.name();
    let app = build_router(state);

    let addr: SocketAddr = config.socket_addr()?;

    tracing::info!(
        %addr,
        strategy,
        callback_path = %config.callback_path,
        timeout_secs = config.timeout_secs,
        max_body_mb = config.max_body_size_mb,
        cors = config.enable_cors,
        "server_starting"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server_stopped");
    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
