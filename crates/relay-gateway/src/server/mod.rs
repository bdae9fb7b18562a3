//! Gateway server setup
//!
//! Provides the HTTP/WebSocket routes, middleware and the serve loop.

mod handler;
mod outbound;
mod state;

pub use handler::ws_handler;
pub use state::GatewayState;

use axum::{extract::State, http::HeaderValue, routing::get, Json, Router};
use relay_common::{AppConfig, AppError, AppResult, CorsConfig};
use serde::Serialize;
use std::future::Future;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Relay occupancy snapshot served on `/stats`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RelayStats {
    /// Open connections, named or not
    pub connections: usize,
    /// Connections holding a display name
    pub users: usize,
}

/// Create the gateway router
pub fn create_router(ws_path: &str) -> Router<GatewayState> {
    Router::new()
        .route(ws_path, get(ws_handler))
        .route("/health", get(health_check))
        .route("/stats", get(stats))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Connection counts
async fn stats(State(state): State<GatewayState>) -> Json<RelayStats> {
    let registry = state.lifecycle().registry();
    Json(RelayStats {
        connections: registry.count(),
        users: registry.named_count(),
    })
}

/// Build the complete application
pub fn create_app(state: GatewayState) -> Router {
    let config = state.config();
    let router = create_router(&config.server.ws_path).layer(TraceLayer::new_for_http());

    let router = if config.cors.enabled {
        router.layer(create_cors_layer(&config.cors))
    } else {
        router
    };

    router.with_state(state)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &CorsConfig) -> CorsLayer {
    if config.allowed_origins.is_empty() {
        tracing::warn!("CORS: Allowing any origin. Configure ALLOWED_ORIGINS to restrict.");
        return CorsLayer::new().allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    tracing::info!("CORS: Allowing {} configured origins", origins.len());
    CorsLayer::new().allow_origin(AllowOrigin::list(origins))
}

/// Serve on an already bound listener until `signal` resolves
///
/// When the signal fires every live connection is closed with `GoingAway`
/// before the listener stops.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    state: GatewayState,
    signal: F,
) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr().map_err(AppError::Server)?;
    tracing::info!("Relay listening on ws://{}{}", addr, state.config().server.ws_path);

    let lifecycle = state.lifecycle().clone();
    let app = create_app(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            signal.await;
            let closed = lifecycle.shutdown();
            tracing::info!(closed = closed, "Relay shutting down");
        })
        .await
        .map_err(AppError::Server)?;

    tracing::info!("Relay shut down gracefully");
    Ok(())
}

/// Run the complete relay server with configuration
pub async fn run(config: AppConfig) -> AppResult<()> {
    let addr = config.server.address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| AppError::Bind {
            addr: addr.clone(),
            source,
        })?;

    serve_with_shutdown(listener, GatewayState::new(config), shutdown_signal()).await
}

/// Wait for Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
