//! HTTP server implementation using Axum.

use crate::error::{Error, Result};
use crate::result::ExecutionResult;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct ExecuteRequest {
    pub code: String,
}

/// Build the router with CORS limited to the configured origins.
pub fn router(state: AppState) -> Result<Router> {
    let origins = state
        .config()
        .allowed_origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|_| Error::InvalidOrigin(origin.clone()))
        })
        .collect::<Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(Router::new()
        .route("/api/execute", post(execute))
        .route("/health", get(health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Run the HTTP server on the given port until Ctrl-C or SIGTERM.
pub async fn run_server(port: u16, state: AppState) -> Result<()> {
    let app = router(state)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| Error::Bind { addr, source })?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(Error::Serve)
}

async fn health() -> &'static str {
    "OK"
}

async fn execute(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ExecuteRequest>, JsonRejection>,
) -> (StatusCode, Json<ExecutionResult>) {
    let req = match payload {
        Ok(Json(req)) => req,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Rejected execute request");
            return (
                StatusCode::BAD_REQUEST,
                Json(ExecutionResult::InfrastructureError(rejection.body_text())),
            );
        }
    };

    info!(code_len = req.code.len(), "POST /api/execute");
    match state.executor.try_execute(&req.code).await {
        Ok(result) => {
            info!(status = result.status(), "POST /api/execute - done");
            (StatusCode::OK, Json(result))
        }
        Err(e) => {
            warn!(error = %e, "POST /api/execute - workspace failure");
            (
                StatusCode::BAD_REQUEST,
                Json(ExecutionResult::InfrastructureError(e.to_string())),
            )
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
