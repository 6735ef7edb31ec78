//! `formflow serve` -- HTTP JSON API for the form workflow engine.
//!
//! Exposes template upload/extraction, workflow lifecycle, and the
//! audit trail as an async HTTP service using `axum` + `tokio`.
//!
//! Endpoints:
//! - GET  /health                              - Server status
//! - POST /api/upload                          - Upload a PDF, extract its template
//! - GET  /api/templates/{id}                  - Fetch a template
//! - POST /api/templates/{id}                  - Replace a template (versioned)
//! - POST /api/workflows                       - Create a workflow from a template
//! - GET  /api/workflows/{id}                  - Workflow with derived progress
//! - POST /api/workflows/{id}/submit/{role}    - Submit one role's fields
//! - POST /api/audit                           - Append an audit event
//! - GET  /api/audit/{workflow_id}             - Audit trail, newest first
//! - GET  /uploads/{filename}                  - Stored document artifacts
//!
//! All API responses use Content-Type: application/json.

mod handlers;
mod state;

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use formflow_core::Role;
use formflow_engine::WorkflowEngine;
use formflow_storage::JsonStore;

use self::handlers::{
    handle_append_audit, handle_audit_trail, handle_create_workflow, handle_get_template,
    handle_get_workflow, handle_health, handle_not_found, handle_replace_template, handle_submit,
    handle_upload,
};
use self::state::AppState;

/// Maximum request body size: 20 MB (bounds document uploads).
const MAX_BODY_SIZE: usize = 20 * 1024 * 1024;

/// Construct a JSON error response with the given status code and message.
fn json_error(status: StatusCode, message: &str) -> impl IntoResponse {
    (status, Json(serde_json::json!({"error": message})))
}

pub(crate) struct ServeOptions {
    pub port: u16,
    pub data: PathBuf,
    pub uploads: PathBuf,
    pub default_role: Role,
}

/// Start the HTTP server: open the data file, create the upload
/// directory, and listen until Ctrl+C.
pub(crate) async fn start_server(options: ServeOptions) -> Result<(), Box<dyn std::error::Error>> {
    let store = JsonStore::open(&options.data).await?;
    tokio::fs::create_dir_all(&options.uploads).await?;

    tracing::info!(data = %options.data.display(), uploads = %options.uploads.display(), "storage ready");

    let state = Arc::new(AppState {
        engine: WorkflowEngine::new(Arc::new(store)),
        upload_dir: options.uploads.clone(),
        default_role: options.default_role,
    });

    // CORS: permissive for local dev.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    let app = Router::new()
        .route("/health", get(handle_health))
        .route("/api/upload", post(handle_upload))
        .route(
            "/api/templates/{id}",
            get(handle_get_template).post(handle_replace_template),
        )
        .route("/api/workflows", post(handle_create_workflow))
        .route("/api/workflows/{id}", get(handle_get_workflow))
        .route("/api/workflows/{id}/submit/{role}", post(handle_submit))
        .route("/api/audit", post(handle_append_audit))
        .route("/api/audit/{workflow_id}", get(handle_audit_trail))
        .nest_service("/uploads", ServeDir::new(&options.uploads))
        .fallback(handle_not_found)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(state);

    let addr = format!("0.0.0.0:{}", options.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server shut down");
    Ok(())
}

/// Wait for a shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
    tracing::info!("received shutdown signal");
}
