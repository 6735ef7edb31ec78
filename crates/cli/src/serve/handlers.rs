//! HTTP route handlers: upload/extraction, templates, workflows, audit.

use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use formflow_core::{new_id, Field, Role, Template};
use formflow_engine::EngineError;

use super::state::AppState;
use super::json_error;

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET /health
pub(crate) async fn handle_health() -> impl IntoResponse {
    let response = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(response))
}

/// Map an engine error to its HTTP representation.
fn engine_error_response(err: EngineError) -> Response {
    let (status, message) = match &err {
        EngineError::TemplateNotFound { .. } | EngineError::WorkflowNotFound { .. } => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        EngineError::UnknownField { .. } => (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()),
        EngineError::Conflict { .. } => (StatusCode::CONFLICT, err.to_string()),
        EngineError::Storage(_) => {
            tracing::error!(error = %err, "storage failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal storage error".to_string(),
            )
        }
    };
    json_error(status, &message).into_response()
}

/// POST /api/upload
///
/// Multipart form with a `file` part. The raw document is stored under
/// the upload directory as `{uuid}.pdf` and served back at
/// `/uploads/{filename}`; its extracted template is registered and
/// returned.
pub(crate) async fn handle_upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Response {
    let mut bytes: Option<Vec<u8>> = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some("file") => match field.bytes().await {
                Ok(data) => {
                    bytes = Some(data.to_vec());
                    break;
                }
                Err(e) => {
                    return json_error(
                        StatusCode::BAD_REQUEST,
                        &format!("failed to read upload: {e}"),
                    )
                    .into_response()
                }
            },
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(e) => {
                return json_error(StatusCode::BAD_REQUEST, &format!("invalid multipart: {e}"))
                    .into_response()
            }
        }
    }
    let Some(bytes) = bytes else {
        return json_error(StatusCode::BAD_REQUEST, "missing 'file' part").into_response();
    };

    let stored_name = format!("{}.pdf", new_id());
    let default_role = state.default_role;

    // Extraction walks the whole document; keep it off the async runtime.
    let extracted = {
        let stored_name = stored_name.clone();
        let bytes = bytes.clone();
        tokio::task::spawn_blocking(move || {
            formflow_extract::extract_template(&bytes, &stored_name, default_role)
        })
        .await
    };
    let template = match extracted {
        Ok(Ok(template)) => template,
        Ok(Err(e)) => {
            return json_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                &format!("could not extract form fields: {e}"),
            )
            .into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "extraction task panicked");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "extraction failed")
                .into_response();
        }
    };

    let artifact_path = state.upload_dir.join(&stored_name);
    if let Err(e) = tokio::fs::write(&artifact_path, &bytes).await {
        tracing::error!(error = %e, path = %artifact_path.display(), "failed to store upload");
        return json_error(StatusCode::INTERNAL_SERVER_ERROR, "failed to store upload")
            .into_response();
    }

    match state.engine.create_template(template.clone()).await {
        Ok(()) => {
            tracing::info!(template_id = %template.id, fields = template.fields.len(), "template extracted");
            (StatusCode::OK, Json(template)).into_response()
        }
        Err(e) => engine_error_response(e),
    }
}

/// GET /api/templates/{id}
pub(crate) async fn handle_get_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.engine.template(&id).await {
        Ok(template) => (StatusCode::OK, Json(template)).into_response(),
        Err(e) => engine_error_response(e),
    }
}

/// POST /api/templates/{id}
///
/// Full-document replace. The body carries the complete template
/// including the `version` the editor last saw; a stale version is a
/// 409 and the client must re-fetch.
pub(crate) async fn handle_replace_template(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(template): Json<Template>,
) -> Response {
    let expected_version = template.version;
    match state
        .engine
        .replace_template(&id, expected_version, template)
        .await
    {
        Ok(updated) => (StatusCode::OK, Json(updated)).into_response(),
        Err(e) => engine_error_response(e),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateWorkflowRequest {
    template_id: String,
}

/// POST /api/workflows
pub(crate) async fn handle_create_workflow(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateWorkflowRequest>,
) -> Response {
    match state.engine.create_workflow(&request.template_id).await {
        Ok(workflow) => (StatusCode::CREATED, Json(workflow)).into_response(),
        Err(e) => engine_error_response(e),
    }
}

/// GET /api/workflows/{id}
pub(crate) async fn handle_get_workflow(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    match state.engine.get_workflow(&id).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(e) => engine_error_response(e),
    }
}

#[derive(Deserialize)]
pub(crate) struct SubmitRequest {
    fields: Vec<Field>,
}

/// POST /api/workflows/{id}/submit/{role}
///
/// An unrecognized role segment fails path deserialization and never
/// reaches the engine.
pub(crate) async fn handle_submit(
    State(state): State<Arc<AppState>>,
    Path((id, role)): Path<(String, Role)>,
    Json(request): Json<SubmitRequest>,
) -> Response {
    match state.engine.submit_role(&id, role, request.fields).await {
        Ok(()) => {
            let view = match state.engine.get_workflow(&id).await {
                Ok(view) => view,
                Err(e) => return engine_error_response(e),
            };
            (StatusCode::OK, Json(view)).into_response()
        }
        Err(e) => engine_error_response(e),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AuditRequest {
    workflow_id: String,
    role: Role,
    event: String,
}

/// POST /api/audit
pub(crate) async fn handle_append_audit(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AuditRequest>,
) -> Response {
    match state
        .engine
        .record_audit(&request.workflow_id, request.role, request.event)
        .await
    {
        Ok(entry) => (StatusCode::CREATED, Json(entry)).into_response(),
        Err(e) => engine_error_response(e),
    }
}

/// GET /api/audit/{workflow_id}
pub(crate) async fn handle_audit_trail(
    State(state): State<Arc<AppState>>,
    Path(workflow_id): Path<String>,
) -> Response {
    match state.engine.audit_trail(&workflow_id).await {
        Ok(entries) => (StatusCode::OK, Json(entries)).into_response(),
        Err(e) => engine_error_response(e),
    }
}
