//! HTTP handlers over the task orchestrator.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use msa_core::models::{CoreErrorKind, TaskId, TaskState};
use msa_core::orchestration::{
    HistoryView, ProgressSink, ProgressStage, SubmitRequest, TaskOutcome,
};
use msa_core::session::SessionContext;

use crate::error::ApiError;
use crate::server::AppState;

/// Carries the opaque session token in both directions.
pub const SESSION_HEADER: &str = "x-msa-session";

#[derive(Debug, Default, Deserialize)]
pub struct AlignParams {
    #[serde(default)]
    pub tool: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AlignResponse {
    pub state: TaskState,
    pub task_id: Option<TaskId>,
    pub session: Option<String>,
    pub status: String,
    pub result_text: String,
    /// Base name of the result file, downloadable from `/artifacts/{name}`.
    pub artifact: Option<String>,
    pub detail: Option<String>,
}

impl From<TaskOutcome> for AlignResponse {
    fn from(outcome: TaskOutcome) -> Self {
        Self {
            state: outcome.state,
            session: outcome.session.token().map(str::to_string),
            task_id: outcome.task_id,
            status: outcome.status,
            result_text: outcome.result_text,
            artifact: outcome.artifact.map(|artifact| artifact.file_name()),
            detail: outcome.detail,
        }
    }
}

/// Writes each checkpoint of a submission to the service log.
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn report(&self, task_id: &TaskId, stage: ProgressStage) {
        tracing::info!(
            task_id = task_id.as_str(),
            percent = percent(stage),
            "{}",
            stage.description()
        );
    }
}

fn percent(stage: ProgressStage) -> u8 {
    (stage.fraction() * 100.0).round() as u8
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

pub async fn align(
    State(state): State<AppState>,
    Query(params): Query<AlignParams>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let session = session_from_headers(&headers);
    let file = (!body.is_empty()).then(|| body.to_vec());

    let outcome = state
        .orchestrator
        .submit_with_progress(
            SubmitRequest::new(file, params.tool, session),
            Arc::new(TracingProgress),
        )
        .await;
    let status = outcome_status(&outcome);
    let token = outcome.session.token().and_then(|t| HeaderValue::from_str(t).ok());

    let mut response = (status, Json(AlignResponse::from(outcome))).into_response();
    if let Some(token) = token {
        response.headers_mut().insert(SESSION_HEADER, token);
    }
    response
}

pub async fn history(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let view = state
        .orchestrator
        .list_recent(&session_from_headers(&headers))
        .await;
    let status = match view {
        HistoryView::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::OK,
    };

    (
        status,
        [(CONTENT_TYPE, "text/plain; charset=utf-8")],
        view.to_string(),
    )
        .into_response()
}

pub async fn artifact(
    State(state): State<AppState>,
    Path(file_name): Path<String>,
) -> Result<Response, ApiError> {
    let artifact = state
        .orchestrator
        .artifacts()
        .resolve_output(&file_name)
        .ok_or_else(|| ApiError::NotFound(format!("no result named '{file_name}'")))?;

    let bytes = tokio::fs::read(artifact.path()).await.map_err(|error| {
        tracing::error!(path = %artifact.display(), %error, "failed to read artifact for download");
        ApiError::Internal(format!("failed to read '{file_name}'"))
    })?;

    let disposition = HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\""))
        .map_err(|error| ApiError::Internal(error.to_string()))?;

    Ok((
        [
            (CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8")),
            (CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

fn session_from_headers(headers: &HeaderMap) -> SessionContext {
    SessionContext::from_token(
        headers
            .get(SESSION_HEADER)
            .and_then(|value| value.to_str().ok()),
    )
}

fn outcome_status(outcome: &TaskOutcome) -> StatusCode {
    match (outcome.state, outcome.error_kind) {
        (TaskState::Completed, _) => StatusCode::OK,
        (TaskState::Rejected, _) => StatusCode::BAD_REQUEST,
        (_, Some(CoreErrorKind::ToolNotFound)) => StatusCode::SERVICE_UNAVAILABLE,
        (_, Some(CoreErrorKind::ToolExecution)) => StatusCode::UNPROCESSABLE_ENTITY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
