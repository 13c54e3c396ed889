use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::process::{Contract, DeliveryResult, Message, ProcessError, ProcessId, ProcessInfo, ProcessNode};

pub struct AppState {
    pub node: Arc<ProcessNode>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SpawnRequest {
    pub label: String,
    #[serde(default)]
    pub owner: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SpawnResponse {
    pub id: ProcessId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EvalRequest {
    #[serde(default)]
    pub contract: Contract,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EvalResponse {
    pub output: serde_json::Value,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(err: ProcessError) -> ApiError {
    let status = match &err {
        ProcessError::NotFound(_) => StatusCode::NOT_FOUND,
        ProcessError::NotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
        ProcessError::UnknownContract(_) | ProcessError::ReadOnly(_) => StatusCode::BAD_REQUEST,
        ProcessError::Stopped(_) => StatusCode::GONE,
        ProcessError::Storage(e) => {
            tracing::error!("Process storage failure: {:#}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

/// Spawn a new process
pub async fn spawn_process(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SpawnRequest>,
) -> Result<(StatusCode, Json<SpawnResponse>), ApiError> {
    if payload.label.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Label cannot be empty".to_string(),
            }),
        ));
    }

    let id = state.node.spawn(&payload.label, payload.owner.as_deref());
    Ok((StatusCode::CREATED, Json(SpawnResponse { id })))
}

/// List spawned processes
pub async fn list_processes(State(state): State<Arc<AppState>>) -> Json<Vec<ProcessInfo>> {
    Json(state.node.processes())
}

/// Evaluate a contract inside a process
pub async fn eval_contract(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(payload): Json<EvalRequest>,
) -> Result<Json<EvalResponse>, ApiError> {
    let tables = state
        .node
        .eval(&ProcessId::from(id), payload.contract)
        .await
        .map_err(error_response)?;

    Ok(Json(EvalResponse {
        output: serde_json::Value::from(tables),
    }))
}

/// Deliver a message to a process
pub async fn send_message(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(message): Json<Message>,
) -> Result<Json<DeliveryResult>, ApiError> {
    state
        .node
        .send(&ProcessId::from(id), message)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Deliver a read-only message to a process
pub async fn dry_run(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(message): Json<Message>,
) -> Result<Json<DeliveryResult>, ApiError> {
    state
        .node
        .dry_run(&ProcessId::from(id), message)
        .await
        .map(Json)
        .map_err(error_response)
}

/// Health check endpoint
pub async fn health_check() -> Json<SuccessResponse> {
    Json(SuccessResponse {
        message: "OK".to_string(),
    })
}
