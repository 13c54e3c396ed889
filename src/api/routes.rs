use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::process::ProcessNode;

use super::handlers::{
    dry_run, eval_contract, health_check, list_processes, send_message, spawn_process, AppState,
};

pub fn create_api_router(node: Arc<ProcessNode>) -> Router {
    let state = Arc::new(AppState { node });

    let process_routes = Router::new()
        .route("/processes", get(list_processes).post(spawn_process))
        .route("/processes/{id}/eval", post(eval_contract))
        .route("/processes/{id}/messages", post(send_message))
        .route("/processes/{id}/dryrun", post(dry_run))
        .with_state(state);

    Router::new()
        .route("/health", get(health_check))
        .merge(process_routes)
        .layer(CorsLayer::permissive())
}
