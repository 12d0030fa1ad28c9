use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::dto::{CreateTaskRequest, DeleteTaskRequest, SyncTaskRecord};
use super::repo_types::Task;
use super::services;
use crate::{auth::extractors::AuthUser, error::AppError, extract::AppJson, state::AppState};

pub fn task_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/tasks",
            get(list_tasks).post(create_task).delete(delete_task),
        )
        .route(
            "/tasks/",
            get(list_tasks).post(create_task).delete(delete_task),
        )
        .route("/tasks/sync", post(sync_tasks))
}

#[instrument(skip(state, auth, payload), fields(user_id = %auth.user_id))]
pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(payload): AppJson<CreateTaskRequest>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let task = services::create_task(&state, auth.user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

#[instrument(skip(state, auth), fields(user_id = %auth.user_id))]
pub async fn list_tasks(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<Task>>, AppError> {
    Ok(Json(services::list_tasks(&state, auth.user_id).await?))
}

#[instrument(skip(state, auth), fields(user_id = %auth.user_id))]
pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(payload): AppJson<DeleteTaskRequest>,
) -> Result<Json<bool>, AppError> {
    services::delete_task(&state, auth.user_id, payload.task_id).await?;
    Ok(Json(true))
}

#[instrument(skip(state, auth, records), fields(user_id = %auth.user_id, count = records.len()))]
pub async fn sync_tasks(
    State(state): State<AppState>,
    auth: AuthUser,
    AppJson(records): AppJson<Vec<SyncTaskRecord>>,
) -> Result<(StatusCode, Json<Vec<Task>>), AppError> {
    let committed = services::sync_tasks(&state, auth.user_id, records).await?;
    Ok((StatusCode::CREATED, Json(committed)))
}
