use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{delete, get, post, put},
};
use chrono::Utc;
use db::models::{
    member::Member,
    task::{CreateTask, TaskCompletion, TaskFilter, TaskWithRotation, UpdateTask},
    task_dependency::{CreateTaskDependency, TaskDependency},
};
use deployment::Deployment;
use serde::{Deserialize, Serialize};
use services::services::chores::ChoreService;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError};

/// Replaces a chore's rotation; an empty list turns rotation off.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
pub struct SetRotation {
    pub member_ids: Vec<Uuid>,
}

pub async fn get_tasks(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Query(filter): Query<TaskFilter>,
) -> Result<ResponseJson<ApiResponse<Vec<TaskWithRotation>>>, ApiError> {
    let tasks = ChoreService::list(&deployment.db().pool, member.household_id, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(tasks)))
}

pub async fn create_task(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Json(payload): Json<CreateTask>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<TaskWithRotation>>), ApiError> {
    let task = ChoreService::create(&deployment.db().pool, &member, &payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(task))))
}

pub async fn get_task(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, task_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<TaskWithRotation>>, ApiError> {
    let task = ChoreService::get(&deployment.db().pool, member.household_id, task_id).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn update_task(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, task_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateTask>,
) -> Result<ResponseJson<ApiResponse<TaskWithRotation>>, ApiError> {
    let task = ChoreService::update(&deployment.db().pool, &member, task_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn delete_task(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, task_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    ChoreService::delete(&deployment.db().pool, &member, task_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn complete_task(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, task_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<TaskWithRotation>>, ApiError> {
    let task = ChoreService::complete(
        &deployment.db().pool,
        &member,
        task_id,
        Utc::now().date_naive(),
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn reopen_task(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, task_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<TaskWithRotation>>, ApiError> {
    let task = ChoreService::reopen(&deployment.db().pool, &member, task_id).await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn set_rotation(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, task_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<SetRotation>,
) -> Result<ResponseJson<ApiResponse<TaskWithRotation>>, ApiError> {
    let task =
        ChoreService::set_rotation(&deployment.db().pool, &member, task_id, &payload.member_ids)
            .await?;
    Ok(ResponseJson(ApiResponse::success(task)))
}

pub async fn add_dependency(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, task_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<CreateTaskDependency>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<TaskDependency>>), ApiError> {
    let link = ChoreService::add_dependency(
        &deployment.db().pool,
        &member,
        task_id,
        payload.depends_on_id,
    )
    .await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(link))))
}

pub async fn remove_dependency(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, task_id, depends_on_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    ChoreService::remove_dependency(&deployment.db().pool, &member, task_id, depends_on_id)
        .await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn task_history(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, task_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<Vec<TaskCompletion>>>, ApiError> {
    let history = ChoreService::history(&deployment.db().pool, member.household_id, task_id).await?;
    Ok(ResponseJson(ApiResponse::success(history)))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new()
        .route("/tasks", get(get_tasks).post(create_task))
        .route(
            "/tasks/{task_id}",
            get(get_task).patch(update_task).delete(delete_task),
        )
        .route("/tasks/{task_id}/complete", post(complete_task))
        .route("/tasks/{task_id}/reopen", post(reopen_task))
        .route("/tasks/{task_id}/rotation", put(set_rotation))
        .route("/tasks/{task_id}/dependencies", post(add_dependency))
        .route(
            "/tasks/{task_id}/dependencies/{depends_on_id}",
            delete(remove_dependency),
        )
        .route("/tasks/{task_id}/history", get(task_history))
}
