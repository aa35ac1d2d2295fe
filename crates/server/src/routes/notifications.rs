use axum::{
    Extension, Router,
    extract::{Path, Query, State},
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::{
    member::Member,
    notification::{Notification, NotificationSummary},
};
use deployment::Deployment;
use serde::{Deserialize, Serialize};
use services::services::notification::NotificationService;
use ts_rs::TS;
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct NotificationQuery {
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Clone, Serialize, TS)]
pub struct MarkAllReadResponse {
    pub updated: u64,
}

/// The caller's own inbox; notifications are never shown to other members.
pub async fn get_notifications(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Query(query): Query<NotificationQuery>,
) -> Result<ResponseJson<ApiResponse<NotificationSummary>>, ApiError> {
    let summary =
        NotificationService::summary(&deployment.db().pool, member.id, query.unread_only).await?;
    Ok(ResponseJson(ApiResponse::success(summary)))
}

pub async fn mark_read(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, notification_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<Notification>>, ApiError> {
    let notification =
        NotificationService::mark_read(&deployment.db().pool, member.id, notification_id)
            .await?
            .ok_or(ApiError::NotFound("notification not found"))?;
    Ok(ResponseJson(ApiResponse::success(notification)))
}

pub async fn mark_all_read(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
) -> Result<ResponseJson<ApiResponse<MarkAllReadResponse>>, ApiError> {
    let updated = NotificationService::mark_all_read(&deployment.db().pool, member.id).await?;
    Ok(ResponseJson(ApiResponse::success(MarkAllReadResponse {
        updated,
    })))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new()
        .route("/notifications", get(get_notifications))
        .route("/notifications/read-all", post(mark_all_read))
        .route("/notifications/{notification_id}/read", post(mark_read))
}
