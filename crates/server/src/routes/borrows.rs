use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, post},
};
use chrono::Utc;
use db::models::{
    borrow_request::{
        BorrowDecision, BorrowFilter, BorrowRequest, BorrowRequestDetails, CreateBorrowRequest,
    },
    member::Member,
};
use deployment::Deployment;
use services::services::{borrow::BorrowService, guidelines::ReturnSubmission};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError};

pub async fn get_borrows(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Query(filter): Query<BorrowFilter>,
) -> Result<ResponseJson<ApiResponse<Vec<BorrowRequest>>>, ApiError> {
    let requests = BorrowService::list(&deployment.db().pool, member.household_id, &filter).await?;
    Ok(ResponseJson(ApiResponse::success(requests)))
}

pub async fn create_borrow(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Json(payload): Json<CreateBorrowRequest>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<BorrowRequest>>), ApiError> {
    let request = BorrowService::create(
        &deployment.db().pool,
        &member,
        &payload,
        Utc::now().date_naive(),
    )
    .await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(request))))
}

pub async fn get_borrow(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, request_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<BorrowRequestDetails>>, ApiError> {
    let details =
        BorrowService::details(&deployment.db().pool, member.household_id, request_id).await?;
    Ok(ResponseJson(ApiResponse::success(details)))
}

pub async fn approve_borrow(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, request_id)): Path<(Uuid, Uuid)>,
    payload: Option<Json<BorrowDecision>>,
) -> Result<ResponseJson<ApiResponse<BorrowRequest>>, ApiError> {
    let note = payload.and_then(|Json(decision)| decision.note);
    let request =
        BorrowService::approve(&deployment.db().pool, &member, request_id, note.as_deref())
            .await?;
    Ok(ResponseJson(ApiResponse::success(request)))
}

pub async fn reject_borrow(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, request_id)): Path<(Uuid, Uuid)>,
    payload: Option<Json<BorrowDecision>>,
) -> Result<ResponseJson<ApiResponse<BorrowRequest>>, ApiError> {
    let note = payload.and_then(|Json(decision)| decision.note);
    let request =
        BorrowService::reject(&deployment.db().pool, &member, request_id, note.as_deref())
            .await?;
    Ok(ResponseJson(ApiResponse::success(request)))
}

pub async fn activate_borrow(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, request_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<BorrowRequest>>, ApiError> {
    let request = BorrowService::activate(&deployment.db().pool, &member, request_id).await?;
    Ok(ResponseJson(ApiResponse::success(request)))
}

pub async fn cancel_borrow(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, request_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<BorrowRequest>>, ApiError> {
    let request = BorrowService::cancel(&deployment.db().pool, &member, request_id).await?;
    Ok(ResponseJson(ApiResponse::success(request)))
}

pub async fn return_borrow(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, request_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ReturnSubmission>,
) -> Result<ResponseJson<ApiResponse<BorrowRequestDetails>>, ApiError> {
    let details = BorrowService::submit_return(
        &deployment.db().pool,
        deployment.photo_store(),
        &member,
        request_id,
        &payload,
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(details)))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new()
        .route("/borrows", get(get_borrows).post(create_borrow))
        .route("/borrows/{request_id}", get(get_borrow))
        .route("/borrows/{request_id}/approve", post(approve_borrow))
        .route("/borrows/{request_id}/reject", post(reject_borrow))
        .route("/borrows/{request_id}/activate", post(activate_borrow))
        .route("/borrows/{request_id}/cancel", post(cancel_borrow))
        .route("/borrows/{request_id}/return", post(return_borrow))
}
