use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, put},
};
use db::models::{
    guideline::{ItemGuideline, ReplaceGuidelines},
    inventory_item::{CreateInventoryItem, InventoryItem, UpdateInventoryItem},
    member::Member,
};
use deployment::Deployment;
use services::services::inventory::{InventoryItemDetails, InventoryService};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError};

/// Rejects photo references that were never uploaded.
async fn ensure_photo_exists(
    deployment: &DeploymentImpl,
    photo: Option<&str>,
) -> Result<(), ApiError> {
    match photo {
        Some(name) if !deployment.photo_store().exists(name).await => Err(ApiError::BadRequest(
            format!("photo '{name}' has not been uploaded"),
        )),
        _ => Ok(()),
    }
}

pub async fn get_items(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
) -> Result<ResponseJson<ApiResponse<Vec<InventoryItem>>>, ApiError> {
    let items = InventoryService::list(&deployment.db().pool, member.household_id).await?;
    Ok(ResponseJson(ApiResponse::success(items)))
}

pub async fn create_item(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Json(payload): Json<CreateInventoryItem>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<InventoryItem>>), ApiError> {
    ensure_photo_exists(&deployment, payload.photo.as_deref()).await?;
    let item = InventoryService::create(&deployment.db().pool, &member, &payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(item))))
}

pub async fn get_item(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<InventoryItemDetails>>, ApiError> {
    let item = InventoryService::get(&deployment.db().pool, member.household_id, item_id).await?;
    Ok(ResponseJson(ApiResponse::success(item)))
}

pub async fn update_item(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, item_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateInventoryItem>,
) -> Result<ResponseJson<ApiResponse<InventoryItem>>, ApiError> {
    ensure_photo_exists(&deployment, payload.photo.as_deref()).await?;
    let item = InventoryService::update(&deployment.db().pool, &member, item_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(item)))
}

pub async fn delete_item(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, item_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    InventoryService::delete(&deployment.db().pool, &member, item_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn replace_guidelines(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, item_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ReplaceGuidelines>,
) -> Result<ResponseJson<ApiResponse<Vec<ItemGuideline>>>, ApiError> {
    let guidelines = InventoryService::replace_guidelines(
        &deployment.db().pool,
        &member,
        item_id,
        &payload.guidelines,
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(guidelines)))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new()
        .route("/items", get(get_items).post(create_item))
        .route(
            "/items/{item_id}",
            get(get_item).patch(update_item).delete(delete_item),
        )
        .route("/items/{item_id}/guidelines", put(replace_guidelines))
}
