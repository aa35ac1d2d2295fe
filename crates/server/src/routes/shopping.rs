use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::{
    member::Member,
    shopping::{
        CreateShoppingItem, CreateShoppingList, SetItemChecked, ShoppingItem, ShoppingList,
        UpdateShoppingItem, UpdateShoppingList,
    },
};
use deployment::Deployment;
use serde::Deserialize;
use services::services::shopping::{ClearCheckedResponse, ShoppingListWithItems, ShoppingService};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError};

#[derive(Debug, Default, Deserialize)]
pub struct ListsQuery {
    #[serde(default)]
    pub include_archived: bool,
}

pub async fn get_lists(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Query(query): Query<ListsQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<ShoppingList>>>, ApiError> {
    let lists =
        ShoppingService::lists(&deployment.db().pool, member.household_id, query.include_archived)
            .await?;
    Ok(ResponseJson(ApiResponse::success(lists)))
}

pub async fn create_list(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Json(payload): Json<CreateShoppingList>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<ShoppingList>>), ApiError> {
    let list = ShoppingService::create_list(&deployment.db().pool, &member, &payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(list))))
}

pub async fn get_list(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, list_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<ShoppingListWithItems>>, ApiError> {
    let list =
        ShoppingService::list_with_items(&deployment.db().pool, member.household_id, list_id)
            .await?;
    Ok(ResponseJson(ApiResponse::success(list)))
}

pub async fn update_list(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, list_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateShoppingList>,
) -> Result<ResponseJson<ApiResponse<ShoppingList>>, ApiError> {
    let list =
        ShoppingService::update_list(&deployment.db().pool, &member, list_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(list)))
}

pub async fn delete_list(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, list_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    ShoppingService::delete_list(&deployment.db().pool, &member, list_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn add_item(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, list_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<CreateShoppingItem>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<ShoppingItem>>), ApiError> {
    let item = ShoppingService::add_item(&deployment.db().pool, &member, list_id, &payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(item))))
}

pub async fn update_item(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, list_id, item_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(payload): Json<UpdateShoppingItem>,
) -> Result<ResponseJson<ApiResponse<ShoppingItem>>, ApiError> {
    let item =
        ShoppingService::update_item(&deployment.db().pool, &member, list_id, item_id, &payload)
            .await?;
    Ok(ResponseJson(ApiResponse::success(item)))
}

pub async fn set_checked(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, list_id, item_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(payload): Json<SetItemChecked>,
) -> Result<ResponseJson<ApiResponse<ShoppingItem>>, ApiError> {
    let item = ShoppingService::set_checked(
        &deployment.db().pool,
        &member,
        list_id,
        item_id,
        payload.checked,
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(item)))
}

pub async fn delete_item(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, list_id, item_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    ShoppingService::delete_item(&deployment.db().pool, &member, list_id, item_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn clear_checked(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, list_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<ClearCheckedResponse>>, ApiError> {
    let removed = ShoppingService::clear_checked(&deployment.db().pool, &member, list_id).await?;
    Ok(ResponseJson(ApiResponse::success(ClearCheckedResponse {
        removed,
    })))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new()
        .route("/lists", get(get_lists).post(create_list))
        .route(
            "/lists/{list_id}",
            get(get_list).patch(update_list).delete(delete_list),
        )
        .route("/lists/{list_id}/items", post(add_item))
        .route(
            "/lists/{list_id}/items/{item_id}",
            axum::routing::patch(update_item).delete(delete_item),
        )
        .route(
            "/lists/{list_id}/items/{item_id}/checked",
            axum::routing::put(set_checked),
        )
        .route("/lists/{list_id}/clear-checked", post(clear_checked))
}
