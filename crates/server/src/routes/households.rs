use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::{get, post},
};
use db::models::{
    household::{CreateHousehold, Household, UpdateHousehold},
    member::{JoinHousehold, Member, SetMemberRole, UpdateMember},
};
use deployment::Deployment;
use services::services::{
    backup::{HouseholdBackup, export_household},
    households::{HouseholdOverview, HouseholdService, HouseholdWithMember, require_admin},
};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError};

pub async fn create_household(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<CreateHousehold>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<HouseholdWithMember>>), ApiError> {
    let created =
        HouseholdService::create(&deployment.db().pool, &payload.name, &payload.display_name)
            .await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(created))))
}

pub async fn join_household(
    State(deployment): State<DeploymentImpl>,
    Json(payload): Json<JoinHousehold>,
) -> Result<ResponseJson<ApiResponse<HouseholdWithMember>>, ApiError> {
    let joined = HouseholdService::join(
        &deployment.db().pool,
        &payload.invite_code,
        &payload.display_name,
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(joined)))
}

pub async fn get_household(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
) -> Result<ResponseJson<ApiResponse<HouseholdOverview>>, ApiError> {
    let overview = HouseholdService::overview(&deployment.db().pool, member.household_id).await?;
    Ok(ResponseJson(ApiResponse::success(overview)))
}

pub async fn update_household(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Json(payload): Json<UpdateHousehold>,
) -> Result<ResponseJson<ApiResponse<Household>>, ApiError> {
    let household = HouseholdService::rename(&deployment.db().pool, &member, &payload.name).await?;
    Ok(ResponseJson(ApiResponse::success(household)))
}

pub async fn regenerate_invite_code(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
) -> Result<ResponseJson<ApiResponse<Household>>, ApiError> {
    let household =
        HouseholdService::regenerate_invite_code(&deployment.db().pool, &member).await?;
    Ok(ResponseJson(ApiResponse::success(household)))
}

pub async fn list_members(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
) -> Result<ResponseJson<ApiResponse<Vec<Member>>>, ApiError> {
    let members = Member::find_by_household_id(&deployment.db().pool, member.household_id).await?;
    Ok(ResponseJson(ApiResponse::success(members)))
}

pub async fn update_member(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, member_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateMember>,
) -> Result<ResponseJson<ApiResponse<Member>>, ApiError> {
    let updated =
        HouseholdService::update_member(&deployment.db().pool, &member, member_id, &payload)
            .await?;
    Ok(ResponseJson(ApiResponse::success(updated)))
}

pub async fn remove_member(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, member_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    HouseholdService::remove_member(&deployment.db().pool, &member, member_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

pub async fn set_member_role(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, member_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<SetMemberRole>,
) -> Result<ResponseJson<ApiResponse<Member>>, ApiError> {
    let updated =
        HouseholdService::set_role(&deployment.db().pool, &member, member_id, payload.role).await?;
    Ok(ResponseJson(ApiResponse::success(updated)))
}

/// Full JSON backup of the household; admins only.
pub async fn export(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
) -> Result<ResponseJson<ApiResponse<HouseholdBackup>>, ApiError> {
    require_admin(&member)?;
    let backup = export_household(&deployment.db().pool, member.household_id).await?;
    Ok(ResponseJson(ApiResponse::success(backup)))
}

/// Routes that do not need an existing membership.
pub fn router() -> Router<DeploymentImpl> {
    Router::new()
        .route("/households", post(create_household))
        .route("/households/join", post(join_household))
}

/// Routes nested under `/households/{household_id}`.
pub fn scoped_router() -> Router<DeploymentImpl> {
    Router::new()
        .route("/", get(get_household).patch(update_household))
        .route("/invite-code", post(regenerate_invite_code))
        .route("/members", get(list_members))
        .route(
            "/members/{member_id}",
            axum::routing::patch(update_member).delete(remove_member),
        )
        .route("/members/{member_id}/role", post(set_member_role))
        .route("/export", get(export))
}
