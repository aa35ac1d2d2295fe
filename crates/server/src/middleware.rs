use std::collections::HashMap;

use axum::{
    extract::{Path, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use db::models::member::Member;
use deployment::Deployment;
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError};

pub const MEMBER_HEADER: &str = "x-member-id";

pub fn member_id_from_headers(headers: &HeaderMap) -> Result<Uuid, ApiError> {
    headers
        .get(MEMBER_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
        .ok_or(ApiError::Unauthorized)
}

/// Resolves `X-Member-Id` against the household in the path and stores the
/// member as a request extension for the handlers below.
pub async fn load_member_middleware(
    State(deployment): State<DeploymentImpl>,
    Path(params): Path<HashMap<String, String>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let household_id = params
        .get("household_id")
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .ok_or_else(|| ApiError::BadRequest("invalid household id".to_string()))?;
    let member_id = member_id_from_headers(request.headers())?;

    let member = Member::find_in_household(&deployment.db().pool, household_id, member_id)
        .await?
        .ok_or(ApiError::Forbidden("not a member of this household"))?;

    request.extensions_mut().insert(member);
    Ok(next.run(request).await)
}

/// Any member of any household; for endpoints outside a household scope.
pub async fn load_any_member_middleware(
    State(deployment): State<DeploymentImpl>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let member_id = member_id_from_headers(request.headers())?;
    let member = Member::find_by_id(&deployment.db().pool, member_id)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    request.extensions_mut().insert(member);
    Ok(next.run(request).await)
}
