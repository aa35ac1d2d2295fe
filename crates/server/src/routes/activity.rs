use axum::{
    Extension, Router,
    extract::{Query, State},
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{
    activity::{ActivityEntry, ActivityQuery},
    member::Member,
};
use deployment::Deployment;
use services::services::activity::ActivityService;
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError};

pub async fn get_activity(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Query(query): Query<ActivityQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<ActivityEntry>>>, ApiError> {
    let entries = ActivityService::list(&deployment.db().pool, member.household_id, &query).await?;
    Ok(ResponseJson(ApiResponse::success(entries)))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new().route("/activity", get(get_activity))
}
