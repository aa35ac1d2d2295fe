use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json as ResponseJson,
    routing::get,
};
use db::models::{
    calendar_event::{CalendarEvent, CreateCalendarEvent, UpdateCalendarEvent},
    member::Member,
};
use deployment::Deployment;
use services::services::calendar::{AgendaEntry, AgendaQuery, CalendarService};
use utils::response::ApiResponse;
use uuid::Uuid;

use crate::{DeploymentImpl, error::ApiError};

pub async fn get_events(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
) -> Result<ResponseJson<ApiResponse<Vec<CalendarEvent>>>, ApiError> {
    let events = CalendarService::list(&deployment.db().pool, member.household_id).await?;
    Ok(ResponseJson(ApiResponse::success(events)))
}

pub async fn create_event(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Json(payload): Json<CreateCalendarEvent>,
) -> Result<(StatusCode, ResponseJson<ApiResponse<CalendarEvent>>), ApiError> {
    let event = CalendarService::create(&deployment.db().pool, &member, &payload).await?;
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(event))))
}

pub async fn get_event(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, event_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<CalendarEvent>>, ApiError> {
    let event = CalendarService::get(&deployment.db().pool, member.household_id, event_id).await?;
    Ok(ResponseJson(ApiResponse::success(event)))
}

pub async fn update_event(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, event_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateCalendarEvent>,
) -> Result<ResponseJson<ApiResponse<CalendarEvent>>, ApiError> {
    let event =
        CalendarService::update(&deployment.db().pool, &member, event_id, &payload).await?;
    Ok(ResponseJson(ApiResponse::success(event)))
}

pub async fn delete_event(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Path((_household_id, event_id)): Path<(Uuid, Uuid)>,
) -> Result<ResponseJson<ApiResponse<()>>, ApiError> {
    CalendarService::delete(&deployment.db().pool, &member, event_id).await?;
    Ok(ResponseJson(ApiResponse::success(())))
}

/// Events, chores that fall due and active loans between two dates, by day.
pub async fn get_agenda(
    State(deployment): State<DeploymentImpl>,
    Extension(member): Extension<Member>,
    Query(query): Query<AgendaQuery>,
) -> Result<ResponseJson<ApiResponse<Vec<AgendaEntry>>>, ApiError> {
    let agenda = CalendarService::agenda(
        &deployment.db().pool,
        member.household_id,
        query.from,
        query.to,
    )
    .await?;
    Ok(ResponseJson(ApiResponse::success(agenda)))
}

pub fn router() -> Router<DeploymentImpl> {
    Router::new()
        .route("/events", get(get_events).post(create_event))
        .route(
            "/events/{event_id}",
            get(get_event).patch(update_event).delete(delete_event),
        )
        .route("/agenda", get(get_agenda))
}
