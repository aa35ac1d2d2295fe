use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Path, State},
    http::{HeaderMap, StatusCode, header},
    middleware::from_fn_with_state,
    response::{IntoResponse, Json as ResponseJson, Response},
    routing::{get, post},
};
use deployment::Deployment;
use services::services::photos::StoredPhoto;
use tracing::info;
use utils::response::ApiResponse;

use crate::{DeploymentImpl, error::ApiError, middleware::load_any_member_middleware};

/// Raw image bytes in the body, type in `Content-Type`.
pub async fn upload_photo(
    State(deployment): State<DeploymentImpl>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, ResponseJson<ApiResponse<StoredPhoto>>), ApiError> {
    let declared = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok());
    let stored = deployment.photo_store().save(&body, declared).await?;
    info!(photo = %stored.name, size = stored.size, "Photo uploaded");
    Ok((StatusCode::CREATED, ResponseJson(ApiResponse::success(stored))))
}

pub async fn get_photo(
    State(deployment): State<DeploymentImpl>,
    Path(name): Path<String>,
) -> Result<Response, ApiError> {
    let (bytes, mime) = deployment.photo_store().read(&name).await?;
    Ok((
        [
            (header::CONTENT_TYPE, mime),
            // Names are content hashes, so a stored photo never changes.
            (
                header::CACHE_CONTROL,
                "public, max-age=31536000, immutable".to_string(),
            ),
        ],
        bytes,
    )
        .into_response())
}

pub fn router(deployment: &DeploymentImpl) -> Router<DeploymentImpl> {
    // Leave room over the store limit so oversized uploads get a JSON error
    // from the store instead of a bare 413 from the extractor.
    let body_limit = deployment.photo_store().max_bytes().saturating_add(64 * 1024);

    let upload = Router::new()
        .route("/photos", post(upload_photo))
        .layer(DefaultBodyLimit::max(body_limit))
        .route_layer(from_fn_with_state(
            deployment.clone(),
            load_any_member_middleware,
        ));

    Router::new()
        .route("/photos/{name}", get(get_photo))
        .merge(upload)
}
