use axum::{Router, http::HeaderValue, middleware::from_fn_with_state};
use deployment::Deployment;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::{DeploymentImpl, middleware::load_member_middleware};

pub mod activity;
pub mod borrows;
pub mod calendar;
pub mod health;
pub mod households;
pub mod inventory;
pub mod notifications;
pub mod photos;
pub mod shopping;
pub mod tasks;

pub fn router(deployment: DeploymentImpl) -> Router {
    // Everything under /households/{household_id} runs as the calling member.
    let household_scoped = Router::new()
        .merge(households::scoped_router())
        .merge(shopping::router())
        .merge(tasks::router())
        .merge(inventory::router())
        .merge(borrows::router())
        .merge(calendar::router())
        .merge(activity::router())
        .merge(notifications::router())
        .route_layer(from_fn_with_state(
            deployment.clone(),
            load_member_middleware,
        ));

    let api = Router::new()
        .merge(health::router())
        .merge(households::router())
        .merge(photos::router(&deployment))
        .nest("/households/{household_id}", household_scoped);

    Router::new()
        .nest("/api", api)
        .layer(cors_layer(deployment.config().cors_origin.as_deref()))
        .layer(TraceLayer::new_for_http())
        .with_state(deployment)
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => layer.allow_origin(origin),
        Some(Err(_)) => {
            warn!("Ignoring invalid CORS origin, allowing any");
            layer.allow_origin(Any)
        }
        None => layer.allow_origin(Any),
    }
}
