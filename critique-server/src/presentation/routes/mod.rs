use axum::{Json, Router, routing::get};
use serde::Serialize;

use super::AppState;

pub(crate) mod auth;
pub(crate) mod catalog;
pub(crate) mod feedback;
pub(crate) mod users;

pub(crate) fn routes(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .merge(router(state.clone()))
        .with_state(state)
}

fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/api/v1/auth", auth::router())
        .nest("/api/v1/users", users::router(state.clone()))
        .nest("/api/v1/categories", catalog::categories_router(state.clone()))
        .nest("/api/v1/genres", catalog::genres_router(state.clone()))
        .nest("/api/v1/titles", catalog::titles_router(state.clone()))
        .nest("/api/v1/titles/{title_id}/reviews", feedback::router(state))
}

#[derive(Debug, Serialize)]
struct HealthzResponse {
    status: &'static str,
}

async fn health_handler() -> Json<HealthzResponse> {
    Json(HealthzResponse { status: "ok" })
}
