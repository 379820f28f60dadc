use axum::{Router, routing::post};

use crate::presentation::AppState;
use crate::presentation::handlers::auth::{signup, token};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/token", post(token))
}
