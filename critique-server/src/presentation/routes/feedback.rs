use axum::Router;
use axum::middleware;
use axum::routing::{get, patch, post};

use crate::presentation::AppState;
use crate::presentation::handlers::comments::{
    create_comment, delete_comment, get_comment, list_comments, update_comment,
};
use crate::presentation::handlers::reviews::{
    create_review, delete_review, get_review, list_reviews, update_review,
};
use crate::presentation::middleware::auth::bearer_auth_middleware;

/// Nested under `/titles/{title_id}/reviews`.
pub(crate) fn router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list_reviews))
        .route("/{review_id}", get(get_review))
        .route("/{review_id}/comments", get(list_comments))
        .route("/{review_id}/comments/{comment_id}", get(get_comment));

    let protected = Router::new()
        .route("/", post(create_review))
        .route("/{review_id}", patch(update_review).delete(delete_review))
        .route("/{review_id}/comments", post(create_comment))
        .route(
            "/{review_id}/comments/{comment_id}",
            patch(update_comment).delete(delete_comment),
        )
        .layer(middleware::from_fn_with_state(state, bearer_auth_middleware));

    public.merge(protected)
}
