use axum::Router;
use axum::middleware;
use axum::routing::{delete, get, post};

use crate::presentation::AppState;
use crate::presentation::handlers::categories::{
    create_category, delete_category, list_categories,
};
use crate::presentation::handlers::genres::{create_genre, delete_genre, list_genres};
use crate::presentation::handlers::titles::{
    create_title, delete_title, get_title, list_titles, update_title,
};
use crate::presentation::middleware::auth::bearer_auth_middleware;

pub(crate) fn categories_router(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/", get(list_categories));

    let protected = Router::new()
        .route("/", post(create_category))
        .route("/{slug}", delete(delete_category))
        .layer(middleware::from_fn_with_state(state, bearer_auth_middleware));

    public.merge(protected)
}

pub(crate) fn genres_router(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/", get(list_genres));

    let protected = Router::new()
        .route("/", post(create_genre))
        .route("/{slug}", delete(delete_genre))
        .layer(middleware::from_fn_with_state(state, bearer_auth_middleware));

    public.merge(protected)
}

pub(crate) fn titles_router(state: AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(list_titles))
        .route("/{title_id}", get(get_title));

    let protected = Router::new()
        .route("/", post(create_title))
        .route("/{title_id}", axum::routing::patch(update_title).delete(delete_title))
        .layer(middleware::from_fn_with_state(state, bearer_auth_middleware));

    public.merge(protected)
}
