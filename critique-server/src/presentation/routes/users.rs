use axum::Router;
use axum::middleware;
use axum::routing::get;

use crate::presentation::AppState;
use crate::presentation::handlers::users::{
    create_user, delete_user, get_user, list_users, me, update_me, update_user,
};
use crate::presentation::middleware::auth::bearer_auth_middleware;

/// Every route here needs a valid bearer token; the admin-only rules live in
/// the account service.
pub(crate) fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/me", get(me).patch(update_me))
        .route(
            "/{username}",
            get(get_user).patch(update_user).delete(delete_user),
        )
        .layer(middleware::from_fn_with_state(state, bearer_auth_middleware))
}
