use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::data::user_repository::UserRepository;
use crate::domain::permission::Caller;
use crate::domain::user::Role;
use crate::presentation::AppState;
use crate::presentation::app_error::AppError;

/// Established per request from a verified bearer token. The user row is
/// re-read from the store so role changes and deletions take effect on the
/// next request, not at the next token refresh.
#[derive(Debug, Clone)]
pub(crate) struct CurrentUser {
    pub(crate) user_id: i64,
    pub(crate) role: Role,
}

impl CurrentUser {
    pub(crate) fn caller(&self) -> Caller {
        Caller {
            user_id: self.user_id,
            role: self.role,
        }
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

pub(crate) async fn bearer_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or(AppError::Unauthorized)?;

    let mut parts = auth_header.split_whitespace();
    let scheme = parts.next().ok_or(AppError::Unauthorized)?;
    let token = parts.next().ok_or(AppError::Unauthorized)?;
    if parts.next().is_some() {
        return Err(AppError::Unauthorized);
    }
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AppError::Unauthorized);
    }
    if token.trim().is_empty() {
        return Err(AppError::Unauthorized);
    }

    let claims = state
        .jwt
        .verify_token(token.trim())
        .map_err(|_| AppError::Unauthorized)?;

    let user = state
        .users
        .get_user(claims.user_id)
        .await
        .map_err(AppError::Domain)?
        .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(CurrentUser {
        user_id: user.id,
        role: user.role,
    });

    Ok(next.run(request).await)
}
