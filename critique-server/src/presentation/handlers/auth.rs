use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::user::{SignupRequest, TokenRequest};
use crate::presentation::AppState;
use crate::presentation::app_error::AppResult;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct SignupDto {
    #[validate(length(min = 1, max = 150))]
    pub(crate) username: String,
    #[validate(email)]
    pub(crate) email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct SignupResponseDto {
    pub(crate) username: String,
    pub(crate) email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct TokenRequestDto {
    #[validate(length(min = 1, max = 150))]
    pub(crate) username: String,
    #[validate(length(min = 1))]
    pub(crate) confirmation_code: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct TokenResponseDto {
    pub(crate) token: String,
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/signup",
    tag = "auth",
    request_body = SignupDto,
    responses(
        (status = 200, description = "Code issued and delivered", body = SignupResponseDto),
        (status = 400, description = "Validation error"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn signup(
    State(state): State<AppState>,
    Json(dto): Json<SignupDto>,
) -> AppResult<(StatusCode, Json<SignupResponseDto>)> {
    dto.validate()?;

    let user = state
        .auth_service
        .signup(SignupRequest {
            username: dto.username,
            email: dto.email,
        })
        .await?;

    Ok((
        StatusCode::OK,
        Json(SignupResponseDto {
            username: user.username,
            email: user.email,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/token",
    tag = "auth",
    request_body = TokenRequestDto,
    responses(
        (status = 201, description = "Token issued", body = TokenResponseDto),
        (status = 400, description = "Invalid confirmation code"),
        (status = 404, description = "Unknown username"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn token(
    State(state): State<AppState>,
    Json(dto): Json<TokenRequestDto>,
) -> AppResult<(StatusCode, Json<TokenResponseDto>)> {
    dto.validate()?;

    let token = state
        .auth_service
        .issue_token(TokenRequest {
            username: dto.username,
            confirmation_code: dto.confirmation_code,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(TokenResponseDto { token })))
}
