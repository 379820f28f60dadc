use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::catalog_service::ListGenresResult;
use crate::domain::catalog::{CreateLookupRequest, Genre};
use crate::presentation::AppState;
use crate::presentation::app_error::AppResult;
use crate::presentation::handlers::{ListQuery, pagination};
use crate::presentation::middleware::auth::CurrentUser;

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct GenreDto {
    pub(crate) name: String,
    pub(crate) slug: String,
}

impl From<Genre> for GenreDto {
    fn from(genre: Genre) -> Self {
        Self {
            name: genre.name,
            slug: genre.slug,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct CreateGenreDto {
    #[validate(length(min = 1, max = 256))]
    pub(crate) name: String,
    #[validate(length(min = 1, max = 50))]
    pub(crate) slug: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ListGenresResponseDto {
    pub(crate) genres: Vec<GenreDto>,
    pub(crate) limit: u32,
    pub(crate) offset: u32,
    pub(crate) total: i64,
}

impl From<ListGenresResult> for ListGenresResponseDto {
    fn from(result: ListGenresResult) -> Self {
        Self {
            genres: result.genres.into_iter().map(GenreDto::from).collect(),
            limit: result.limit,
            offset: result.offset,
            total: result.total,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/genres",
    tag = "genres",
    params(
        ("search" = Option<String>, Query, description = "Name substring, case-insensitive"),
        ("limit" = Option<u32>, Query, description = "Items per page (1..=100)"),
        ("offset" = Option<u32>, Query, description = "Offset from the beginning (>= 0)")
    ),
    responses(
        (status = 200, description = "Genres listed", body = ListGenresResponseDto),
        (status = 400, description = "Validation error")
    )
)]
pub(crate) async fn list_genres(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<(StatusCode, Json<ListGenresResponseDto>)> {
    query.validate()?;

    let result = state
        .catalog_service
        .list_genres(query.search, pagination(query.limit, query.offset))
        .await?;

    Ok((StatusCode::OK, Json(ListGenresResponseDto::from(result))))
}

#[utoipa::path(
    post,
    path = "/api/v1/genres",
    tag = "genres",
    security(("bearer_auth" = [])),
    request_body = CreateGenreDto,
    responses(
        (status = 201, description = "Genre created", body = GenreDto),
        (status = 400, description = "Validation error or duplicate slug"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required")
    )
)]
pub(crate) async fn create_genre(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(dto): Json<CreateGenreDto>,
) -> AppResult<(StatusCode, Json<GenreDto>)> {
    dto.validate()?;

    let genre = state
        .catalog_service
        .create_genre(
            &current.caller(),
            CreateLookupRequest {
                name: dto.name,
                slug: dto.slug,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(GenreDto::from(genre))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/genres/{slug}",
    tag = "genres",
    security(("bearer_auth" = [])),
    params(("slug" = String, Path, description = "Genre slug")),
    responses(
        (status = 204, description = "Genre deleted; titles lose the link only"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Genre not found")
    )
)]
pub(crate) async fn delete_genre(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(slug): Path<String>,
) -> AppResult<StatusCode> {
    state
        .catalog_service
        .delete_genre(&current.caller(), &slug)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
