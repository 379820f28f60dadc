use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::catalog_service::ListTitlesResult;
use crate::data::catalog_repository::TitleListFilter;
use crate::domain::catalog::{CreateTitleRequest, Title, UpdateTitleRequest};
use crate::presentation::AppState;
use crate::presentation::app_error::AppResult;
use crate::presentation::handlers::categories::CategoryDto;
use crate::presentation::handlers::genres::GenreDto;
use crate::presentation::handlers::pagination;
use crate::presentation::middleware::auth::CurrentUser;

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct TitleDto {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) year: i32,
    pub(crate) description: Option<String>,
    pub(crate) genre: Vec<GenreDto>,
    pub(crate) category: Option<CategoryDto>,
    /// Mean review score; null while the title has no reviews.
    pub(crate) rating: Option<f64>,
}

impl From<Title> for TitleDto {
    fn from(title: Title) -> Self {
        Self {
            id: title.id,
            name: title.name,
            year: title.year,
            description: title.description,
            genre: title.genres.into_iter().map(GenreDto::from).collect(),
            category: title.category.map(CategoryDto::from),
            rating: title.rating,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ListTitlesResponseDto {
    pub(crate) titles: Vec<TitleDto>,
    pub(crate) limit: u32,
    pub(crate) offset: u32,
    pub(crate) total: i64,
}

impl From<ListTitlesResult> for ListTitlesResponseDto {
    fn from(result: ListTitlesResult) -> Self {
        Self {
            titles: result.titles.into_iter().map(TitleDto::from).collect(),
            limit: result.limit,
            offset: result.offset,
            total: result.total,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct CreateTitleDto {
    #[validate(length(min = 1, max = 256))]
    pub(crate) name: String,
    pub(crate) year: i32,
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) genre: Vec<String>,
    pub(crate) category: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct UpdateTitleDto {
    #[validate(length(min = 1, max = 256))]
    pub(crate) name: Option<String>,
    pub(crate) year: Option<i32>,
    pub(crate) description: Option<String>,
    pub(crate) genre: Option<Vec<String>>,
    pub(crate) category: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct TitleListQuery {
    pub(crate) genre: Option<String>,
    pub(crate) category: Option<String>,
    pub(crate) name: Option<String>,
    pub(crate) year: Option<i32>,
    #[validate(range(min = 1, max = 100))]
    pub(crate) limit: Option<u32>,
    pub(crate) offset: Option<u32>,
}

#[utoipa::path(
    get,
    path = "/api/v1/titles",
    tag = "titles",
    params(
        ("genre" = Option<String>, Query, description = "Genre slug substring, case-insensitive"),
        ("category" = Option<String>, Query, description = "Category slug substring, case-insensitive"),
        ("name" = Option<String>, Query, description = "Exact name"),
        ("year" = Option<i32>, Query, description = "Exact year"),
        ("limit" = Option<u32>, Query, description = "Items per page (1..=100)"),
        ("offset" = Option<u32>, Query, description = "Offset from the beginning (>= 0)")
    ),
    responses(
        (status = 200, description = "Titles listed", body = ListTitlesResponseDto),
        (status = 400, description = "Validation error")
    )
)]
pub(crate) async fn list_titles(
    State(state): State<AppState>,
    Query(query): Query<TitleListQuery>,
) -> AppResult<(StatusCode, Json<ListTitlesResponseDto>)> {
    query.validate()?;

    let filter = TitleListFilter {
        genre_slug: query.genre,
        category_slug: query.category,
        name: query.name,
        year: query.year,
    };
    let result = state
        .catalog_service
        .list_titles(filter, pagination(query.limit, query.offset))
        .await?;

    Ok((StatusCode::OK, Json(ListTitlesResponseDto::from(result))))
}

#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}",
    tag = "titles",
    params(("title_id" = i64, Path, description = "Title id")),
    responses(
        (status = 200, description = "Title found", body = TitleDto),
        (status = 404, description = "Title not found")
    )
)]
pub(crate) async fn get_title(
    State(state): State<AppState>,
    Path(title_id): Path<i64>,
) -> AppResult<(StatusCode, Json<TitleDto>)> {
    let title = state.catalog_service.get_title(title_id).await?;
    Ok((StatusCode::OK, Json(TitleDto::from(title))))
}

#[utoipa::path(
    post,
    path = "/api/v1/titles",
    tag = "titles",
    security(("bearer_auth" = [])),
    request_body = CreateTitleDto,
    responses(
        (status = 201, description = "Title created", body = TitleDto),
        (status = 400, description = "Validation error or unknown slug"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required")
    )
)]
pub(crate) async fn create_title(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(dto): Json<CreateTitleDto>,
) -> AppResult<(StatusCode, Json<TitleDto>)> {
    dto.validate()?;

    let title = state
        .catalog_service
        .create_title(
            &current.caller(),
            CreateTitleRequest {
                name: dto.name,
                year: dto.year,
                description: dto.description,
                genre: dto.genre,
                category: dto.category,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(TitleDto::from(title))))
}

#[utoipa::path(
    patch,
    path = "/api/v1/titles/{title_id}",
    tag = "titles",
    security(("bearer_auth" = [])),
    params(("title_id" = i64, Path, description = "Title id")),
    request_body = UpdateTitleDto,
    responses(
        (status = 200, description = "Title updated", body = TitleDto),
        (status = 400, description = "Validation error or unknown slug"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Title not found")
    )
)]
pub(crate) async fn update_title(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(title_id): Path<i64>,
    Json(dto): Json<UpdateTitleDto>,
) -> AppResult<(StatusCode, Json<TitleDto>)> {
    dto.validate()?;

    let title = state
        .catalog_service
        .update_title(
            &current.caller(),
            title_id,
            UpdateTitleRequest {
                name: dto.name,
                year: dto.year,
                description: dto.description,
                genre: dto.genre,
                category: dto.category,
            },
        )
        .await?;

    Ok((StatusCode::OK, Json(TitleDto::from(title))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/titles/{title_id}",
    tag = "titles",
    security(("bearer_auth" = [])),
    params(("title_id" = i64, Path, description = "Title id")),
    responses(
        (status = 204, description = "Title deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Title not found")
    )
)]
pub(crate) async fn delete_title(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(title_id): Path<i64>,
) -> AppResult<StatusCode> {
    state
        .catalog_service
        .delete_title(&current.caller(), title_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
