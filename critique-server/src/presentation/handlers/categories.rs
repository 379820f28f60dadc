use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::catalog_service::ListCategoriesResult;
use crate::domain::catalog::{Category, CreateLookupRequest};
use crate::presentation::AppState;
use crate::presentation::app_error::AppResult;
use crate::presentation::handlers::{ListQuery, pagination};
use crate::presentation::middleware::auth::CurrentUser;

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct CategoryDto {
    pub(crate) name: String,
    pub(crate) slug: String,
}

impl From<Category> for CategoryDto {
    fn from(category: Category) -> Self {
        Self {
            name: category.name,
            slug: category.slug,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct CreateCategoryDto {
    #[validate(length(min = 1, max = 256))]
    pub(crate) name: String,
    #[validate(length(min = 1, max = 50))]
    pub(crate) slug: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ListCategoriesResponseDto {
    pub(crate) categories: Vec<CategoryDto>,
    pub(crate) limit: u32,
    pub(crate) offset: u32,
    pub(crate) total: i64,
}

impl From<ListCategoriesResult> for ListCategoriesResponseDto {
    fn from(result: ListCategoriesResult) -> Self {
        Self {
            categories: result
                .categories
                .into_iter()
                .map(CategoryDto::from)
                .collect(),
            limit: result.limit,
            offset: result.offset,
            total: result.total,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/categories",
    tag = "categories",
    params(
        ("search" = Option<String>, Query, description = "Name substring, case-insensitive"),
        ("limit" = Option<u32>, Query, description = "Items per page (1..=100)"),
        ("offset" = Option<u32>, Query, description = "Offset from the beginning (>= 0)")
    ),
    responses(
        (status = 200, description = "Categories listed", body = ListCategoriesResponseDto),
        (status = 400, description = "Validation error")
    )
)]
pub(crate) async fn list_categories(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<(StatusCode, Json<ListCategoriesResponseDto>)> {
    query.validate()?;

    let result = state
        .catalog_service
        .list_categories(query.search, pagination(query.limit, query.offset))
        .await?;

    Ok((StatusCode::OK, Json(ListCategoriesResponseDto::from(result))))
}

#[utoipa::path(
    post,
    path = "/api/v1/categories",
    tag = "categories",
    security(("bearer_auth" = [])),
    request_body = CreateCategoryDto,
    responses(
        (status = 201, description = "Category created", body = CategoryDto),
        (status = 400, description = "Validation error or duplicate slug"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required")
    )
)]
pub(crate) async fn create_category(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(dto): Json<CreateCategoryDto>,
) -> AppResult<(StatusCode, Json<CategoryDto>)> {
    dto.validate()?;

    let category = state
        .catalog_service
        .create_category(
            &current.caller(),
            CreateLookupRequest {
                name: dto.name,
                slug: dto.slug,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(CategoryDto::from(category))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/categories/{slug}",
    tag = "categories",
    security(("bearer_auth" = [])),
    params(("slug" = String, Path, description = "Category slug")),
    responses(
        (status = 204, description = "Category deleted; titles keep living with no category"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin role required"),
        (status = 404, description = "Category not found")
    )
)]
pub(crate) async fn delete_category(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(slug): Path<String>,
) -> AppResult<StatusCode> {
    state
        .catalog_service
        .delete_category(&current.caller(), &slug)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
