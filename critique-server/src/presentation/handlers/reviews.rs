use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::feedback_service::ListReviewsResult;
use crate::domain::review::{CreateReviewRequest, Review, UpdateReviewRequest};
use crate::presentation::AppState;
use crate::presentation::app_error::AppResult;
use crate::presentation::handlers::{ListQuery, pagination};
use crate::presentation::middleware::auth::CurrentUser;

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ReviewDto {
    pub(crate) id: i64,
    pub(crate) author: String,
    pub(crate) text: String,
    pub(crate) score: i16,
    pub(crate) pub_date: DateTime<Utc>,
}

impl From<Review> for ReviewDto {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            author: review.author_username,
            text: review.text,
            score: review.score,
            pub_date: review.pub_date,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ListReviewsResponseDto {
    pub(crate) reviews: Vec<ReviewDto>,
    pub(crate) limit: u32,
    pub(crate) offset: u32,
    pub(crate) total: i64,
}

impl From<ListReviewsResult> for ListReviewsResponseDto {
    fn from(result: ListReviewsResult) -> Self {
        Self {
            reviews: result.reviews.into_iter().map(ReviewDto::from).collect(),
            limit: result.limit,
            offset: result.offset,
            total: result.total,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct CreateReviewDto {
    #[validate(length(min = 1))]
    pub(crate) text: String,
    #[validate(range(min = 1, max = 10))]
    pub(crate) score: i16,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct UpdateReviewDto {
    #[validate(length(min = 1))]
    pub(crate) text: Option<String>,
    #[validate(range(min = 1, max = 10))]
    pub(crate) score: Option<i16>,
}

#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}/reviews",
    tag = "reviews",
    params(
        ("title_id" = i64, Path, description = "Title id"),
        ("limit" = Option<u32>, Query, description = "Items per page (1..=100)"),
        ("offset" = Option<u32>, Query, description = "Offset from the beginning (>= 0)")
    ),
    responses(
        (status = 200, description = "Reviews listed", body = ListReviewsResponseDto),
        (status = 404, description = "Title not found")
    )
)]
pub(crate) async fn list_reviews(
    State(state): State<AppState>,
    Path(title_id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> AppResult<(StatusCode, Json<ListReviewsResponseDto>)> {
    query.validate()?;

    let result = state
        .feedback_service
        .list_reviews(title_id, pagination(query.limit, query.offset))
        .await?;

    Ok((StatusCode::OK, Json(ListReviewsResponseDto::from(result))))
}

#[utoipa::path(
    post,
    path = "/api/v1/titles/{title_id}/reviews",
    tag = "reviews",
    security(("bearer_auth" = [])),
    params(("title_id" = i64, Path, description = "Title id")),
    request_body = CreateReviewDto,
    responses(
        (status = 201, description = "Review created", body = ReviewDto),
        (status = 400, description = "Validation error or duplicate review"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Title not found")
    )
)]
pub(crate) async fn create_review(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(title_id): Path<i64>,
    Json(dto): Json<CreateReviewDto>,
) -> AppResult<(StatusCode, Json<ReviewDto>)> {
    dto.validate()?;

    let review = state
        .feedback_service
        .create_review(
            &current.caller(),
            title_id,
            CreateReviewRequest {
                text: dto.text,
                score: dto.score,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(ReviewDto::from(review))))
}

#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}",
    tag = "reviews",
    params(
        ("title_id" = i64, Path, description = "Title id"),
        ("review_id" = i64, Path, description = "Review id")
    ),
    responses(
        (status = 200, description = "Review found", body = ReviewDto),
        (status = 404, description = "Review not found under this title")
    )
)]
pub(crate) async fn get_review(
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i64, i64)>,
) -> AppResult<(StatusCode, Json<ReviewDto>)> {
    let review = state.feedback_service.get_review(title_id, review_id).await?;
    Ok((StatusCode::OK, Json(ReviewDto::from(review))))
}

#[utoipa::path(
    patch,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}",
    tag = "reviews",
    security(("bearer_auth" = [])),
    params(
        ("title_id" = i64, Path, description = "Title id"),
        ("review_id" = i64, Path, description = "Review id")
    ),
    request_body = UpdateReviewDto,
    responses(
        (status = 200, description = "Review updated", body = ReviewDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Author, moderator or admin required"),
        (status = 404, description = "Review not found under this title")
    )
)]
pub(crate) async fn update_review(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((title_id, review_id)): Path<(i64, i64)>,
    Json(dto): Json<UpdateReviewDto>,
) -> AppResult<(StatusCode, Json<ReviewDto>)> {
    dto.validate()?;

    let review = state
        .feedback_service
        .update_review(
            &current.caller(),
            title_id,
            review_id,
            UpdateReviewRequest {
                text: dto.text,
                score: dto.score,
            },
        )
        .await?;

    Ok((StatusCode::OK, Json(ReviewDto::from(review))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}",
    tag = "reviews",
    security(("bearer_auth" = [])),
    params(
        ("title_id" = i64, Path, description = "Title id"),
        ("review_id" = i64, Path, description = "Review id")
    ),
    responses(
        (status = 204, description = "Review deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Author, moderator or admin required"),
        (status = 404, description = "Review not found under this title")
    )
)]
pub(crate) async fn delete_review(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((title_id, review_id)): Path<(i64, i64)>,
) -> AppResult<StatusCode> {
    state
        .feedback_service
        .delete_review(&current.caller(), title_id, review_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
