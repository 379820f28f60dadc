use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::feedback_service::ListCommentsResult;
use crate::domain::review::{Comment, CreateCommentRequest, UpdateCommentRequest};
use crate::presentation::AppState;
use crate::presentation::app_error::AppResult;
use crate::presentation::handlers::{ListQuery, pagination};
use crate::presentation::middleware::auth::CurrentUser;

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct CommentDto {
    pub(crate) id: i64,
    pub(crate) author: String,
    pub(crate) text: String,
    pub(crate) pub_date: DateTime<Utc>,
}

impl From<Comment> for CommentDto {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            author: comment.author_username,
            text: comment.text,
            pub_date: comment.pub_date,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct ListCommentsResponseDto {
    pub(crate) comments: Vec<CommentDto>,
    pub(crate) limit: u32,
    pub(crate) offset: u32,
    pub(crate) total: i64,
}

impl From<ListCommentsResult> for ListCommentsResponseDto {
    fn from(result: ListCommentsResult) -> Self {
        Self {
            comments: result.comments.into_iter().map(CommentDto::from).collect(),
            limit: result.limit,
            offset: result.offset,
            total: result.total,
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct CreateCommentDto {
    #[validate(length(min = 1))]
    pub(crate) text: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct UpdateCommentDto {
    #[validate(length(min = 1))]
    pub(crate) text: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments",
    tag = "comments",
    params(
        ("title_id" = i64, Path, description = "Title id"),
        ("review_id" = i64, Path, description = "Review id"),
        ("limit" = Option<u32>, Query, description = "Items per page (1..=100)"),
        ("offset" = Option<u32>, Query, description = "Offset from the beginning (>= 0)")
    ),
    responses(
        (status = 200, description = "Comments listed", body = ListCommentsResponseDto),
        (status = 404, description = "Review not found under this title")
    )
)]
pub(crate) async fn list_comments(
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i64, i64)>,
    Query(query): Query<ListQuery>,
) -> AppResult<(StatusCode, Json<ListCommentsResponseDto>)> {
    query.validate()?;

    let result = state
        .feedback_service
        .list_comments(title_id, review_id, pagination(query.limit, query.offset))
        .await?;

    Ok((StatusCode::OK, Json(ListCommentsResponseDto::from(result))))
}

#[utoipa::path(
    post,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments",
    tag = "comments",
    security(("bearer_auth" = [])),
    params(
        ("title_id" = i64, Path, description = "Title id"),
        ("review_id" = i64, Path, description = "Review id")
    ),
    request_body = CreateCommentDto,
    responses(
        (status = 201, description = "Comment created", body = CommentDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Review not found under this title")
    )
)]
pub(crate) async fn create_comment(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((title_id, review_id)): Path<(i64, i64)>,
    Json(dto): Json<CreateCommentDto>,
) -> AppResult<(StatusCode, Json<CommentDto>)> {
    dto.validate()?;

    let comment = state
        .feedback_service
        .create_comment(
            &current.caller(),
            title_id,
            review_id,
            CreateCommentRequest { text: dto.text },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(CommentDto::from(comment))))
}

#[utoipa::path(
    get,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
    tag = "comments",
    params(
        ("title_id" = i64, Path, description = "Title id"),
        ("review_id" = i64, Path, description = "Review id"),
        ("comment_id" = i64, Path, description = "Comment id")
    ),
    responses(
        (status = 200, description = "Comment found", body = CommentDto),
        (status = 404, description = "Comment not found under this review")
    )
)]
pub(crate) async fn get_comment(
    State(state): State<AppState>,
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
) -> AppResult<(StatusCode, Json<CommentDto>)> {
    let comment = state
        .feedback_service
        .get_comment(title_id, review_id, comment_id)
        .await?;
    Ok((StatusCode::OK, Json(CommentDto::from(comment))))
}

#[utoipa::path(
    patch,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
    tag = "comments",
    security(("bearer_auth" = [])),
    params(
        ("title_id" = i64, Path, description = "Title id"),
        ("review_id" = i64, Path, description = "Review id"),
        ("comment_id" = i64, Path, description = "Comment id")
    ),
    request_body = UpdateCommentDto,
    responses(
        (status = 200, description = "Comment updated", body = CommentDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Author, moderator or admin required"),
        (status = 404, description = "Comment not found under this review")
    )
)]
pub(crate) async fn update_comment(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
    Json(dto): Json<UpdateCommentDto>,
) -> AppResult<(StatusCode, Json<CommentDto>)> {
    dto.validate()?;

    let comment = state
        .feedback_service
        .update_comment(
            &current.caller(),
            title_id,
            review_id,
            comment_id,
            UpdateCommentRequest { text: dto.text },
        )
        .await?;

    Ok((StatusCode::OK, Json(CommentDto::from(comment))))
}

#[utoipa::path(
    delete,
    path = "/api/v1/titles/{title_id}/reviews/{review_id}/comments/{comment_id}",
    tag = "comments",
    security(("bearer_auth" = [])),
    params(
        ("title_id" = i64, Path, description = "Title id"),
        ("review_id" = i64, Path, description = "Review id"),
        ("comment_id" = i64, Path, description = "Comment id")
    ),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Author, moderator or admin required"),
        (status = 404, description = "Comment not found under this review")
    )
)]
pub(crate) async fn delete_comment(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((title_id, review_id, comment_id)): Path<(i64, i64, i64)>,
) -> AppResult<StatusCode> {
    state
        .feedback_service
        .delete_comment(&current.caller(), title_id, review_id, comment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
