use async_trait::async_trait;

use super::Pagination;
use crate::domain::error::DomainError;
use crate::domain::review::{Comment, Review};

#[derive(Debug, Clone)]
pub(crate) struct NewReview {
    pub(crate) title_id: i64,
    pub(crate) author_id: i64,
    pub(crate) text: String,
    pub(crate) score: i16,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct ReviewPatch {
    pub(crate) text: Option<String>,
    pub(crate) score: Option<i16>,
}

#[derive(Debug, Clone)]
pub(crate) struct NewComment {
    pub(crate) review_id: i64,
    pub(crate) author_id: i64,
    pub(crate) text: String,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct CommentPatch {
    pub(crate) text: Option<String>,
}

/// One review score, keyed by title, for rating aggregation.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TitleScore {
    pub(crate) title_id: i64,
    pub(crate) score: i16,
}

#[async_trait]
pub(crate) trait ReviewRepository: Send + Sync {
    /// The storage layer holds `UNIQUE (author_id, title_id)`; a duplicate
    /// insert must surface as `DomainError::AlreadyExists`.
    async fn create_review(&self, input: NewReview) -> Result<Review, DomainError>;
    /// Looks up a review through its title; a mismatched pair is a miss.
    async fn get_review(
        &self,
        title_id: i64,
        review_id: i64,
    ) -> Result<Option<Review>, DomainError>;
    async fn exists_for_author(
        &self,
        title_id: i64,
        author_id: i64,
    ) -> Result<bool, DomainError>;
    async fn update_review(
        &self,
        review_id: i64,
        patch: ReviewPatch,
    ) -> Result<Option<Review>, DomainError>;
    async fn delete_review(&self, review_id: i64) -> Result<bool, DomainError>;
    async fn list_reviews(
        &self,
        title_id: i64,
        pagination: Pagination,
    ) -> Result<Vec<Review>, DomainError>;
    async fn total_reviews(&self, title_id: i64) -> Result<i64, DomainError>;
    async fn scores_for_titles(&self, title_ids: &[i64]) -> Result<Vec<TitleScore>, DomainError>;
}

#[async_trait]
pub(crate) trait CommentRepository: Send + Sync {
    async fn create_comment(&self, input: NewComment) -> Result<Comment, DomainError>;
    async fn get_comment(
        &self,
        review_id: i64,
        comment_id: i64,
    ) -> Result<Option<Comment>, DomainError>;
    async fn update_comment(
        &self,
        comment_id: i64,
        patch: CommentPatch,
    ) -> Result<Option<Comment>, DomainError>;
    async fn delete_comment(&self, comment_id: i64) -> Result<bool, DomainError>;
    async fn list_comments(
        &self,
        review_id: i64,
        pagination: Pagination,
    ) -> Result<Vec<Comment>, DomainError>;
    async fn total_comments(&self, review_id: i64) -> Result<i64, DomainError>;
}
