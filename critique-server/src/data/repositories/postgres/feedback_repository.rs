use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::data::Pagination;
use crate::data::feedback_repository::{
    CommentPatch, CommentRepository, NewComment, NewReview, ReviewPatch, ReviewRepository,
    TitleScore,
};
use crate::domain::error::DomainError;
use crate::domain::review::{Comment, Review};

const REVIEW_COLUMNS: &str = "r.id, r.title_id, r.author_id, \
    u.username AS author_username, r.text, r.score, r.pub_date";

const COMMENT_COLUMNS: &str = "c.id, c.review_id, c.author_id, \
    u.username AS author_username, c.text, c.pub_date";

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    title_id: i64,
    author_id: i64,
    author_username: String,
    text: String,
    score: i16,
    pub_date: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            title_id: row.title_id,
            author_id: row.author_id,
            author_username: row.author_username,
            text: row.text,
            score: row.score,
            pub_date: row.pub_date,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: i64,
    review_id: i64,
    author_id: i64,
    author_username: String,
    text: String,
    pub_date: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(row: CommentRow) -> Self {
        Self {
            id: row.id,
            review_id: row.review_id,
            author_id: row.author_id,
            author_username: row.author_username,
            text: row.text,
            pub_date: row.pub_date,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ScoreRow {
    title_id: i64,
    score: i16,
}

#[derive(Debug, Clone)]
pub(crate) struct PostgresReviewRepository {
    pool: PgPool,
}

impl PostgresReviewRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_review(&self, review_id: i64) -> Result<Option<Review>, DomainError> {
        let query = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews r \
             JOIN users u ON u.id = r.author_id \
             WHERE r.id = $1"
        );
        let row = sqlx::query_as::<_, ReviewRow>(&query)
            .bind(review_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_feedback_db_error)?;

        Ok(row.map(Review::from))
    }
}

#[async_trait]
impl ReviewRepository for PostgresReviewRepository {
    async fn create_review(&self, input: NewReview) -> Result<Review, DomainError> {
        let review_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO reviews (title_id, author_id, text, score) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(input.title_id)
        .bind(input.author_id)
        .bind(&input.text)
        .bind(input.score)
        .fetch_one(&self.pool)
        .await
        .map_err(map_feedback_db_error)?;

        self.fetch_review(review_id).await?.ok_or_else(|| {
            DomainError::Unexpected(format!("created review {review_id} disappeared"))
        })
    }

    async fn get_review(
        &self,
        title_id: i64,
        review_id: i64,
    ) -> Result<Option<Review>, DomainError> {
        let query = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews r \
             JOIN users u ON u.id = r.author_id \
             WHERE r.id = $1 AND r.title_id = $2"
        );
        let row = sqlx::query_as::<_, ReviewRow>(&query)
            .bind(review_id)
            .bind(title_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_feedback_db_error)?;

        Ok(row.map(Review::from))
    }

    async fn exists_for_author(
        &self,
        title_id: i64,
        author_id: i64,
    ) -> Result<bool, DomainError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM reviews WHERE title_id = $1 AND author_id = $2)",
        )
        .bind(title_id)
        .bind(author_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_feedback_db_error)?;

        Ok(exists)
    }

    async fn update_review(
        &self,
        review_id: i64,
        patch: ReviewPatch,
    ) -> Result<Option<Review>, DomainError> {
        let updated = sqlx::query_scalar::<_, i64>(
            "UPDATE reviews SET \
                text  = COALESCE($1, text), \
                score = COALESCE($2, score) \
             WHERE id = $3 \
             RETURNING id",
        )
        .bind(&patch.text)
        .bind(patch.score)
        .bind(review_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_feedback_db_error)?;

        match updated {
            Some(id) => self.fetch_review(id).await,
            None => Ok(None),
        }
    }

    async fn delete_review(&self, review_id: i64) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
            .bind(review_id)
            .execute(&self.pool)
            .await
            .map_err(map_feedback_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_reviews(
        &self,
        title_id: i64,
        pagination: Pagination,
    ) -> Result<Vec<Review>, DomainError> {
        let query = format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews r \
             JOIN users u ON u.id = r.author_id \
             WHERE r.title_id = $1 \
             ORDER BY r.pub_date, r.id \
             LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, ReviewRow>(&query)
            .bind(title_id)
            .bind(i64::from(pagination.limit))
            .bind(i64::from(pagination.offset))
            .fetch_all(&self.pool)
            .await
            .map_err(map_feedback_db_error)?;

        Ok(rows.into_iter().map(Review::from).collect())
    }

    async fn total_reviews(&self, title_id: i64) -> Result<i64, DomainError> {
        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM reviews WHERE title_id = $1")
                .bind(title_id)
                .fetch_one(&self.pool)
                .await
                .map_err(map_feedback_db_error)?;

        Ok(total)
    }

    async fn scores_for_titles(&self, title_ids: &[i64]) -> Result<Vec<TitleScore>, DomainError> {
        if title_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query_as::<_, ScoreRow>(
            "SELECT title_id, score FROM reviews WHERE title_id = ANY($1)",
        )
        .bind(title_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_feedback_db_error)?;

        Ok(rows
            .into_iter()
            .map(|row| TitleScore {
                title_id: row.title_id,
                score: row.score,
            })
            .collect())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct PostgresCommentRepository {
    pool: PgPool,
}

impl PostgresCommentRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_comment(&self, comment_id: i64) -> Result<Option<Comment>, DomainError> {
        let query = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments c \
             JOIN users u ON u.id = c.author_id \
             WHERE c.id = $1"
        );
        let row = sqlx::query_as::<_, CommentRow>(&query)
            .bind(comment_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_feedback_db_error)?;

        Ok(row.map(Comment::from))
    }
}

#[async_trait]
impl CommentRepository for PostgresCommentRepository {
    async fn create_comment(&self, input: NewComment) -> Result<Comment, DomainError> {
        let comment_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO comments (review_id, author_id, text) \
             VALUES ($1, $2, $3) \
             RETURNING id",
        )
        .bind(input.review_id)
        .bind(input.author_id)
        .bind(&input.text)
        .fetch_one(&self.pool)
        .await
        .map_err(map_feedback_db_error)?;

        self.fetch_comment(comment_id).await?.ok_or_else(|| {
            DomainError::Unexpected(format!("created comment {comment_id} disappeared"))
        })
    }

    async fn get_comment(
        &self,
        review_id: i64,
        comment_id: i64,
    ) -> Result<Option<Comment>, DomainError> {
        let query = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments c \
             JOIN users u ON u.id = c.author_id \
             WHERE c.id = $1 AND c.review_id = $2"
        );
        let row = sqlx::query_as::<_, CommentRow>(&query)
            .bind(comment_id)
            .bind(review_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_feedback_db_error)?;

        Ok(row.map(Comment::from))
    }

    async fn update_comment(
        &self,
        comment_id: i64,
        patch: CommentPatch,
    ) -> Result<Option<Comment>, DomainError> {
        let updated = sqlx::query_scalar::<_, i64>(
            "UPDATE comments SET text = COALESCE($1, text) WHERE id = $2 RETURNING id",
        )
        .bind(&patch.text)
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_feedback_db_error)?;

        match updated {
            Some(id) => self.fetch_comment(id).await,
            None => Ok(None),
        }
    }

    async fn delete_comment(&self, comment_id: i64) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(comment_id)
            .execute(&self.pool)
            .await
            .map_err(map_feedback_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_comments(
        &self,
        review_id: i64,
        pagination: Pagination,
    ) -> Result<Vec<Comment>, DomainError> {
        let query = format!(
            "SELECT {COMMENT_COLUMNS} FROM comments c \
             JOIN users u ON u.id = c.author_id \
             WHERE c.review_id = $1 \
             ORDER BY c.pub_date, c.id \
             LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, CommentRow>(&query)
            .bind(review_id)
            .bind(i64::from(pagination.limit))
            .bind(i64::from(pagination.offset))
            .fetch_all(&self.pool)
            .await
            .map_err(map_feedback_db_error)?;

        Ok(rows.into_iter().map(Comment::from).collect())
    }

    async fn total_comments(&self, review_id: i64) -> Result<i64, DomainError> {
        let total =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM comments WHERE review_id = $1")
                .bind(review_id)
                .fetch_one(&self.pool)
                .await
                .map_err(map_feedback_db_error)?;

        Ok(total)
    }
}

fn map_feedback_db_error(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.code().as_deref() == Some("23505")
    {
        if db_err.constraint() == Some("reviews_author_title_key") {
            return DomainError::AlreadyExists("review".to_string());
        }
        return DomainError::AlreadyExists("feedback entry".to_string());
    }
    DomainError::Unexpected(err.to_string())
}
