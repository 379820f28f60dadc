use crate::data::Pagination;
use crate::data::catalog_repository::TitleRepository;
use crate::data::feedback_repository::{
    CommentPatch, CommentRepository, NewComment, NewReview, ReviewPatch, ReviewRepository,
};
use crate::domain::error::DomainError;
use crate::domain::permission::{Action, Caller, Resource, authorize};
use crate::domain::review::{
    Comment, CreateCommentRequest, CreateReviewRequest, Review, UpdateCommentRequest,
    UpdateReviewRequest,
};

#[derive(Debug, Clone)]
pub(crate) struct ListReviewsResult {
    pub(crate) reviews: Vec<Review>,
    pub(crate) limit: u32,
    pub(crate) offset: u32,
    pub(crate) total: i64,
}

#[derive(Debug, Clone)]
pub(crate) struct ListCommentsResult {
    pub(crate) comments: Vec<Comment>,
    pub(crate) limit: u32,
    pub(crate) offset: u32,
    pub(crate) total: i64,
}

pub(crate) struct FeedbackService<T, R, C>
where
    T: TitleRepository,
    R: ReviewRepository,
    C: CommentRepository,
{
    titles: T,
    reviews: R,
    comments: C,
}

impl<T, R, C> FeedbackService<T, R, C>
where
    T: TitleRepository,
    R: ReviewRepository,
    C: CommentRepository,
{
    pub(crate) fn new(titles: T, reviews: R, comments: C) -> Self {
        Self {
            titles,
            reviews,
            comments,
        }
    }

    pub(crate) async fn list_reviews(
        &self,
        title_id: i64,
        pagination: Pagination,
    ) -> Result<ListReviewsResult, DomainError> {
        self.ensure_title(title_id).await?;

        let reviews = self.reviews.list_reviews(title_id, pagination).await?;
        let total = self.reviews.total_reviews(title_id).await?;

        Ok(ListReviewsResult {
            reviews,
            limit: pagination.limit,
            offset: pagination.offset,
            total,
        })
    }

    /// The `exists_for_author` pre-check yields the friendly message; the
    /// storage-level unique constraint closes the race between concurrent
    /// submissions.
    pub(crate) async fn create_review(
        &self,
        caller: &Caller,
        title_id: i64,
        req: CreateReviewRequest,
    ) -> Result<Review, DomainError> {
        authorize(
            Some(caller),
            Action::Create,
            Resource::Feedback { author_id: None },
        )?;
        self.ensure_title(title_id).await?;
        let req = req.validate()?;

        if self
            .reviews
            .exists_for_author(title_id, caller.user_id)
            .await?
        {
            return Err(DomainError::AlreadyExists("review".to_string()));
        }

        self.reviews
            .create_review(NewReview {
                title_id,
                author_id: caller.user_id,
                text: req.text,
                score: req.score,
            })
            .await
    }

    pub(crate) async fn get_review(
        &self,
        title_id: i64,
        review_id: i64,
    ) -> Result<Review, DomainError> {
        self.reviews
            .get_review(title_id, review_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("review id: {review_id}")))
    }

    pub(crate) async fn update_review(
        &self,
        caller: &Caller,
        title_id: i64,
        review_id: i64,
        req: UpdateReviewRequest,
    ) -> Result<Review, DomainError> {
        let review = self.get_review(title_id, review_id).await?;
        authorize(
            Some(caller),
            Action::Update,
            Resource::Feedback {
                author_id: Some(review.author_id),
            },
        )?;
        let req = req.validate()?;

        self.reviews
            .update_review(
                review_id,
                ReviewPatch {
                    text: req.text,
                    score: req.score,
                },
            )
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("review id: {review_id}")))
    }

    pub(crate) async fn delete_review(
        &self,
        caller: &Caller,
        title_id: i64,
        review_id: i64,
    ) -> Result<(), DomainError> {
        let review = self.get_review(title_id, review_id).await?;
        authorize(
            Some(caller),
            Action::Delete,
            Resource::Feedback {
                author_id: Some(review.author_id),
            },
        )?;

        let deleted = self.reviews.delete_review(review_id).await?;
        if !deleted {
            return Err(DomainError::NotFound(format!("review id: {review_id}")));
        }
        Ok(())
    }

    pub(crate) async fn list_comments(
        &self,
        title_id: i64,
        review_id: i64,
        pagination: Pagination,
    ) -> Result<ListCommentsResult, DomainError> {
        self.get_review(title_id, review_id).await?;

        let comments = self.comments.list_comments(review_id, pagination).await?;
        let total = self.comments.total_comments(review_id).await?;

        Ok(ListCommentsResult {
            comments,
            limit: pagination.limit,
            offset: pagination.offset,
            total,
        })
    }

    pub(crate) async fn create_comment(
        &self,
        caller: &Caller,
        title_id: i64,
        review_id: i64,
        req: CreateCommentRequest,
    ) -> Result<Comment, DomainError> {
        authorize(
            Some(caller),
            Action::Create,
            Resource::Feedback { author_id: None },
        )?;
        self.get_review(title_id, review_id).await?;
        let req = req.validate()?;

        self.comments
            .create_comment(NewComment {
                review_id,
                author_id: caller.user_id,
                text: req.text,
            })
            .await
    }

    pub(crate) async fn get_comment(
        &self,
        title_id: i64,
        review_id: i64,
        comment_id: i64,
    ) -> Result<Comment, DomainError> {
        self.get_review(title_id, review_id).await?;

        self.comments
            .get_comment(review_id, comment_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("comment id: {comment_id}")))
    }

    pub(crate) async fn update_comment(
        &self,
        caller: &Caller,
        title_id: i64,
        review_id: i64,
        comment_id: i64,
        req: UpdateCommentRequest,
    ) -> Result<Comment, DomainError> {
        let comment = self.get_comment(title_id, review_id, comment_id).await?;
        authorize(
            Some(caller),
            Action::Update,
            Resource::Feedback {
                author_id: Some(comment.author_id),
            },
        )?;
        let req = req.validate()?;

        self.comments
            .update_comment(comment_id, CommentPatch { text: req.text })
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("comment id: {comment_id}")))
    }

    pub(crate) async fn delete_comment(
        &self,
        caller: &Caller,
        title_id: i64,
        review_id: i64,
        comment_id: i64,
    ) -> Result<(), DomainError> {
        let comment = self.get_comment(title_id, review_id, comment_id).await?;
        authorize(
            Some(caller),
            Action::Delete,
            Resource::Feedback {
                author_id: Some(comment.author_id),
            },
        )?;

        let deleted = self.comments.delete_comment(comment_id).await?;
        if !deleted {
            return Err(DomainError::NotFound(format!("comment id: {comment_id}")));
        }
        Ok(())
    }

    async fn ensure_title(&self, title_id: i64) -> Result<(), DomainError> {
        self.titles
            .get_title(title_id)
            .await?
            .map(|_| ())
            .ok_or_else(|| DomainError::NotFound(format!("title id: {title_id}")))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::Utc;

    use super::FeedbackService;
    use crate::data::Pagination;
    use crate::data::catalog_repository::{
        NewTitle, TitleListFilter, TitlePatch, TitleRecord, TitleRepository,
    };
    use crate::data::feedback_repository::{
        CommentPatch, CommentRepository, NewComment, NewReview, ReviewPatch, ReviewRepository,
        TitleScore,
    };
    use crate::domain::error::DomainError;
    use crate::domain::permission::Caller;
    use crate::domain::review::{
        Comment, CreateCommentRequest, CreateReviewRequest, Review, UpdateReviewRequest,
    };
    use crate::domain::user::Role;

    #[derive(Clone, Default)]
    struct FakeTitleRepo {
        title_ids: Arc<Mutex<Vec<i64>>>,
    }

    impl FakeTitleRepo {
        fn with_title(self, id: i64) -> Self {
            self.title_ids
                .lock()
                .expect("title ids mutex poisoned")
                .push(id);
            self
        }
    }

    #[async_trait]
    impl TitleRepository for FakeTitleRepo {
        async fn create_title(&self, _input: NewTitle) -> Result<TitleRecord, DomainError> {
            unreachable!("not exercised by feedback tests")
        }

        async fn get_title(&self, id: i64) -> Result<Option<TitleRecord>, DomainError> {
            let known = self
                .title_ids
                .lock()
                .expect("title ids mutex poisoned")
                .contains(&id);
            Ok(known.then(|| TitleRecord {
                id,
                name: format!("title {id}"),
                year: 1999,
                description: None,
                genres: Vec::new(),
                category: None,
            }))
        }

        async fn update_title(
            &self,
            _id: i64,
            _patch: TitlePatch,
        ) -> Result<Option<TitleRecord>, DomainError> {
            unreachable!("not exercised by feedback tests")
        }

        async fn delete_title(&self, _id: i64) -> Result<bool, DomainError> {
            unreachable!("not exercised by feedback tests")
        }

        async fn list_titles(
            &self,
            _filter: &TitleListFilter,
            _pagination: Pagination,
        ) -> Result<Vec<TitleRecord>, DomainError> {
            unreachable!("not exercised by feedback tests")
        }

        async fn total_titles(&self, _filter: &TitleListFilter) -> Result<i64, DomainError> {
            unreachable!("not exercised by feedback tests")
        }
    }

    #[derive(Clone, Default)]
    struct FakeReviewRepo {
        reviews: Arc<Mutex<Vec<Review>>>,
    }

    impl FakeReviewRepo {
        fn with_review(self, review: Review) -> Self {
            self.reviews
                .lock()
                .expect("reviews mutex poisoned")
                .push(review);
            self
        }
    }

    #[async_trait]
    impl ReviewRepository for FakeReviewRepo {
        async fn create_review(&self, input: NewReview) -> Result<Review, DomainError> {
            let mut reviews = self.reviews.lock().expect("reviews mutex poisoned");
            // mirrors the storage unique constraint
            if reviews
                .iter()
                .any(|r| r.title_id == input.title_id && r.author_id == input.author_id)
            {
                return Err(DomainError::AlreadyExists("review".to_string()));
            }
            let review = Review {
                id: reviews.len() as i64 + 1,
                title_id: input.title_id,
                author_id: input.author_id,
                author_username: format!("user{}", input.author_id),
                text: input.text,
                score: input.score,
                pub_date: Utc::now(),
            };
            reviews.push(review.clone());
            Ok(review)
        }

        async fn get_review(
            &self,
            title_id: i64,
            review_id: i64,
        ) -> Result<Option<Review>, DomainError> {
            Ok(self
                .reviews
                .lock()
                .expect("reviews mutex poisoned")
                .iter()
                .find(|r| r.id == review_id && r.title_id == title_id)
                .cloned())
        }

        async fn exists_for_author(
            &self,
            title_id: i64,
            author_id: i64,
        ) -> Result<bool, DomainError> {
            Ok(self
                .reviews
                .lock()
                .expect("reviews mutex poisoned")
                .iter()
                .any(|r| r.title_id == title_id && r.author_id == author_id))
        }

        async fn update_review(
            &self,
            review_id: i64,
            patch: ReviewPatch,
        ) -> Result<Option<Review>, DomainError> {
            let mut reviews = self.reviews.lock().expect("reviews mutex poisoned");
            match reviews.iter_mut().find(|r| r.id == review_id) {
                Some(review) => {
                    if let Some(text) = patch.text {
                        review.text = text;
                    }
                    if let Some(score) = patch.score {
                        review.score = score;
                    }
                    Ok(Some(review.clone()))
                }
                None => Ok(None),
            }
        }

        async fn delete_review(&self, review_id: i64) -> Result<bool, DomainError> {
            let mut reviews = self.reviews.lock().expect("reviews mutex poisoned");
            let before = reviews.len();
            reviews.retain(|r| r.id != review_id);
            Ok(reviews.len() < before)
        }

        async fn list_reviews(
            &self,
            title_id: i64,
            _pagination: Pagination,
        ) -> Result<Vec<Review>, DomainError> {
            Ok(self
                .reviews
                .lock()
                .expect("reviews mutex poisoned")
                .iter()
                .filter(|r| r.title_id == title_id)
                .cloned()
                .collect())
        }

        async fn total_reviews(&self, title_id: i64) -> Result<i64, DomainError> {
            Ok(self
                .reviews
                .lock()
                .expect("reviews mutex poisoned")
                .iter()
                .filter(|r| r.title_id == title_id)
                .count() as i64)
        }

        async fn scores_for_titles(
            &self,
            _title_ids: &[i64],
        ) -> Result<Vec<TitleScore>, DomainError> {
            unreachable!("not exercised by feedback tests")
        }
    }

    #[derive(Clone, Default)]
    struct FakeCommentRepo {
        comments: Arc<Mutex<Vec<Comment>>>,
    }

    impl FakeCommentRepo {
        fn with_comment(self, comment: Comment) -> Self {
            self.comments
                .lock()
                .expect("comments mutex poisoned")
                .push(comment);
            self
        }
    }

    #[async_trait]
    impl CommentRepository for FakeCommentRepo {
        async fn create_comment(&self, input: NewComment) -> Result<Comment, DomainError> {
            let mut comments = self.comments.lock().expect("comments mutex poisoned");
            let comment = Comment {
                id: comments.len() as i64 + 1,
                review_id: input.review_id,
                author_id: input.author_id,
                author_username: format!("user{}", input.author_id),
                text: input.text,
                pub_date: Utc::now(),
            };
            comments.push(comment.clone());
            Ok(comment)
        }

        async fn get_comment(
            &self,
            review_id: i64,
            comment_id: i64,
        ) -> Result<Option<Comment>, DomainError> {
            Ok(self
                .comments
                .lock()
                .expect("comments mutex poisoned")
                .iter()
                .find(|c| c.id == comment_id && c.review_id == review_id)
                .cloned())
        }

        async fn update_comment(
            &self,
            comment_id: i64,
            patch: CommentPatch,
        ) -> Result<Option<Comment>, DomainError> {
            let mut comments = self.comments.lock().expect("comments mutex poisoned");
            match comments.iter_mut().find(|c| c.id == comment_id) {
                Some(comment) => {
                    if let Some(text) = patch.text {
                        comment.text = text;
                    }
                    Ok(Some(comment.clone()))
                }
                None => Ok(None),
            }
        }

        async fn delete_comment(&self, comment_id: i64) -> Result<bool, DomainError> {
            let mut comments = self.comments.lock().expect("comments mutex poisoned");
            let before = comments.len();
            comments.retain(|c| c.id != comment_id);
            Ok(comments.len() < before)
        }

        async fn list_comments(
            &self,
            review_id: i64,
            _pagination: Pagination,
        ) -> Result<Vec<Comment>, DomainError> {
            Ok(self
                .comments
                .lock()
                .expect("comments mutex poisoned")
                .iter()
                .filter(|c| c.review_id == review_id)
                .cloned()
                .collect())
        }

        async fn total_comments(&self, review_id: i64) -> Result<i64, DomainError> {
            Ok(self
                .comments
                .lock()
                .expect("comments mutex poisoned")
                .iter()
                .filter(|c| c.review_id == review_id)
                .count() as i64)
        }
    }

    fn caller(user_id: i64, role: Role) -> Caller {
        Caller { user_id, role }
    }

    fn sample_review(id: i64, title_id: i64, author_id: i64) -> Review {
        Review {
            id,
            title_id,
            author_id,
            author_username: format!("user{author_id}"),
            text: "fine work".to_string(),
            score: 7,
            pub_date: Utc::now(),
        }
    }

    fn sample_comment(id: i64, review_id: i64, author_id: i64) -> Comment {
        Comment {
            id,
            review_id,
            author_id,
            author_username: format!("user{author_id}"),
            text: "agreed".to_string(),
            pub_date: Utc::now(),
        }
    }

    fn page() -> Pagination {
        Pagination {
            limit: 20,
            offset: 0,
        }
    }

    fn service(
        titles: FakeTitleRepo,
        reviews: FakeReviewRepo,
        comments: FakeCommentRepo,
    ) -> FeedbackService<FakeTitleRepo, FakeReviewRepo, FakeCommentRepo> {
        FeedbackService::new(titles, reviews, comments)
    }

    #[tokio::test]
    async fn second_review_by_same_author_is_rejected() {
        let svc = service(
            FakeTitleRepo::default().with_title(1),
            FakeReviewRepo::default(),
            FakeCommentRepo::default(),
        );
        let author = caller(5, Role::User);

        svc.create_review(
            &author,
            1,
            CreateReviewRequest {
                text: "first".to_string(),
                score: 3,
            },
        )
        .await
        .expect("first review must succeed");

        let err = svc
            .create_review(
                &author,
                1,
                CreateReviewRequest {
                    text: "second".to_string(),
                    score: 9,
                },
            )
            .await
            .expect_err("second review must be rejected");
        assert!(matches!(err, DomainError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn same_author_may_review_different_titles() {
        let svc = service(
            FakeTitleRepo::default().with_title(1).with_title(2),
            FakeReviewRepo::default(),
            FakeCommentRepo::default(),
        );
        let author = caller(5, Role::User);

        for title_id in [1, 2] {
            svc.create_review(
                &author,
                title_id,
                CreateReviewRequest {
                    text: "review".to_string(),
                    score: 8,
                },
            )
            .await
            .expect("review must succeed");
        }
    }

    #[tokio::test]
    async fn create_review_on_missing_title_is_not_found() {
        let svc = service(
            FakeTitleRepo::default(),
            FakeReviewRepo::default(),
            FakeCommentRepo::default(),
        );

        let err = svc
            .create_review(
                &caller(5, Role::User),
                404,
                CreateReviewRequest {
                    text: "void".to_string(),
                    score: 5,
                },
            )
            .await
            .expect_err("missing title must 404");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn review_is_not_reachable_through_wrong_title() {
        let svc = service(
            FakeTitleRepo::default().with_title(1).with_title(2),
            FakeReviewRepo::default().with_review(sample_review(10, 1, 5)),
            FakeCommentRepo::default(),
        );

        assert!(svc.get_review(1, 10).await.is_ok());
        let err = svc
            .get_review(2, 10)
            .await
            .expect_err("mismatched nesting must 404");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn review_update_respects_ownership_and_roles() {
        let svc = service(
            FakeTitleRepo::default().with_title(1),
            FakeReviewRepo::default().with_review(sample_review(10, 1, 5)),
            FakeCommentRepo::default(),
        );
        let patch = UpdateReviewRequest {
            text: Some("edited".to_string()),
            score: None,
        };

        let err = svc
            .update_review(&caller(6, Role::User), 1, 10, patch.clone())
            .await
            .expect_err("stranger must be rejected");
        assert!(matches!(err, DomainError::Forbidden));

        let updated = svc
            .update_review(&caller(5, Role::User), 1, 10, patch.clone())
            .await
            .expect("author must update");
        assert_eq!(updated.text, "edited");

        svc.update_review(&caller(7, Role::Moderator), 1, 10, patch)
            .await
            .expect("moderator must update");
    }

    #[tokio::test]
    async fn review_delete_allows_admin_and_author() {
        let repo = FakeReviewRepo::default()
            .with_review(sample_review(10, 1, 5))
            .with_review(sample_review(11, 1, 6));
        let svc = service(
            FakeTitleRepo::default().with_title(1),
            repo,
            FakeCommentRepo::default(),
        );

        svc.delete_review(&caller(99, Role::Admin), 1, 10)
            .await
            .expect("admin must delete");
        svc.delete_review(&caller(6, Role::User), 1, 11)
            .await
            .expect("author must delete");
    }

    #[tokio::test]
    async fn comments_are_scoped_to_their_review() {
        let svc = service(
            FakeTitleRepo::default().with_title(1),
            FakeReviewRepo::default()
                .with_review(sample_review(10, 1, 5))
                .with_review(sample_review(11, 1, 6)),
            FakeCommentRepo::default().with_comment(sample_comment(100, 10, 5)),
        );

        assert!(svc.get_comment(1, 10, 100).await.is_ok());
        let err = svc
            .get_comment(1, 11, 100)
            .await
            .expect_err("comment under wrong review must 404");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn comment_create_and_list_round_trip() {
        let svc = service(
            FakeTitleRepo::default().with_title(1),
            FakeReviewRepo::default().with_review(sample_review(10, 1, 5)),
            FakeCommentRepo::default(),
        );

        svc.create_comment(
            &caller(6, Role::User),
            1,
            10,
            CreateCommentRequest {
                text: "well said".to_string(),
            },
        )
        .await
        .expect("comment must be created");

        let listed = svc
            .list_comments(1, 10, page())
            .await
            .expect("list must succeed");
        assert_eq!(listed.total, 1);
        assert_eq!(listed.comments[0].text, "well said");
    }

    #[tokio::test]
    async fn comment_delete_respects_ownership() {
        let svc = service(
            FakeTitleRepo::default().with_title(1),
            FakeReviewRepo::default().with_review(sample_review(10, 1, 5)),
            FakeCommentRepo::default().with_comment(sample_comment(100, 10, 6)),
        );

        let err = svc
            .delete_comment(&caller(7, Role::User), 1, 10, 100)
            .await
            .expect_err("stranger must be rejected");
        assert!(matches!(err, DomainError::Forbidden));

        svc.delete_comment(&caller(6, Role::User), 1, 10, 100)
            .await
            .expect("author must delete");
    }
}
