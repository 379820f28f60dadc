use std::sync::Arc;

use sqlx::PgPool;

use crate::application::account_service::AccountService;
use crate::application::auth_service::AuthService;
use crate::application::catalog_service::CatalogService;
use crate::application::feedback_service::FeedbackService;
use crate::data::repositories::postgres::catalog_repository::{
    PostgresCategoryRepository, PostgresGenreRepository, PostgresTitleRepository,
};
use crate::data::repositories::postgres::feedback_repository::{
    PostgresCommentRepository, PostgresReviewRepository,
};
use crate::data::repositories::postgres::user_repository::PostgresUserRepository;
use crate::infrastructure::jwt::JwtService;
use crate::infrastructure::mailer::LogMailer;
use crate::infrastructure::settings::Settings;

pub(crate) mod app_error;
pub(crate) mod handlers;
pub(crate) mod middleware;
pub(crate) mod openapi;
pub(crate) mod routes;

type PgAuthService = AuthService<PostgresUserRepository, LogMailer>;
type PgAccountService = AccountService<PostgresUserRepository>;
type PgCatalogService = CatalogService<
    PostgresCategoryRepository,
    PostgresGenreRepository,
    PostgresTitleRepository,
    PostgresReviewRepository,
>;
type PgFeedbackService =
    FeedbackService<PostgresTitleRepository, PostgresReviewRepository, PostgresCommentRepository>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) auth_service: Arc<PgAuthService>,
    pub(crate) account_service: Arc<PgAccountService>,
    pub(crate) catalog_service: Arc<PgCatalogService>,
    pub(crate) feedback_service: Arc<PgFeedbackService>,
    pub(crate) users: Arc<PostgresUserRepository>,
    pub(crate) jwt: Arc<JwtService>,
}

impl AppState {
    pub(crate) fn new(pool: PgPool, settings: &Settings) -> Self {
        let jwt = Arc::new(JwtService::new(
            &settings.jwt_secret,
            settings.jwt_ttl_seconds,
        ));
        let users = Arc::new(PostgresUserRepository::new(pool.clone()));

        let auth_service = Arc::new(AuthService::new(
            PostgresUserRepository::new(pool.clone()),
            LogMailer,
            jwt.clone(),
        ));
        let account_service = Arc::new(AccountService::new(PostgresUserRepository::new(
            pool.clone(),
        )));
        let catalog_service = Arc::new(CatalogService::new(
            PostgresCategoryRepository::new(pool.clone()),
            PostgresGenreRepository::new(pool.clone()),
            PostgresTitleRepository::new(pool.clone()),
            PostgresReviewRepository::new(pool.clone()),
        ));
        let feedback_service = Arc::new(FeedbackService::new(
            PostgresTitleRepository::new(pool.clone()),
            PostgresReviewRepository::new(pool.clone()),
            PostgresCommentRepository::new(pool),
        ));

        Self {
            auth_service,
            account_service,
            catalog_service,
            feedback_service,
            users,
            jwt,
        }
    }
}
