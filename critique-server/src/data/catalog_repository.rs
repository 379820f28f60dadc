use async_trait::async_trait;

use super::Pagination;
use crate::domain::catalog::{Category, Genre};
use crate::domain::error::DomainError;

#[derive(Debug, Clone)]
pub(crate) struct NewLookup {
    pub(crate) name: String,
    pub(crate) slug: String,
}

/// Title row with its links resolved; rating is layered on top by the
/// catalog service.
#[derive(Debug, Clone)]
pub(crate) struct TitleRecord {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) year: i32,
    pub(crate) description: Option<String>,
    pub(crate) genres: Vec<Genre>,
    pub(crate) category: Option<Category>,
}

#[derive(Debug, Clone)]
pub(crate) struct NewTitle {
    pub(crate) name: String,
    pub(crate) year: i32,
    pub(crate) description: Option<String>,
    pub(crate) category_id: Option<i64>,
    pub(crate) genre_ids: Vec<i64>,
}

/// `None` leaves the field untouched; `genre_ids` replaces the whole set.
#[derive(Debug, Clone, Default)]
pub(crate) struct TitlePatch {
    pub(crate) name: Option<String>,
    pub(crate) year: Option<i32>,
    pub(crate) description: Option<String>,
    pub(crate) category_id: Option<i64>,
    pub(crate) genre_ids: Option<Vec<i64>>,
}

/// AND-composed list filters; absent fields are no-ops. Slug terms match as
/// case-insensitive substrings.
#[derive(Debug, Clone, Default)]
pub(crate) struct TitleListFilter {
    pub(crate) genre_slug: Option<String>,
    pub(crate) category_slug: Option<String>,
    pub(crate) name: Option<String>,
    pub(crate) year: Option<i32>,
}

#[async_trait]
pub(crate) trait CategoryRepository: Send + Sync {
    async fn create_category(&self, input: NewLookup) -> Result<Category, DomainError>;
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, DomainError>;
    async fn list_categories(
        &self,
        search: Option<&str>,
        pagination: Pagination,
    ) -> Result<Vec<Category>, DomainError>;
    async fn total_categories(&self, search: Option<&str>) -> Result<i64, DomainError>;
    async fn delete_by_slug(&self, slug: &str) -> Result<bool, DomainError>;
}

#[async_trait]
pub(crate) trait GenreRepository: Send + Sync {
    async fn create_genre(&self, input: NewLookup) -> Result<Genre, DomainError>;
    async fn find_by_slugs(&self, slugs: &[String]) -> Result<Vec<Genre>, DomainError>;
    async fn list_genres(
        &self,
        search: Option<&str>,
        pagination: Pagination,
    ) -> Result<Vec<Genre>, DomainError>;
    async fn total_genres(&self, search: Option<&str>) -> Result<i64, DomainError>;
    async fn delete_by_slug(&self, slug: &str) -> Result<bool, DomainError>;
}

#[async_trait]
pub(crate) trait TitleRepository: Send + Sync {
    async fn create_title(&self, input: NewTitle) -> Result<TitleRecord, DomainError>;
    async fn get_title(&self, id: i64) -> Result<Option<TitleRecord>, DomainError>;
    async fn update_title(
        &self,
        id: i64,
        patch: TitlePatch,
    ) -> Result<Option<TitleRecord>, DomainError>;
    async fn delete_title(&self, id: i64) -> Result<bool, DomainError>;
    async fn list_titles(
        &self,
        filter: &TitleListFilter,
        pagination: Pagination,
    ) -> Result<Vec<TitleRecord>, DomainError>;
    async fn total_titles(&self, filter: &TitleListFilter) -> Result<i64, DomainError>;
}
