use std::collections::HashMap;

use crate::data::Pagination;
use crate::data::catalog_repository::{
    CategoryRepository, GenreRepository, NewLookup, NewTitle, TitleListFilter, TitlePatch,
    TitleRecord, TitleRepository,
};
use crate::data::feedback_repository::ReviewRepository;
use crate::domain::catalog::{
    Category, CreateLookupRequest, CreateTitleRequest, Genre, Title, UpdateTitleRequest,
};
use crate::domain::error::DomainError;
use crate::domain::permission::{Action, Caller, Resource, authorize};
use crate::domain::review::mean_score;

#[derive(Debug, Clone)]
pub(crate) struct ListCategoriesResult {
    pub(crate) categories: Vec<Category>,
    pub(crate) limit: u32,
    pub(crate) offset: u32,
    pub(crate) total: i64,
}

#[derive(Debug, Clone)]
pub(crate) struct ListGenresResult {
    pub(crate) genres: Vec<Genre>,
    pub(crate) limit: u32,
    pub(crate) offset: u32,
    pub(crate) total: i64,
}

#[derive(Debug, Clone)]
pub(crate) struct ListTitlesResult {
    pub(crate) titles: Vec<Title>,
    pub(crate) limit: u32,
    pub(crate) offset: u32,
    pub(crate) total: i64,
}

pub(crate) struct CatalogService<C, G, T, R>
where
    C: CategoryRepository,
    G: GenreRepository,
    T: TitleRepository,
    R: ReviewRepository,
{
    categories: C,
    genres: G,
    titles: T,
    reviews: R,
}

impl<C, G, T, R> CatalogService<C, G, T, R>
where
    C: CategoryRepository,
    G: GenreRepository,
    T: TitleRepository,
    R: ReviewRepository,
{
    pub(crate) fn new(categories: C, genres: G, titles: T, reviews: R) -> Self {
        Self {
            categories,
            genres,
            titles,
            reviews,
        }
    }

    pub(crate) async fn list_categories(
        &self,
        search: Option<String>,
        pagination: Pagination,
    ) -> Result<ListCategoriesResult, DomainError> {
        let categories = self
            .categories
            .list_categories(search.as_deref(), pagination)
            .await?;
        let total = self.categories.total_categories(search.as_deref()).await?;

        Ok(ListCategoriesResult {
            categories,
            limit: pagination.limit,
            offset: pagination.offset,
            total,
        })
    }

    pub(crate) async fn create_category(
        &self,
        caller: &Caller,
        req: CreateLookupRequest,
    ) -> Result<Category, DomainError> {
        authorize(Some(caller), Action::Create, Resource::Catalog)?;
        let req = req.validate()?;

        self.categories
            .create_category(NewLookup {
                name: req.name,
                slug: req.slug,
            })
            .await
    }

    pub(crate) async fn delete_category(
        &self,
        caller: &Caller,
        slug: &str,
    ) -> Result<(), DomainError> {
        authorize(Some(caller), Action::Delete, Resource::Catalog)?;

        let deleted = self.categories.delete_by_slug(slug).await?;
        if !deleted {
            return Err(DomainError::NotFound(format!("category: {slug}")));
        }
        Ok(())
    }

    pub(crate) async fn list_genres(
        &self,
        search: Option<String>,
        pagination: Pagination,
    ) -> Result<ListGenresResult, DomainError> {
        let genres = self
            .genres
            .list_genres(search.as_deref(), pagination)
            .await?;
        let total = self.genres.total_genres(search.as_deref()).await?;

        Ok(ListGenresResult {
            genres,
            limit: pagination.limit,
            offset: pagination.offset,
            total,
        })
    }

    pub(crate) async fn create_genre(
        &self,
        caller: &Caller,
        req: CreateLookupRequest,
    ) -> Result<Genre, DomainError> {
        authorize(Some(caller), Action::Create, Resource::Catalog)?;
        let req = req.validate()?;

        self.genres
            .create_genre(NewLookup {
                name: req.name,
                slug: req.slug,
            })
            .await
    }

    pub(crate) async fn delete_genre(
        &self,
        caller: &Caller,
        slug: &str,
    ) -> Result<(), DomainError> {
        authorize(Some(caller), Action::Delete, Resource::Catalog)?;

        let deleted = self.genres.delete_by_slug(slug).await?;
        if !deleted {
            return Err(DomainError::NotFound(format!("genre: {slug}")));
        }
        Ok(())
    }

    pub(crate) async fn list_titles(
        &self,
        filter: TitleListFilter,
        pagination: Pagination,
    ) -> Result<ListTitlesResult, DomainError> {
        let records = self.titles.list_titles(&filter, pagination).await?;
        let total = self.titles.total_titles(&filter).await?;
        let titles = self.with_ratings(records).await?;

        Ok(ListTitlesResult {
            titles,
            limit: pagination.limit,
            offset: pagination.offset,
            total,
        })
    }

    pub(crate) async fn get_title(&self, id: i64) -> Result<Title, DomainError> {
        let record = self
            .titles
            .get_title(id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("title id: {id}")))?;

        let mut titles = self.with_ratings(vec![record]).await?;
        Ok(titles.remove(0))
    }

    pub(crate) async fn create_title(
        &self,
        caller: &Caller,
        req: CreateTitleRequest,
    ) -> Result<Title, DomainError> {
        authorize(Some(caller), Action::Create, Resource::Catalog)?;
        let req = req.validate()?;

        let category_id = match &req.category {
            Some(slug) => Some(self.resolve_category(slug).await?),
            None => None,
        };
        let genre_ids = self.resolve_genres(&req.genre).await?;

        let record = self
            .titles
            .create_title(NewTitle {
                name: req.name,
                year: req.year,
                description: req.description,
                category_id,
                genre_ids,
            })
            .await?;

        // freshly created, no reviews yet
        Ok(into_title(record, None))
    }

    pub(crate) async fn update_title(
        &self,
        caller: &Caller,
        id: i64,
        req: UpdateTitleRequest,
    ) -> Result<Title, DomainError> {
        authorize(Some(caller), Action::Update, Resource::Catalog)?;
        let req = req.validate()?;

        let category_id = match &req.category {
            Some(slug) => Some(self.resolve_category(slug).await?),
            None => None,
        };
        let genre_ids = match &req.genre {
            Some(slugs) => Some(self.resolve_genres(slugs).await?),
            None => None,
        };

        let record = self
            .titles
            .update_title(
                id,
                TitlePatch {
                    name: req.name,
                    year: req.year,
                    description: req.description,
                    category_id,
                    genre_ids,
                },
            )
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("title id: {id}")))?;

        let mut titles = self.with_ratings(vec![record]).await?;
        Ok(titles.remove(0))
    }

    pub(crate) async fn delete_title(&self, caller: &Caller, id: i64) -> Result<(), DomainError> {
        authorize(Some(caller), Action::Delete, Resource::Catalog)?;

        let deleted = self.titles.delete_title(id).await?;
        if !deleted {
            return Err(DomainError::NotFound(format!("title id: {id}")));
        }
        Ok(())
    }

    async fn resolve_category(&self, slug: &str) -> Result<i64, DomainError> {
        self.categories
            .find_by_slug(slug)
            .await?
            .map(|category| category.id)
            .ok_or(DomainError::Validation {
                field: "category",
                message: "unknown category slug",
            })
    }

    async fn resolve_genres(&self, slugs: &[String]) -> Result<Vec<i64>, DomainError> {
        let mut wanted = slugs.to_vec();
        wanted.sort();
        wanted.dedup();
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        let genres = self.genres.find_by_slugs(&wanted).await?;
        if genres.len() != wanted.len() {
            return Err(DomainError::Validation {
                field: "genre",
                message: "unknown genre slug",
            });
        }
        Ok(genres.into_iter().map(|genre| genre.id).collect())
    }

    async fn with_ratings(
        &self,
        records: Vec<TitleRecord>,
    ) -> Result<Vec<Title>, DomainError> {
        let ids: Vec<i64> = records.iter().map(|record| record.id).collect();
        let scores = self.reviews.scores_for_titles(&ids).await?;

        let mut by_title: HashMap<i64, Vec<i16>> = HashMap::new();
        for entry in scores {
            by_title.entry(entry.title_id).or_default().push(entry.score);
        }

        Ok(records
            .into_iter()
            .map(|record| {
                let rating = by_title
                    .get(&record.id)
                    .and_then(|scores| mean_score(scores));
                into_title(record, rating)
            })
            .collect())
    }
}

fn into_title(record: TitleRecord, rating: Option<f64>) -> Title {
    Title {
        id: record.id,
        name: record.name,
        year: record.year,
        description: record.description,
        genres: record.genres,
        category: record.category,
        rating,
    }
}
