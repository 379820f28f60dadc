use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;

use super::like_pattern;
use crate::data::Pagination;
use crate::data::catalog_repository::{
    CategoryRepository, GenreRepository, NewLookup, NewTitle, TitleListFilter, TitlePatch,
    TitleRecord, TitleRepository,
};
use crate::domain::catalog::{Category, Genre};
use crate::domain::error::DomainError;

const LOOKUP_COLUMNS: &str = "id, name, slug";

const TITLE_COLUMNS: &str = "t.id, t.name, t.year, t.description, \
    c.id AS category_id, c.name AS category_name, c.slug AS category_slug";

/// AND-composed filter conditions shared by the title list and count
/// queries; `$1..$4` are genre pattern, category pattern, exact name, exact
/// year, each nullable.
const TITLE_FILTER: &str = "($1::text IS NULL OR EXISTS (\
        SELECT 1 FROM title_genres tg \
        JOIN genres g ON g.id = tg.genre_id \
        WHERE tg.title_id = t.id AND g.slug ILIKE $1)) \
    AND ($2::text IS NULL OR c.slug ILIKE $2) \
    AND ($3::text IS NULL OR t.name = $3) \
    AND ($4::int4 IS NULL OR t.year = $4)";

#[derive(sqlx::FromRow)]
struct LookupRow {
    id: i64,
    name: String,
    slug: String,
}

#[derive(sqlx::FromRow)]
struct TitleRow {
    id: i64,
    name: String,
    year: i32,
    description: Option<String>,
    category_id: Option<i64>,
    category_name: Option<String>,
    category_slug: Option<String>,
}

#[derive(sqlx::FromRow)]
struct TitleGenreRow {
    title_id: i64,
    id: i64,
    name: String,
    slug: String,
}

impl TitleRow {
    fn into_record(self, genres: Vec<Genre>) -> TitleRecord {
        let category = match (self.category_id, self.category_name, self.category_slug) {
            (Some(id), Some(name), Some(slug)) => Some(Category { id, name, slug }),
            _ => None,
        };
        TitleRecord {
            id: self.id,
            name: self.name,
            year: self.year,
            description: self.description,
            genres,
            category,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct PostgresCategoryRepository {
    pool: PgPool,
}

impl PostgresCategoryRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CategoryRepository for PostgresCategoryRepository {
    async fn create_category(&self, input: NewLookup) -> Result<Category, DomainError> {
        let query = format!(
            "INSERT INTO categories (name, slug) VALUES ($1, $2) RETURNING {LOOKUP_COLUMNS}"
        );
        let row = sqlx::query_as::<_, LookupRow>(&query)
            .bind(&input.name)
            .bind(&input.slug)
            .fetch_one(&self.pool)
            .await
            .map_err(map_catalog_db_error)?;

        Ok(Category {
            id: row.id,
            name: row.name,
            slug: row.slug,
        })
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Category>, DomainError> {
        let query = format!("SELECT {LOOKUP_COLUMNS} FROM categories WHERE slug = $1");
        let row = sqlx::query_as::<_, LookupRow>(&query)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_catalog_db_error)?;

        Ok(row.map(|r| Category {
            id: r.id,
            name: r.name,
            slug: r.slug,
        }))
    }

    async fn list_categories(
        &self,
        search: Option<&str>,
        pagination: Pagination,
    ) -> Result<Vec<Category>, DomainError> {
        let query = format!(
            "SELECT {LOOKUP_COLUMNS} FROM categories \
             WHERE ($1::text IS NULL OR name ILIKE $1) \
             ORDER BY slug \
             LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, LookupRow>(&query)
            .bind(search.map(like_pattern))
            .bind(i64::from(pagination.limit))
            .bind(i64::from(pagination.offset))
            .fetch_all(&self.pool)
            .await
            .map_err(map_catalog_db_error)?;

        Ok(rows
            .into_iter()
            .map(|r| Category {
                id: r.id,
                name: r.name,
                slug: r.slug,
            })
            .collect())
    }

    async fn total_categories(&self, search: Option<&str>) -> Result<i64, DomainError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM categories WHERE ($1::text IS NULL OR name ILIKE $1)",
        )
        .bind(search.map(like_pattern))
        .fetch_one(&self.pool)
        .await
        .map_err(map_catalog_db_error)?;

        Ok(total)
    }

    async fn delete_by_slug(&self, slug: &str) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM categories WHERE slug = $1")
            .bind(slug)
            .execute(&self.pool)
            .await
            .map_err(map_catalog_db_error)?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct PostgresGenreRepository {
    pool: PgPool,
}

impl PostgresGenreRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GenreRepository for PostgresGenreRepository {
    async fn create_genre(&self, input: NewLookup) -> Result<Genre, DomainError> {
        let query =
            format!("INSERT INTO genres (name, slug) VALUES ($1, $2) RETURNING {LOOKUP_COLUMNS}");
        let row = sqlx::query_as::<_, LookupRow>(&query)
            .bind(&input.name)
            .bind(&input.slug)
            .fetch_one(&self.pool)
            .await
            .map_err(map_catalog_db_error)?;

        Ok(Genre {
            id: row.id,
            name: row.name,
            slug: row.slug,
        })
    }

    async fn find_by_slugs(&self, slugs: &[String]) -> Result<Vec<Genre>, DomainError> {
        let query = format!("SELECT {LOOKUP_COLUMNS} FROM genres WHERE slug = ANY($1)");
        let rows = sqlx::query_as::<_, LookupRow>(&query)
            .bind(slugs)
            .fetch_all(&self.pool)
            .await
            .map_err(map_catalog_db_error)?;

        Ok(rows
            .into_iter()
            .map(|r| Genre {
                id: r.id,
                name: r.name,
                slug: r.slug,
            })
            .collect())
    }

    async fn list_genres(
        &self,
        search: Option<&str>,
        pagination: Pagination,
    ) -> Result<Vec<Genre>, DomainError> {
        let query = format!(
            "SELECT {LOOKUP_COLUMNS} FROM genres \
             WHERE ($1::text IS NULL OR name ILIKE $1) \
             ORDER BY slug \
             LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, LookupRow>(&query)
            .bind(search.map(like_pattern))
            .bind(i64::from(pagination.limit))
            .bind(i64::from(pagination.offset))
            .fetch_all(&self.pool)
            .await
            .map_err(map_catalog_db_error)?;

        Ok(rows
            .into_iter()
            .map(|r| Genre {
                id: r.id,
                name: r.name,
                slug: r.slug,
            })
            .collect())
    }

    async fn total_genres(&self, search: Option<&str>) -> Result<i64, DomainError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM genres WHERE ($1::text IS NULL OR name ILIKE $1)",
        )
        .bind(search.map(like_pattern))
        .fetch_one(&self.pool)
        .await
        .map_err(map_catalog_db_error)?;

        Ok(total)
    }

    async fn delete_by_slug(&self, slug: &str) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM genres WHERE slug = $1")
            .bind(slug)
            .execute(&self.pool)
            .await
            .map_err(map_catalog_db_error)?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct PostgresTitleRepository {
    pool: PgPool,
}

impl PostgresTitleRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn genres_for_titles(
        &self,
        title_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<Genre>>, DomainError> {
        if title_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let rows = sqlx::query_as::<_, TitleGenreRow>(
            "SELECT tg.title_id, g.id, g.name, g.slug \
             FROM title_genres tg \
             JOIN genres g ON g.id = tg.genre_id \
             WHERE tg.title_id = ANY($1) \
             ORDER BY g.slug",
        )
        .bind(title_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_catalog_db_error)?;

        let mut by_title: HashMap<i64, Vec<Genre>> = HashMap::new();
        for row in rows {
            by_title.entry(row.title_id).or_default().push(Genre {
                id: row.id,
                name: row.name,
                slug: row.slug,
            });
        }
        Ok(by_title)
    }

    async fn replace_genre_links(
        tx: &mut sqlx::PgConnection,
        title_id: i64,
        genre_ids: &[i64],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM title_genres WHERE title_id = $1")
            .bind(title_id)
            .execute(&mut *tx)
            .await?;
        if !genre_ids.is_empty() {
            sqlx::query(
                "INSERT INTO title_genres (title_id, genre_id) \
                 SELECT $1, genre_id FROM unnest($2::bigint[]) AS g (genre_id)",
            )
            .bind(title_id)
            .bind(genre_ids)
            .execute(&mut *tx)
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl TitleRepository for PostgresTitleRepository {
    async fn create_title(&self, input: NewTitle) -> Result<TitleRecord, DomainError> {
        let mut tx = self.pool.begin().await.map_err(map_catalog_db_error)?;

        let title_id = sqlx::query_scalar::<_, i64>(
            "INSERT INTO titles (name, year, description, category_id) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id",
        )
        .bind(&input.name)
        .bind(input.year)
        .bind(&input.description)
        .bind(input.category_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_catalog_db_error)?;

        Self::replace_genre_links(&mut tx, title_id, &input.genre_ids)
            .await
            .map_err(map_catalog_db_error)?;

        tx.commit().await.map_err(map_catalog_db_error)?;

        self.get_title(title_id).await?.ok_or_else(|| {
            DomainError::Unexpected(format!("created title {title_id} disappeared"))
        })
    }

    async fn get_title(&self, id: i64) -> Result<Option<TitleRecord>, DomainError> {
        let query = format!(
            "SELECT {TITLE_COLUMNS} FROM titles t \
             LEFT JOIN categories c ON c.id = t.category_id \
             WHERE t.id = $1"
        );
        let row = sqlx::query_as::<_, TitleRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_catalog_db_error)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut genres = self.genres_for_titles(&[row.id]).await?;
        let genres = genres.remove(&row.id).unwrap_or_default();
        Ok(Some(row.into_record(genres)))
    }

    async fn update_title(
        &self,
        id: i64,
        patch: TitlePatch,
    ) -> Result<Option<TitleRecord>, DomainError> {
        let mut tx = self.pool.begin().await.map_err(map_catalog_db_error)?;

        let updated = sqlx::query_scalar::<_, i64>(
            "UPDATE titles SET \
                name        = COALESCE($1, name), \
                year        = COALESCE($2, year), \
                description = COALESCE($3, description), \
                category_id = COALESCE($4, category_id) \
             WHERE id = $5 \
             RETURNING id",
        )
        .bind(&patch.name)
        .bind(patch.year)
        .bind(&patch.description)
        .bind(patch.category_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_catalog_db_error)?;

        if updated.is_none() {
            return Ok(None);
        }
        if let Some(genre_ids) = &patch.genre_ids {
            Self::replace_genre_links(&mut tx, id, genre_ids)
                .await
                .map_err(map_catalog_db_error)?;
        }

        tx.commit().await.map_err(map_catalog_db_error)?;

        self.get_title(id).await
    }

    async fn delete_title(&self, id: i64) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM titles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_catalog_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_titles(
        &self,
        filter: &TitleListFilter,
        pagination: Pagination,
    ) -> Result<Vec<TitleRecord>, DomainError> {
        let query = format!(
            "SELECT {TITLE_COLUMNS} FROM titles t \
             LEFT JOIN categories c ON c.id = t.category_id \
             WHERE {TITLE_FILTER} \
             ORDER BY t.id \
             LIMIT $5 OFFSET $6"
        );
        let rows = sqlx::query_as::<_, TitleRow>(&query)
            .bind(filter.genre_slug.as_deref().map(like_pattern))
            .bind(filter.category_slug.as_deref().map(like_pattern))
            .bind(&filter.name)
            .bind(filter.year)
            .bind(i64::from(pagination.limit))
            .bind(i64::from(pagination.offset))
            .fetch_all(&self.pool)
            .await
            .map_err(map_catalog_db_error)?;

        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let mut genres = self.genres_for_titles(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let title_genres = genres.remove(&row.id).unwrap_or_default();
                row.into_record(title_genres)
            })
            .collect())
    }

    async fn total_titles(&self, filter: &TitleListFilter) -> Result<i64, DomainError> {
        let query = format!(
            "SELECT COUNT(*) FROM titles t \
             LEFT JOIN categories c ON c.id = t.category_id \
             WHERE {TITLE_FILTER}"
        );
        let total = sqlx::query_scalar::<_, i64>(&query)
            .bind(filter.genre_slug.as_deref().map(like_pattern))
            .bind(filter.category_slug.as_deref().map(like_pattern))
            .bind(&filter.name)
            .bind(filter.year)
            .fetch_one(&self.pool)
            .await
            .map_err(map_catalog_db_error)?;

        Ok(total)
    }
}

fn map_catalog_db_error(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.code().as_deref() == Some("23505")
    {
        let resource = match db_err.constraint() {
            Some("categories_slug_key") | Some("genres_slug_key") => "slug",
            _ => "catalog entry",
        };
        return DomainError::AlreadyExists(resource.to_string());
    }
    DomainError::Unexpected(err.to_string())
}
