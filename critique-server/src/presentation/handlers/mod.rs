use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::data::Pagination;

pub(crate) mod auth;
pub(crate) mod categories;
pub(crate) mod comments;
pub(crate) mod genres;
pub(crate) mod reviews;
pub(crate) mod titles;
pub(crate) mod users;

/// Shared list query: optional name/username search plus limit/offset.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct ListQuery {
    pub(crate) search: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub(crate) limit: Option<u32>,
    pub(crate) offset: Option<u32>,
}

pub(crate) fn pagination(limit: Option<u32>, offset: Option<u32>) -> Pagination {
    Pagination {
        limit: limit.unwrap_or(20),
        offset: offset.unwrap_or(0),
    }
}
