use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;

const NAME_MAX_LEN: usize = 256;
const SLUG_MAX_LEN: usize = 50;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Category {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Genre {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) slug: String,
}

/// A reviewable work. `rating` is computed from review scores on read and
/// never persisted.
#[derive(Debug, Clone)]
pub(crate) struct Title {
    pub(crate) id: i64,
    pub(crate) name: String,
    pub(crate) year: i32,
    pub(crate) description: Option<String>,
    pub(crate) genres: Vec<Genre>,
    pub(crate) category: Option<Category>,
    pub(crate) rating: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CreateLookupRequest {
    pub(crate) name: String,
    pub(crate) slug: String,
}

impl CreateLookupRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            name: normalize_name(&self.name)?,
            slug: normalize_slug(&self.slug)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CreateTitleRequest {
    pub(crate) name: String,
    pub(crate) year: i32,
    pub(crate) description: Option<String>,
    pub(crate) genre: Vec<String>,
    pub(crate) category: Option<String>,
}

impl CreateTitleRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let name = normalize_name(&self.name)?;
        validate_year(self.year)?;
        let genre = self
            .genre
            .iter()
            .map(|slug| normalize_slug(slug))
            .collect::<Result<Vec<_>, _>>()?;
        let category = self.category.as_deref().map(normalize_slug).transpose()?;

        Ok(Self {
            name,
            year: self.year,
            description: self.description,
            genre,
            category,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct UpdateTitleRequest {
    pub(crate) name: Option<String>,
    pub(crate) year: Option<i32>,
    pub(crate) description: Option<String>,
    pub(crate) genre: Option<Vec<String>>,
    pub(crate) category: Option<String>,
}

impl UpdateTitleRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let name = self.name.as_deref().map(normalize_name).transpose()?;
        if let Some(year) = self.year {
            validate_year(year)?;
        }
        let genre = self
            .genre
            .map(|slugs| {
                slugs
                    .iter()
                    .map(|slug| normalize_slug(slug))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()?;
        let category = self.category.as_deref().map(normalize_slug).transpose()?;

        Ok(Self {
            name,
            year: self.year,
            description: self.description,
            genre,
            category,
        })
    }
}

fn normalize_name(name: &str) -> Result<String, DomainError> {
    let name = name.trim();
    if name.is_empty() || name.len() > NAME_MAX_LEN {
        return Err(DomainError::Validation {
            field: "name",
            message: "must be 1..256 chars",
        });
    }
    Ok(name.to_string())
}

pub(crate) fn normalize_slug(slug: &str) -> Result<String, DomainError> {
    let slug = slug.trim();
    if slug.is_empty() || slug.len() > SLUG_MAX_LEN {
        return Err(DomainError::Validation {
            field: "slug",
            message: "must be 1..50 chars",
        });
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(DomainError::Validation {
            field: "slug",
            message: "may contain only latin letters, digits, - and _",
        });
    }
    Ok(slug.to_string())
}

fn validate_year(year: i32) -> Result<(), DomainError> {
    if year > Utc::now().year() {
        return Err(DomainError::Validation {
            field: "year",
            message: "must not be in the future",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Utc};

    use super::{CreateLookupRequest, CreateTitleRequest, normalize_slug};
    use crate::domain::error::DomainError;

    #[test]
    fn slug_charset_rules_are_applied() {
        assert!(normalize_slug("science-fiction").is_ok());
        assert!(normalize_slug("sci_fi_2").is_ok());
        assert!(normalize_slug("with space").is_err());
        assert!(normalize_slug("ünïcode").is_err());
        assert!(normalize_slug("").is_err());
    }

    #[test]
    fn lookup_request_normalizes_fields() {
        let req = CreateLookupRequest {
            name: "  Science Fiction  ".to_string(),
            slug: " science-fiction ".to_string(),
        };
        let validated = req.validate().expect("must be valid");
        assert_eq!(validated.name, "Science Fiction");
        assert_eq!(validated.slug, "science-fiction");
    }

    #[test]
    fn title_year_must_not_be_in_the_future() {
        let req = CreateTitleRequest {
            name: "Future Work".to_string(),
            year: Utc::now().year() + 1,
            description: None,
            genre: vec![],
            category: None,
        };
        let err = req.validate().expect_err("future year must fail");
        assert!(matches!(err, DomainError::Validation { field: "year", .. }));
    }

    #[test]
    fn title_request_validates_nested_slugs() {
        let req = CreateTitleRequest {
            name: "Valid".to_string(),
            year: 1999,
            description: Some("desc".to_string()),
            genre: vec!["drama".to_string(), "bad slug".to_string()],
            category: None,
        };
        assert!(req.validate().is_err());
    }
}
