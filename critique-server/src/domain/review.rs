use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;

pub(crate) const SCORE_MIN: i16 = 1;
pub(crate) const SCORE_MAX: i16 = 10;

#[derive(Debug, Clone)]
pub(crate) struct Review {
    pub(crate) id: i64,
    pub(crate) title_id: i64,
    pub(crate) author_id: i64,
    pub(crate) author_username: String,
    pub(crate) text: String,
    pub(crate) score: i16,
    pub(crate) pub_date: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub(crate) struct Comment {
    pub(crate) id: i64,
    pub(crate) review_id: i64,
    pub(crate) author_id: i64,
    pub(crate) author_username: String,
    pub(crate) text: String,
    pub(crate) pub_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CreateReviewRequest {
    pub(crate) text: String,
    pub(crate) score: i16,
}

impl CreateReviewRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let text = normalize_text(&self.text)?;
        validate_score(self.score)?;
        Ok(Self {
            text,
            score: self.score,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct UpdateReviewRequest {
    pub(crate) text: Option<String>,
    pub(crate) score: Option<i16>,
}

impl UpdateReviewRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let text = self.text.as_deref().map(normalize_text).transpose()?;
        if let Some(score) = self.score {
            validate_score(score)?;
        }
        Ok(Self {
            text,
            score: self.score,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CreateCommentRequest {
    pub(crate) text: String,
}

impl CreateCommentRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            text: normalize_text(&self.text)?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct UpdateCommentRequest {
    pub(crate) text: Option<String>,
}

impl UpdateCommentRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            text: self.text.as_deref().map(normalize_text).transpose()?,
        })
    }
}

/// Arithmetic mean of review scores; `None` when there are none.
pub(crate) fn mean_score(scores: &[i16]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let sum: i64 = scores.iter().map(|score| i64::from(*score)).sum();
    Some(sum as f64 / scores.len() as f64)
}

fn normalize_text(text: &str) -> Result<String, DomainError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DomainError::Validation {
            field: "text",
            message: "must not be empty",
        });
    }
    Ok(text.to_string())
}

fn validate_score(score: i16) -> Result<(), DomainError> {
    if !(SCORE_MIN..=SCORE_MAX).contains(&score) {
        return Err(DomainError::Validation {
            field: "score",
            message: "must be in 1..=10",
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{CreateReviewRequest, UpdateReviewRequest, mean_score};
    use crate::domain::error::DomainError;

    #[test]
    fn score_must_be_in_range() {
        for score in [0, 11, -1] {
            let req = CreateReviewRequest {
                text: "fine".to_string(),
                score,
            };
            let err = req.validate().expect_err("out-of-range score must fail");
            assert!(matches!(err, DomainError::Validation { field: "score", .. }));
        }
        for score in [1, 10] {
            let req = CreateReviewRequest {
                text: "fine".to_string(),
                score,
            };
            assert!(req.validate().is_ok());
        }
    }

    #[test]
    fn update_validates_only_present_fields() {
        let req = UpdateReviewRequest {
            text: None,
            score: Some(7),
        };
        assert!(req.validate().is_ok());

        let req = UpdateReviewRequest {
            text: Some("   ".to_string()),
            score: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn mean_score_is_unset_without_reviews() {
        assert_eq!(mean_score(&[]), None);
    }

    #[test]
    fn mean_score_is_arithmetic_mean() {
        assert_eq!(mean_score(&[8, 10]), Some(9.0));
        assert_eq!(mean_score(&[1, 2]), Some(1.5));
        assert_eq!(mean_score(&[7]), Some(7.0));
    }
}
