use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use super::error::DomainError;

/// Reserved by the self-service profile route.
pub(crate) const RESERVED_USERNAME: &str = "me";

const USERNAME_MAX_LEN: usize = 150;
const EMAIL_MAX_LEN: usize = 254;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Role {
    #[default]
    User,
    Moderator,
    Admin,
}

impl Role {
    pub(crate) fn is_admin(self) -> bool {
        self == Role::Admin
    }

    pub(crate) fn is_moderator(self) -> bool {
        self == Role::Moderator
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Moderator => "moderator",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Role::User),
            "moderator" => Ok(Role::Moderator),
            "admin" => Ok(Role::Admin),
            _ => Err(DomainError::Validation {
                field: "role",
                message: "must be one of: user, moderator, admin",
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct User {
    pub(crate) id: i64,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) role: Role,
    pub(crate) bio: Option<String>,
    pub(crate) first_name: Option<String>,
    pub(crate) last_name: Option<String>,
}

impl User {
    pub(crate) fn new(
        id: i64,
        username: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        bio: Option<String>,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Result<Self, DomainError> {
        if id <= 0 {
            return Err(DomainError::Validation {
                field: "id",
                message: "must be > 0",
            });
        }
        let username = normalize_username(&username.into())?;
        let email = normalize_email(&email.into())?;

        Ok(Self {
            id,
            username,
            email,
            role,
            bio,
            first_name,
            last_name,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SignupRequest {
    pub(crate) username: String,
    pub(crate) email: String,
}

impl SignupRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let username = normalize_username(&self.username)?;
        if username == RESERVED_USERNAME {
            return Err(DomainError::Validation {
                field: "username",
                message: "'me' is not allowed as a username",
            });
        }
        let email = normalize_email(&self.email)?;
        Ok(Self { username, email })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TokenRequest {
    pub(crate) username: String,
    pub(crate) confirmation_code: String,
}

impl TokenRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        let username = self.username.trim();
        if username.is_empty() || username.len() > USERNAME_MAX_LEN {
            return Err(DomainError::Validation {
                field: "username",
                message: "must be 1..150 chars",
            });
        }
        if self.confirmation_code.trim().is_empty() {
            return Err(DomainError::Validation {
                field: "confirmation_code",
                message: "must not be empty",
            });
        }
        Ok(Self {
            username: username.to_string(),
            confirmation_code: self.confirmation_code,
        })
    }
}

pub(crate) fn normalize_username(username: &str) -> Result<String, DomainError> {
    let username = username.trim();
    if username.is_empty() || username.len() > USERNAME_MAX_LEN {
        return Err(DomainError::Validation {
            field: "username",
            message: "must be 1..150 chars",
        });
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
    {
        return Err(DomainError::Validation {
            field: "username",
            message: "may contain only letters, digits and @/./+/-/_",
        });
    }
    Ok(username.to_string())
}

pub(crate) fn normalize_email(email: &str) -> Result<String, DomainError> {
    let email = email.trim().to_lowercase();
    if email.len() > EMAIL_MAX_LEN || !email.validate_email() {
        return Err(DomainError::Validation {
            field: "email",
            message: "must be a valid email",
        });
    }
    Ok(email)
}
