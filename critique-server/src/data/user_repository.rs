use async_trait::async_trait;

use super::Pagination;
use crate::domain::error::DomainError;
use crate::domain::user::{Role, User};

/// A user row together with its confirmation-code hash. The hash never leaves
/// the auth flow.
#[derive(Debug, Clone)]
pub(crate) struct UserCredentials {
    pub(crate) user: User,
    pub(crate) confirmation_code_hash: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct NewUser {
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) role: Role,
    pub(crate) bio: Option<String>,
    pub(crate) first_name: Option<String>,
    pub(crate) last_name: Option<String>,
}

/// Field-level patch; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub(crate) struct UserPatch {
    pub(crate) username: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) role: Option<Role>,
    pub(crate) bio: Option<String>,
    pub(crate) first_name: Option<String>,
    pub(crate) last_name: Option<String>,
}

#[async_trait]
pub(crate) trait UserRepository: Send + Sync {
    async fn create_user(&self, input: NewUser) -> Result<User, DomainError>;
    async fn get_user(&self, id: i64) -> Result<Option<User>, DomainError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;
    async fn credentials_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, DomainError>;
    /// Replaces any previously issued code hash.
    async fn set_confirmation_code(
        &self,
        user_id: i64,
        code_hash: &str,
    ) -> Result<(), DomainError>;
    async fn update_by_username(
        &self,
        username: &str,
        patch: UserPatch,
    ) -> Result<Option<User>, DomainError>;
    async fn update_by_id(&self, id: i64, patch: UserPatch) -> Result<Option<User>, DomainError>;
    async fn delete_by_username(&self, username: &str) -> Result<bool, DomainError>;
    async fn list_users(
        &self,
        search: Option<&str>,
        pagination: Pagination,
    ) -> Result<Vec<User>, DomainError>;
    async fn total_users(&self, search: Option<&str>) -> Result<i64, DomainError>;
}
