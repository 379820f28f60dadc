use async_trait::async_trait;
use sqlx::PgPool;

use super::like_pattern;
use crate::data::Pagination;
use crate::data::user_repository::{NewUser, UserCredentials, UserPatch, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::user::User;

const USER_COLUMNS: &str = "id, username, email, role, bio, first_name, last_name";

#[derive(Debug, Clone)]
pub(crate) struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    username: String,
    email: String,
    role: String,
    bio: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
}

#[derive(sqlx::FromRow)]
struct UserCredentialsRow {
    id: i64,
    username: String,
    email: String,
    role: String,
    bio: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    confirmation_code_hash: Option<String>,
}

impl UserRow {
    fn into_user(self) -> Result<User, DomainError> {
        let role = self
            .role
            .parse()
            .map_err(|_| DomainError::Unexpected(format!("unknown role in store: {}", self.role)))?;
        User::new(
            self.id,
            self.username,
            self.email,
            role,
            self.bio,
            self.first_name,
            self.last_name,
        )
        .map_err(|err| DomainError::Unexpected(err.to_string()))
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create_user(&self, input: NewUser) -> Result<User, DomainError> {
        let query = format!(
            "INSERT INTO users (username, email, role, bio, first_name, last_name) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(&input.username)
            .bind(&input.email)
            .bind(input.role.as_str())
            .bind(&input.bio)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .fetch_one(&self.pool)
            .await
            .map_err(map_user_db_error)?;

        row.into_user()
    }

    async fn get_user(&self, id: i64) -> Result<Option<User>, DomainError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_user_db_error)?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_user_db_error)?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_user_db_error)?;

        row.map(UserRow::into_user).transpose()
    }

    async fn credentials_by_username(
        &self,
        username: &str,
    ) -> Result<Option<UserCredentials>, DomainError> {
        let query = format!(
            "SELECT {USER_COLUMNS}, confirmation_code_hash FROM users WHERE username = $1"
        );
        let row = sqlx::query_as::<_, UserCredentialsRow>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_user_db_error)?;

        match row {
            Some(r) => {
                let confirmation_code_hash = r.confirmation_code_hash.clone();
                let user = UserRow {
                    id: r.id,
                    username: r.username,
                    email: r.email,
                    role: r.role,
                    bio: r.bio,
                    first_name: r.first_name,
                    last_name: r.last_name,
                }
                .into_user()?;
                Ok(Some(UserCredentials {
                    user,
                    confirmation_code_hash,
                }))
            }
            None => Ok(None),
        }
    }

    async fn set_confirmation_code(
        &self,
        user_id: i64,
        code_hash: &str,
    ) -> Result<(), DomainError> {
        let result = sqlx::query("UPDATE users SET confirmation_code_hash = $1 WHERE id = $2")
            .bind(code_hash)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(map_user_db_error)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!("user id: {user_id}")));
        }
        Ok(())
    }

    async fn update_by_username(
        &self,
        username: &str,
        patch: UserPatch,
    ) -> Result<Option<User>, DomainError> {
        let query = format!(
            "UPDATE users SET \
                username   = COALESCE($1, username), \
                email      = COALESCE($2, email), \
                role       = COALESCE($3, role), \
                bio        = COALESCE($4, bio), \
                first_name = COALESCE($5, first_name), \
                last_name  = COALESCE($6, last_name) \
             WHERE username = $7 \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(&patch.username)
            .bind(&patch.email)
            .bind(patch.role.map(|role| role.as_str()))
            .bind(&patch.bio)
            .bind(&patch.first_name)
            .bind(&patch.last_name)
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_user_db_error)?;

        row.map(UserRow::into_user).transpose()
    }

    async fn update_by_id(&self, id: i64, patch: UserPatch) -> Result<Option<User>, DomainError> {
        let query = format!(
            "UPDATE users SET \
                username   = COALESCE($1, username), \
                email      = COALESCE($2, email), \
                role       = COALESCE($3, role), \
                bio        = COALESCE($4, bio), \
                first_name = COALESCE($5, first_name), \
                last_name  = COALESCE($6, last_name) \
             WHERE id = $7 \
             RETURNING {USER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(&patch.username)
            .bind(&patch.email)
            .bind(patch.role.map(|role| role.as_str()))
            .bind(&patch.bio)
            .bind(&patch.first_name)
            .bind(&patch.last_name)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_user_db_error)?;

        row.map(UserRow::into_user).transpose()
    }

    async fn delete_by_username(&self, username: &str) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(&self.pool)
            .await
            .map_err(map_user_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_users(
        &self,
        search: Option<&str>,
        pagination: Pagination,
    ) -> Result<Vec<User>, DomainError> {
        let query = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE ($1::text IS NULL OR username ILIKE $1) \
             ORDER BY username \
             LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, UserRow>(&query)
            .bind(search.map(like_pattern))
            .bind(i64::from(pagination.limit))
            .bind(i64::from(pagination.offset))
            .fetch_all(&self.pool)
            .await
            .map_err(map_user_db_error)?;

        rows.into_iter().map(UserRow::into_user).collect()
    }

    async fn total_users(&self, search: Option<&str>) -> Result<i64, DomainError> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM users WHERE ($1::text IS NULL OR username ILIKE $1)",
        )
        .bind(search.map(like_pattern))
        .fetch_one(&self.pool)
        .await
        .map_err(map_user_db_error)?;

        Ok(total)
    }
}

fn map_user_db_error(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db_err) = &err
        && db_err.code().as_deref() == Some("23505")
    {
        let resource = match db_err.constraint() {
            Some("users_username_key") => "username",
            Some("users_email_key") => "email",
            _ => "user",
        };
        return DomainError::AlreadyExists(resource.to_string());
    }
    DomainError::Unexpected(err.to_string())
}
