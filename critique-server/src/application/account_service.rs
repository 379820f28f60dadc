use crate::data::Pagination;
use crate::data::user_repository::{NewUser, UserPatch, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::permission::{Action, Caller, Resource, authorize};
use crate::domain::user::{Role, User, normalize_email, normalize_username};

#[derive(Debug, Clone)]
pub(crate) struct ListUsersResult {
    pub(crate) users: Vec<User>,
    pub(crate) limit: u32,
    pub(crate) offset: u32,
    pub(crate) total: i64,
}

#[derive(Debug, Clone)]
pub(crate) struct CreateUserRequest {
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) role: Option<Role>,
    pub(crate) bio: Option<String>,
    pub(crate) first_name: Option<String>,
    pub(crate) last_name: Option<String>,
}

impl CreateUserRequest {
    fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            username: normalize_username(&self.username)?,
            email: normalize_email(&self.email)?,
            role: self.role,
            bio: self.bio,
            first_name: self.first_name,
            last_name: self.last_name,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub(crate) struct UpdateUserRequest {
    pub(crate) username: Option<String>,
    pub(crate) email: Option<String>,
    pub(crate) role: Option<Role>,
    pub(crate) bio: Option<String>,
    pub(crate) first_name: Option<String>,
    pub(crate) last_name: Option<String>,
}

impl UpdateUserRequest {
    fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            username: self
                .username
                .as_deref()
                .map(normalize_username)
                .transpose()?,
            email: self.email.as_deref().map(normalize_email).transpose()?,
            role: self.role,
            bio: self.bio,
            first_name: self.first_name,
            last_name: self.last_name,
        })
    }

    fn into_patch(self) -> UserPatch {
        UserPatch {
            username: self.username,
            email: self.email,
            role: self.role,
            bio: self.bio,
            first_name: self.first_name,
            last_name: self.last_name,
        }
    }
}

pub(crate) struct AccountService<R: UserRepository> {
    repo: R,
}

impl<R: UserRepository> AccountService<R> {
    pub(crate) fn new(repo: R) -> Self {
        Self { repo }
    }

    pub(crate) async fn list_users(
        &self,
        caller: &Caller,
        search: Option<String>,
        pagination: Pagination,
    ) -> Result<ListUsersResult, DomainError> {
        authorize(Some(caller), Action::List, Resource::Accounts)?;

        let users = self
            .repo
            .list_users(search.as_deref(), pagination)
            .await?;
        let total = self.repo.total_users(search.as_deref()).await?;

        Ok(ListUsersResult {
            users,
            limit: pagination.limit,
            offset: pagination.offset,
            total,
        })
    }

    pub(crate) async fn create_user(
        &self,
        caller: &Caller,
        req: CreateUserRequest,
    ) -> Result<User, DomainError> {
        authorize(Some(caller), Action::Create, Resource::Accounts)?;
        let req = req.validate()?;

        self.repo
            .create_user(NewUser {
                username: req.username,
                email: req.email,
                role: req.role.unwrap_or_default(),
                bio: req.bio,
                first_name: req.first_name,
                last_name: req.last_name,
            })
            .await
    }

    pub(crate) async fn get_user(
        &self,
        caller: &Caller,
        username: &str,
    ) -> Result<User, DomainError> {
        authorize(Some(caller), Action::Retrieve, Resource::Accounts)?;

        self.repo
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("user: {username}")))
    }

    pub(crate) async fn update_user(
        &self,
        caller: &Caller,
        username: &str,
        req: UpdateUserRequest,
    ) -> Result<User, DomainError> {
        authorize(Some(caller), Action::Update, Resource::Accounts)?;
        let req = req.validate()?;

        self.repo
            .update_by_username(username, req.into_patch())
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("user: {username}")))
    }

    pub(crate) async fn delete_user(
        &self,
        caller: &Caller,
        username: &str,
    ) -> Result<(), DomainError> {
        authorize(Some(caller), Action::Delete, Resource::Accounts)?;

        let deleted = self.repo.delete_by_username(username).await?;
        if !deleted {
            return Err(DomainError::NotFound(format!("user: {username}")));
        }
        Ok(())
    }

    pub(crate) async fn me(&self, user_id: i64) -> Result<User, DomainError> {
        self.repo
            .get_user(user_id)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("user id: {user_id}")))
    }

    /// Self-service update. The role field is not part of the request type,
    /// so a caller cannot elevate their own role through this path.
    pub(crate) async fn update_me(
        &self,
        user_id: i64,
        req: UpdateUserRequest,
    ) -> Result<User, DomainError> {
        let req = UpdateUserRequest { role: None, ..req }.validate()?;

        self.repo
            .update_by_id(user_id, req.into_patch())
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("user id: {user_id}")))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::{AccountService, CreateUserRequest, UpdateUserRequest};
    use crate::data::Pagination;
    use crate::data::user_repository::{NewUser, UserCredentials, UserPatch, UserRepository};
    use crate::domain::error::DomainError;
    use crate::domain::permission::Caller;
    use crate::domain::user::{Role, User};

    #[derive(Clone, Default)]
    struct FakeUserRepo {
        users: Arc<Mutex<Vec<User>>>,
    }

    impl FakeUserRepo {
        fn with_user(self, user: User) -> Self {
            self.users.lock().expect("users mutex poisoned").push(user);
            self
        }

        fn apply_patch(user: &mut User, patch: UserPatch) {
            if let Some(username) = patch.username {
                user.username = username;
            }
            if let Some(email) = patch.email {
                user.email = email;
            }
            if let Some(role) = patch.role {
                user.role = role;
            }
            if patch.bio.is_some() {
                user.bio = patch.bio;
            }
            if patch.first_name.is_some() {
                user.first_name = patch.first_name;
            }
            if patch.last_name.is_some() {
                user.last_name = patch.last_name;
            }
        }
    }

    #[async_trait]
    impl UserRepository for FakeUserRepo {
        async fn create_user(&self, input: NewUser) -> Result<User, DomainError> {
            let mut users = self.users.lock().expect("users mutex poisoned");
            if users.iter().any(|user| user.username == input.username) {
                return Err(DomainError::AlreadyExists("username".to_string()));
            }
            let user = User::new(
                users.len() as i64 + 1,
                input.username,
                input.email,
                input.role,
                input.bio,
                input.first_name,
                input.last_name,
            )
            .expect("fake user must be valid");
            users.push(user.clone());
            Ok(user)
        }

        async fn get_user(&self, id: i64) -> Result<Option<User>, DomainError> {
            Ok(self
                .users
                .lock()
                .expect("users mutex poisoned")
                .iter()
                .find(|user| user.id == id)
                .cloned())
        }

        async fn find_by_username(&self, username: &str) -> Result<Option<User>, DomainError> {
            Ok(self
                .users
                .lock()
                .expect("users mutex poisoned")
                .iter()
                .find(|user| user.username == username)
                .cloned())
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
            Ok(self
                .users
                .lock()
                .expect("users mutex poisoned")
                .iter()
                .find(|user| user.email == email)
                .cloned())
        }

        async fn credentials_by_username(
            &self,
            _username: &str,
        ) -> Result<Option<UserCredentials>, DomainError> {
            unreachable!("not exercised by account tests")
        }

        async fn set_confirmation_code(
            &self,
            _user_id: i64,
            _code_hash: &str,
        ) -> Result<(), DomainError> {
            unreachable!("not exercised by account tests")
        }

        async fn update_by_username(
            &self,
            username: &str,
            patch: UserPatch,
        ) -> Result<Option<User>, DomainError> {
            let mut users = self.users.lock().expect("users mutex poisoned");
            match users.iter_mut().find(|user| user.username == username) {
                Some(user) => {
                    Self::apply_patch(user, patch);
                    Ok(Some(user.clone()))
                }
                None => Ok(None),
            }
        }

        async fn update_by_id(
            &self,
            id: i64,
            patch: UserPatch,
        ) -> Result<Option<User>, DomainError> {
            let mut users = self.users.lock().expect("users mutex poisoned");
            match users.iter_mut().find(|user| user.id == id) {
                Some(user) => {
                    Self::apply_patch(user, patch);
                    Ok(Some(user.clone()))
                }
                None => Ok(None),
            }
        }

        async fn delete_by_username(&self, username: &str) -> Result<bool, DomainError> {
            let mut users = self.users.lock().expect("users mutex poisoned");
            let before = users.len();
            users.retain(|user| user.username != username);
            Ok(users.len() < before)
        }

        async fn list_users(
            &self,
            search: Option<&str>,
            pagination: Pagination,
        ) -> Result<Vec<User>, DomainError> {
            let users = self.users.lock().expect("users mutex poisoned");
            Ok(users
                .iter()
                .filter(|user| {
                    search.is_none_or(|term| {
                        user.username
                            .to_lowercase()
                            .contains(&term.to_lowercase())
                    })
                })
                .skip(pagination.offset as usize)
                .take(pagination.limit as usize)
                .cloned()
                .collect())
        }

        async fn total_users(&self, search: Option<&str>) -> Result<i64, DomainError> {
            let users = self.users.lock().expect("users mutex poisoned");
            Ok(users
                .iter()
                .filter(|user| {
                    search.is_none_or(|term| {
                        user.username
                            .to_lowercase()
                            .contains(&term.to_lowercase())
                    })
                })
                .count() as i64)
        }
    }

    fn sample_user(id: i64, username: &str, role: Role) -> User {
        User::new(
            id,
            username,
            format!("{username}@example.com"),
            role,
            None,
            None,
            None,
        )
        .expect("sample user must be valid")
    }

    fn admin() -> Caller {
        Caller {
            user_id: 1,
            role: Role::Admin,
        }
    }

    fn plain_user(user_id: i64) -> Caller {
        Caller {
            user_id,
            role: Role::User,
        }
    }

    fn page() -> Pagination {
        Pagination {
            limit: 20,
            offset: 0,
        }
    }

    #[tokio::test]
    async fn list_users_requires_admin() {
        let repo = FakeUserRepo::default().with_user(sample_user(1, "alpha", Role::User));
        let svc = AccountService::new(repo);

        let err = svc
            .list_users(&plain_user(1), None, page())
            .await
            .expect_err("non-admin must be rejected");
        assert!(matches!(err, DomainError::Forbidden));

        let result = svc
            .list_users(&admin(), None, page())
            .await
            .expect("admin must list");
        assert_eq!(result.total, 1);
    }

    #[tokio::test]
    async fn list_users_filters_by_search_term() {
        let repo = FakeUserRepo::default()
            .with_user(sample_user(1, "alpha", Role::User))
            .with_user(sample_user(2, "beta", Role::User));
        let svc = AccountService::new(repo);

        let result = svc
            .list_users(&admin(), Some("ALP".to_string()), page())
            .await
            .expect("search must succeed");
        assert_eq!(result.users.len(), 1);
        assert_eq!(result.users[0].username, "alpha");
    }

    #[tokio::test]
    async fn create_user_defaults_role_to_user() {
        let svc = AccountService::new(FakeUserRepo::default());

        let user = svc
            .create_user(
                &admin(),
                CreateUserRequest {
                    username: "fresh".to_string(),
                    email: "fresh@example.com".to_string(),
                    role: None,
                    bio: None,
                    first_name: None,
                    last_name: None,
                },
            )
            .await
            .expect("create must succeed");
        assert_eq!(user.role, Role::User);
    }

    #[tokio::test]
    async fn admin_update_may_change_role() {
        let repo = FakeUserRepo::default().with_user(sample_user(2, "promotee", Role::User));
        let svc = AccountService::new(repo);

        let updated = svc
            .update_user(
                &admin(),
                "promotee",
                UpdateUserRequest {
                    role: Some(Role::Moderator),
                    ..UpdateUserRequest::default()
                },
            )
            .await
            .expect("update must succeed");
        assert_eq!(updated.role, Role::Moderator);
    }

    #[tokio::test]
    async fn update_me_ignores_role_escalation() {
        let repo = FakeUserRepo::default().with_user(sample_user(5, "sneaky", Role::User));
        let svc = AccountService::new(repo.clone());

        let updated = svc
            .update_me(
                5,
                UpdateUserRequest {
                    role: Some(Role::Admin),
                    bio: Some("new bio".to_string()),
                    ..UpdateUserRequest::default()
                },
            )
            .await
            .expect("update must succeed");

        assert_eq!(updated.role, Role::User, "role must be untouched");
        assert_eq!(updated.bio.as_deref(), Some("new bio"));

        let stored = repo.get_user(5).await.expect("get").expect("present");
        assert_eq!(stored.role, Role::User);
    }

    #[tokio::test]
    async fn delete_user_is_admin_only_and_404s_on_missing() {
        let repo = FakeUserRepo::default().with_user(sample_user(2, "target", Role::User));
        let svc = AccountService::new(repo);

        let err = svc
            .delete_user(&plain_user(2), "target")
            .await
            .expect_err("non-admin must be rejected");
        assert!(matches!(err, DomainError::Forbidden));

        svc.delete_user(&admin(), "target")
            .await
            .expect("admin delete must succeed");

        let err = svc
            .delete_user(&admin(), "target")
            .await
            .expect_err("second delete must miss");
        assert!(matches!(err, DomainError::NotFound(_)));
    }
}
