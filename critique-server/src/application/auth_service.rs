use std::sync::Arc;

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        Error as PasswordHashError, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
        rand_core::OsRng,
    },
};
use rand::distr::{Alphanumeric, SampleString};

use crate::data::user_repository::{NewUser, UserRepository};
use crate::domain::error::DomainError;
use crate::domain::user::{Role, SignupRequest, TokenRequest, User};
use crate::infrastructure::jwt::JwtService;
use crate::infrastructure::mailer::ConfirmationMailer;

const CONFIRMATION_CODE_LEN: usize = 24;

pub(crate) struct AuthService<R: UserRepository, M: ConfirmationMailer> {
    repo: R,
    mailer: M,
    jwt: Arc<JwtService>,
}

impl<R: UserRepository, M: ConfirmationMailer> AuthService<R, M> {
    pub(crate) fn new(repo: R, mailer: M, jwt: Arc<JwtService>) -> Self {
        Self { repo, mailer, jwt }
    }

    /// Creates the account on first signup and re-delivers a fresh code on
    /// every subsequent one; the previous code stops working either way.
    pub(crate) async fn signup(&self, req: SignupRequest) -> Result<User, DomainError> {
        let req = req.validate()?;

        let user = match self.repo.find_by_username(&req.username).await? {
            Some(user) if user.email == req.email => user,
            Some(_) => {
                return Err(DomainError::Validation {
                    field: "username",
                    message: "already registered with a different email",
                });
            }
            None => {
                if self.repo.find_by_email(&req.email).await?.is_some() {
                    return Err(DomainError::Validation {
                        field: "email",
                        message: "already registered to a different username",
                    });
                }
                self.repo
                    .create_user(NewUser {
                        username: req.username,
                        email: req.email,
                        role: Role::default(),
                        bio: None,
                        first_name: None,
                        last_name: None,
                    })
                    .await?
            }
        };

        let code = generate_confirmation_code();
        let code_hash = self.hash_code(&code)?;
        self.repo.set_confirmation_code(user.id, &code_hash).await?;
        self.mailer
            .deliver_code(&user.email, &user.username, &code)
            .await?;

        Ok(user)
    }

    pub(crate) async fn issue_token(&self, req: TokenRequest) -> Result<String, DomainError> {
        let req = req.validate()?;

        let creds = self
            .repo
            .credentials_by_username(&req.username)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("user: {}", req.username)))?;

        let code_hash = creds
            .confirmation_code_hash
            .as_deref()
            .ok_or(DomainError::InvalidConfirmationCode)?;
        self.verify_code(&req.confirmation_code, code_hash)?;

        self.jwt
            .generate_token(creds.user.id, &creds.user.username)
            .map_err(|err| DomainError::Unexpected(err.to_string()))
    }

    fn hash_code(&self, code: &str) -> Result<String, DomainError> {
        let salt = SaltString::generate(&mut OsRng);
        let code_hash = Self::argon2()?
            .hash_password(code.as_bytes(), &salt)
            .map_err(|err| DomainError::Unexpected(err.to_string()))?;
        Ok(code_hash.to_string())
    }

    fn verify_code(&self, code: &str, code_hash: &str) -> Result<(), DomainError> {
        let parsed_hash = PasswordHash::new(code_hash)
            .map_err(|err| DomainError::Unexpected(err.to_string()))?;
        Self::argon2()?
            .verify_password(code.as_bytes(), &parsed_hash)
            .map_err(|err| match err {
                PasswordHashError::Password => DomainError::InvalidConfirmationCode,
                _ => DomainError::Unexpected(err.to_string()),
            })?;

        Ok(())
    }

    fn argon2() -> Result<Argon2<'static>, DomainError> {
        let params = Params::new(19 * 1024, 2, 1, None)
            .map_err(|err| DomainError::Unexpected(err.to_string()))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

fn generate_confirmation_code() -> String {
    Alphanumeric.sample_string(&mut rand::rng(), CONFIRMATION_CODE_LEN)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use super::AuthService;
    use crate::data::Pagination;
    use crate::data::user_repository::{NewUser, UserCredentials, UserPatch, UserRepository};
    use crate::domain::error::DomainError;
    use crate::domain::user::{Role, SignupRequest, TokenRequest, User};
    use crate::infrastructure::jwt::JwtService;
    use crate::infrastructure::mailer::ConfirmationMailer;

    #[derive(Clone, Default)]
    struct FakeUserRepo {
        users: Arc<Mutex<Vec<User>>>,
        code_hashes: Arc<Mutex<HashMap<i64, String>>>,
        created_input: Arc<Mutex<Option<NewUser>>>,
    }

    impl FakeUserRepo {
        fn with_user(self, user: User) -> Self {
            self.users.lock().expect("users mutex poisoned").push(user);
            self
        }

        fn take_created_input(&self) -> Option<NewUser> {
            self.created_input
                .lock()
                .expect("created input mutex poisoned")
                .take()
        }

        fn stored_hash(&self, user_id: i64) -> Option<String> {
            self.code_hashes
                .lock()
                .expect("code hashes mutex poisoned")
                .get(&user_id)
                .cloned()
        }
    }

    #[async_trait]
    impl UserRepository for FakeUserRepo {
        async fn create_user(&self, input: NewUser) -> Result<User, DomainError> {
            *self
                .created_input
                .lock()
                .expect("created input mutex poisoned") = Some(input.clone());
            let mut users = self.users.lock().expect("users mutex poisoned");
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
            username: &str,
        ) -> Result<Option<UserCredentials>, DomainError> {
            let user = self.find_by_username(username).await?;
            Ok(user.map(|user| {
                let confirmation_code_hash = self
                    .code_hashes
                    .lock()
                    .expect("code hashes mutex poisoned")
                    .get(&user.id)
                    .cloned();
                UserCredentials {
                    user,
                    confirmation_code_hash,
                }
            }))
        }

        async fn set_confirmation_code(
            &self,
            user_id: i64,
            code_hash: &str,
        ) -> Result<(), DomainError> {
            self.code_hashes
                .lock()
                .expect("code hashes mutex poisoned")
                .insert(user_id, code_hash.to_string());
            Ok(())
        }

        async fn update_by_username(
            &self,
            _username: &str,
            _patch: UserPatch,
        ) -> Result<Option<User>, DomainError> {
            unreachable!("not exercised by auth tests")
        }

        async fn update_by_id(
            &self,
            _id: i64,
            _patch: UserPatch,
        ) -> Result<Option<User>, DomainError> {
            unreachable!("not exercised by auth tests")
        }

        async fn delete_by_username(&self, _username: &str) -> Result<bool, DomainError> {
            unreachable!("not exercised by auth tests")
        }

        async fn list_users(
            &self,
            _search: Option<&str>,
            _pagination: Pagination,
        ) -> Result<Vec<User>, DomainError> {
            unreachable!("not exercised by auth tests")
        }

        async fn total_users(&self, _search: Option<&str>) -> Result<i64, DomainError> {
            unreachable!("not exercised by auth tests")
        }
    }

    #[derive(Clone, Default)]
    struct CapturingMailer {
        delivered: Arc<Mutex<Vec<(String, String, String)>>>,
    }

    impl CapturingMailer {
        fn last_code(&self) -> Option<String> {
            self.delivered
                .lock()
                .expect("delivered mutex poisoned")
                .last()
                .map(|(_, _, code)| code.clone())
        }

        fn delivery_count(&self) -> usize {
            self.delivered.lock().expect("delivered mutex poisoned").len()
        }
    }

    #[async_trait]
    impl ConfirmationMailer for CapturingMailer {
        async fn deliver_code(
            &self,
            email: &str,
            username: &str,
            code: &str,
        ) -> Result<(), DomainError> {
            self.delivered
                .lock()
                .expect("delivered mutex poisoned")
                .push((email.to_string(), username.to_string(), code.to_string()));
            Ok(())
        }
    }

    fn sample_user(id: i64, username: &str, email: &str) -> User {
        User::new(id, username, email, Role::User, None, None, None)
            .expect("sample user must be valid")
    }

    fn test_jwt() -> Arc<JwtService> {
        Arc::new(JwtService::new("0123456789abcdef0123456789abcdef", 3600))
    }

    fn service(
        repo: FakeUserRepo,
        mailer: CapturingMailer,
    ) -> AuthService<FakeUserRepo, CapturingMailer> {
        AuthService::new(repo, mailer, test_jwt())
    }

    #[tokio::test]
    async fn signup_creates_user_and_delivers_code() {
        let repo = FakeUserRepo::default();
        let mailer = CapturingMailer::default();
        let svc = service(repo.clone(), mailer.clone());

        let req = SignupRequest {
            username: "  new_user  ".to_string(),
            email: "  NEW@Example.COM ".to_string(),
        };
        let user = svc.signup(req).await.expect("signup must succeed");

        assert_eq!(user.username, "new_user");
        assert_eq!(user.email, "new@example.com");

        let created = repo
            .take_created_input()
            .expect("create_user must be called");
        assert_eq!(created.username, "new_user");
        assert_eq!(created.role, Role::User);

        assert!(repo.stored_hash(user.id).is_some());
        let code = mailer.last_code().expect("code must be delivered");
        assert!(!code.is_empty());
    }

    #[tokio::test]
    async fn signup_reuses_existing_pair_and_replaces_code() {
        let repo =
            FakeUserRepo::default().with_user(sample_user(1, "repeat", "repeat@example.com"));
        let mailer = CapturingMailer::default();
        let svc = service(repo.clone(), mailer.clone());

        let req = SignupRequest {
            username: "repeat".to_string(),
            email: "repeat@example.com".to_string(),
        };
        svc.signup(req.clone()).await.expect("first signup");
        let first_hash = repo.stored_hash(1).expect("hash must be stored");

        svc.signup(req).await.expect("second signup");
        let second_hash = repo.stored_hash(1).expect("hash must be replaced");

        assert!(repo.take_created_input().is_none(), "no new user row");
        assert_ne!(first_hash, second_hash);
        assert_eq!(mailer.delivery_count(), 2);
    }

    #[tokio::test]
    async fn signup_rejects_email_registered_to_other_username() {
        let repo =
            FakeUserRepo::default().with_user(sample_user(1, "owner", "taken@example.com"));
        let svc = service(repo, CapturingMailer::default());

        let req = SignupRequest {
            username: "intruder".to_string(),
            email: "taken@example.com".to_string(),
        };
        let err = svc.signup(req).await.expect_err("must fail");
        assert!(matches!(
            err,
            DomainError::Validation { field: "email", .. }
        ));
    }

    #[tokio::test]
    async fn signup_rejects_username_registered_with_other_email() {
        let repo =
            FakeUserRepo::default().with_user(sample_user(1, "owner", "owner@example.com"));
        let svc = service(repo, CapturingMailer::default());

        let req = SignupRequest {
            username: "owner".to_string(),
            email: "other@example.com".to_string(),
        };
        let err = svc.signup(req).await.expect_err("must fail");
        assert!(matches!(
            err,
            DomainError::Validation {
                field: "username",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn issue_token_rejects_wrong_code() {
        let repo = FakeUserRepo::default().with_user(sample_user(1, "reader", "r@example.com"));
        let mailer = CapturingMailer::default();
        let svc = service(repo, mailer.clone());

        svc.signup(SignupRequest {
            username: "reader".to_string(),
            email: "r@example.com".to_string(),
        })
        .await
        .expect("signup must succeed");

        let err = svc
            .issue_token(TokenRequest {
                username: "reader".to_string(),
                confirmation_code: "definitely-wrong".to_string(),
            })
            .await
            .expect_err("wrong code must fail");
        assert!(matches!(err, DomainError::InvalidConfirmationCode));
    }

    #[tokio::test]
    async fn issue_token_rejects_unknown_user() {
        let svc = service(FakeUserRepo::default(), CapturingMailer::default());

        let err = svc
            .issue_token(TokenRequest {
                username: "ghost".to_string(),
                confirmation_code: "whatever".to_string(),
            })
            .await
            .expect_err("unknown user must fail");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn issue_token_rejects_user_without_issued_code() {
        let repo = FakeUserRepo::default().with_user(sample_user(1, "quiet", "q@example.com"));
        let svc = service(repo, CapturingMailer::default());

        let err = svc
            .issue_token(TokenRequest {
                username: "quiet".to_string(),
                confirmation_code: "anything".to_string(),
            })
            .await
            .expect_err("missing code must fail");
        assert!(matches!(err, DomainError::InvalidConfirmationCode));
    }

    #[tokio::test]
    async fn issue_token_returns_verifiable_token_for_delivered_code() {
        let repo = FakeUserRepo::default();
        let mailer = CapturingMailer::default();
        let svc = service(repo, mailer.clone());

        let user = svc
            .signup(SignupRequest {
                username: "reader".to_string(),
                email: "reader@example.com".to_string(),
            })
            .await
            .expect("signup must succeed");
        let code = mailer.last_code().expect("code must be delivered");

        let token = svc
            .issue_token(TokenRequest {
                username: "reader".to_string(),
                confirmation_code: code,
            })
            .await
            .expect("token must be issued");

        let claims = test_jwt().verify_token(&token).expect("token must verify");
        assert_eq!(claims.user_id, user.id);
        assert_eq!(claims.username, "reader");
    }
}
