use super::error::DomainError;
use super::user::Role;

/// Identity of an authenticated caller, as established by the auth
/// middleware. Role is read from the store per request, not from the token.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Caller {
    pub(crate) user_id: i64,
    pub(crate) role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    List,
    Retrieve,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone, Copy)]
pub(crate) enum Resource {
    /// Categories, genres and titles.
    Catalog,
    /// A review or comment; `author_id` is `None` until the resource exists
    /// (list/create).
    Feedback { author_id: Option<i64> },
    /// The user table as administered through `/users/`.
    Accounts,
}

impl Action {
    fn is_read(self) -> bool {
        matches!(self, Action::List | Action::Retrieve)
    }
}

/// Single decision point for every endpoint. Read access to catalog and
/// feedback is open to everyone, anonymous callers included; everything else
/// depends on role and, for feedback, ownership.
pub(crate) fn authorize(
    caller: Option<&Caller>,
    action: Action,
    resource: Resource,
) -> Result<(), DomainError> {
    match resource {
        Resource::Catalog => {
            if action.is_read() {
                return Ok(());
            }
            let caller = caller.ok_or(DomainError::Unauthenticated)?;
            if caller.role.is_admin() {
                Ok(())
            } else {
                Err(DomainError::Forbidden)
            }
        }
        Resource::Feedback { author_id } => {
            if action.is_read() {
                return Ok(());
            }
            let caller = caller.ok_or(DomainError::Unauthenticated)?;
            match action {
                Action::Create => Ok(()),
                _ => {
                    if caller.role.is_admin()
                        || caller.role.is_moderator()
                        || author_id == Some(caller.user_id)
                    {
                        Ok(())
                    } else {
                        Err(DomainError::Forbidden)
                    }
                }
            }
        }
        Resource::Accounts => {
            let caller = caller.ok_or(DomainError::Unauthenticated)?;
            if caller.role.is_admin() {
                Ok(())
            } else {
                Err(DomainError::Forbidden)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Action, Caller, Resource, authorize};
    use crate::domain::error::DomainError;
    use crate::domain::user::Role;

    fn caller(user_id: i64, role: Role) -> Caller {
        Caller { user_id, role }
    }

    #[test]
    fn anonymous_can_read_catalog_and_feedback() {
        for action in [Action::List, Action::Retrieve] {
            assert!(authorize(None, action, Resource::Catalog).is_ok());
            assert!(
                authorize(None, action, Resource::Feedback { author_id: Some(1) }).is_ok()
            );
        }
    }

    #[test]
    fn catalog_writes_are_admin_only() {
        for action in [Action::Create, Action::Update, Action::Delete] {
            assert!(matches!(
                authorize(None, action, Resource::Catalog),
                Err(DomainError::Unauthenticated)
            ));
            assert!(matches!(
                authorize(Some(&caller(1, Role::User)), action, Resource::Catalog),
                Err(DomainError::Forbidden)
            ));
            assert!(matches!(
                authorize(Some(&caller(1, Role::Moderator)), action, Resource::Catalog),
                Err(DomainError::Forbidden)
            ));
            assert!(authorize(Some(&caller(1, Role::Admin)), action, Resource::Catalog).is_ok());
        }
    }

    #[test]
    fn any_authenticated_caller_may_create_feedback() {
        let resource = Resource::Feedback { author_id: None };
        assert!(matches!(
            authorize(None, Action::Create, resource),
            Err(DomainError::Unauthenticated)
        ));
        assert!(authorize(Some(&caller(5, Role::User)), Action::Create, resource).is_ok());
    }

    #[test]
    fn feedback_mutation_is_for_author_moderator_or_admin() {
        let owned_by_7 = Resource::Feedback { author_id: Some(7) };
        for action in [Action::Update, Action::Delete] {
            assert!(authorize(Some(&caller(7, Role::User)), action, owned_by_7).is_ok());
            assert!(matches!(
                authorize(Some(&caller(8, Role::User)), action, owned_by_7),
                Err(DomainError::Forbidden)
            ));
            assert!(authorize(Some(&caller(8, Role::Moderator)), action, owned_by_7).is_ok());
            assert!(authorize(Some(&caller(8, Role::Admin)), action, owned_by_7).is_ok());
        }
    }

    #[test]
    fn account_administration_is_admin_only() {
        for action in [
            Action::List,
            Action::Retrieve,
            Action::Create,
            Action::Update,
            Action::Delete,
        ] {
            assert!(matches!(
                authorize(None, action, Resource::Accounts),
                Err(DomainError::Unauthenticated)
            ));
            assert!(matches!(
                authorize(Some(&caller(2, Role::Moderator)), action, Resource::Accounts),
                Err(DomainError::Forbidden)
            ));
            assert!(authorize(Some(&caller(2, Role::Admin)), action, Resource::Accounts).is_ok());
        }
    }
}
