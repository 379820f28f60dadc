use async_trait::async_trait;
use tracing::info;

use crate::domain::error::DomainError;

/// Out-of-band delivery of confirmation codes. Real transport is an external
/// collaborator; the default implementation writes to the log, which is
/// enough for development and tests.
#[async_trait]
pub(crate) trait ConfirmationMailer: Send + Sync {
    async fn deliver_code(
        &self,
        email: &str,
        username: &str,
        code: &str,
    ) -> Result<(), DomainError>;
}

#[derive(Debug, Clone, Default)]
pub(crate) struct LogMailer;

#[async_trait]
impl ConfirmationMailer for LogMailer {
    async fn deliver_code(
        &self,
        email: &str,
        username: &str,
        code: &str,
    ) -> Result<(), DomainError> {
        info!(%email, %username, "confirmation code issued: {code}");
        Ok(())
    }
}
