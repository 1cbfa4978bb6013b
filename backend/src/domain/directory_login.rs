//! Login against the user directory with a shared development password.
//!
//! Users are looked up by email in the ledger store. When no password is
//! configured every attempt is refused, so a deployment without one has no
//! working login at all.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;
use zeroize::Zeroizing;

use crate::domain::ledger_service::map_repository_error;
use crate::domain::ports::{LedgerRepository, LoginService};
use crate::domain::{Error, LoginCredentials, UserId};

/// [`LoginService`] backed by a [`LedgerRepository`].
pub struct DirectoryLoginService<R> {
    repo: Arc<R>,
    password: Option<Zeroizing<String>>,
}

impl<R> DirectoryLoginService<R> {
    pub fn new(repo: Arc<R>, password: Option<String>) -> Self {
        Self {
            repo,
            password: password.filter(|p| !p.is_empty()).map(Zeroizing::new),
        }
    }
}

#[async_trait]
impl<R> LoginService for DirectoryLoginService<R>
where
    R: LedgerRepository,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error> {
        let Some(expected) = self.password.as_ref() else {
            debug!("login refused: no directory password configured");
            return Err(Error::unauthorized("invalid credentials"));
        };
        let user = self
            .repo
            .find_user_by_email(credentials.email())
            .await
            .map_err(map_repository_error)?;
        match user {
            Some(user) if credentials.password() == expected.as_str() => Ok(user.id()),
            _ => Err(Error::unauthorized("invalid credentials")),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for directory login.
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ledger_test_helpers::{org, repo_over};
    use crate::domain::ports::{LedgerRepositoryError, MockLedgerRepository};
    use rstest::rstest;

    fn creds(email: &str, password: &str) -> LoginCredentials {
        LoginCredentials::try_from_parts(email, password).expect("credentials shape")
    }

    #[tokio::test]
    async fn known_email_with_the_shared_password_logs_in() {
        let org = org();
        let service = DirectoryLoginService::new(
            Arc::new(repo_over(org.snapshot(vec![], vec![]))),
            Some("letmein".to_owned()),
        );

        let id = service
            .authenticate(&creds(" FAISAL@example.com", "letmein"))
            .await
            .expect("logged in");

        assert_eq!(id, org.engineer.id());
    }

    #[rstest]
    #[case("faisal@example.com", "wrong", Some("letmein"))]
    #[case("nobody@example.com", "letmein", Some("letmein"))]
    #[case("faisal@example.com", "letmein", None)]
    #[case("faisal@example.com", "letmein", Some(""))]
    #[tokio::test]
    async fn everything_else_is_unauthorized(
        #[case] email: &str,
        #[case] password: &str,
        #[case] configured: Option<&str>,
    ) {
        let org = org();
        let service = DirectoryLoginService::new(
            Arc::new(repo_over(org.snapshot(vec![], vec![]))),
            configured.map(str::to_owned),
        );

        let err = service
            .authenticate(&creds(email, password))
            .await
            .expect_err("refused");

        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }

    #[tokio::test]
    async fn directory_outage_is_unavailable() {
        let mut repo = MockLedgerRepository::new();
        repo.expect_find_user_by_email()
            .returning(|_| Err(LedgerRepositoryError::connection("pool exhausted")));
        let service = DirectoryLoginService::new(Arc::new(repo), Some("letmein".to_owned()));

        let err = service
            .authenticate(&creds("faisal@example.com", "letmein"))
            .await
            .expect_err("outage");

        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }
}
