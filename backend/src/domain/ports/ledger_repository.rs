//! Port for reading ledger entities.
//!
//! Writes never go through this port; they are committed as a
//! [`crate::domain::LedgerChangeSet`] via
//! [`super::LedgerUnitOfWork`].

use async_trait::async_trait;

use crate::domain::{LedgerSnapshot, User, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by ledger read adapters.
    pub enum LedgerRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "ledger repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "ledger repository query failed: {message}",
    }
}

/// Which slice of the store a snapshot covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotScope {
    /// The users and projects of one root admin's hierarchy, with the
    /// advances and expenses hanging off those projects.
    Tenant(UserId),
    /// Every record in the store.
    All,
}

/// Port for ledger reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    async fn find_user(&self, id: &UserId) -> Result<Option<User>, LedgerRepositoryError>;

    /// Look a user up by lower-cased email.
    async fn find_user_by_email(&self, email: &str)
    -> Result<Option<User>, LedgerRepositoryError>;

    /// Load the entity sets visibility and the engines work from.
    async fn load_snapshot(
        &self,
        scope: SnapshotScope,
    ) -> Result<LedgerSnapshot, LedgerRepositoryError>;
}

/// Empty store for tests that never read.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureLedgerRepository;

#[async_trait]
impl LedgerRepository for FixtureLedgerRepository {
    async fn find_user(&self, _id: &UserId) -> Result<Option<User>, LedgerRepositoryError> {
        Ok(None)
    }

    async fn find_user_by_email(
        &self,
        _email: &str,
    ) -> Result<Option<User>, LedgerRepositoryError> {
        Ok(None)
    }

    async fn load_snapshot(
        &self,
        _scope: SnapshotScope,
    ) -> Result<LedgerSnapshot, LedgerRepositoryError> {
        Ok(LedgerSnapshot::default())
    }
}
