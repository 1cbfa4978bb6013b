//! Port for committing ledger change sets atomically.

use async_trait::async_trait;

use crate::domain::LedgerChangeSet;

use super::define_port_error;

define_port_error! {
    /// Errors raised while committing a change set.
    pub enum LedgerUnitOfWorkError {
        /// Store connection could not be established.
        Connection { message: String } =>
            "ledger store connection failed: {message}",
        /// A write failed; nothing was committed.
        Query { message: String } =>
            "ledger write failed: {message}",
        /// A guarded record changed since it was read; nothing was committed.
        Conflict { message: String } =>
            "ledger write conflict: {message}",
    }
}

/// Applies every write of a change set or none of them.
///
/// Guarded updates must compare the stored record against the expected
/// prior state and fail with [`LedgerUnitOfWorkError::Conflict`] on
/// mismatch. `InsertIfAbsent` writes are skipped when the id already
/// exists.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerUnitOfWork: Send + Sync {
    async fn commit(&self, changes: &LedgerChangeSet) -> Result<(), LedgerUnitOfWorkError>;
}

/// Accepts every change set without storing it.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureLedgerUnitOfWork;

#[async_trait]
impl LedgerUnitOfWork for FixtureLedgerUnitOfWork {
    async fn commit(&self, _changes: &LedgerChangeSet) -> Result<(), LedgerUnitOfWorkError> {
        Ok(())
    }
}
