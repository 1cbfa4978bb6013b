//! Port for notification reads and read-state updates.

use async_trait::async_trait;

use crate::domain::{Notification, NotificationId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by notification adapters.
    pub enum NotificationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "notification repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "notification repository query failed: {message}",
    }
}

/// Port for a user's notification inbox.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Notifications addressed to `user_id`, newest first.
    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Notification>, NotificationRepositoryError>;

    /// Mark one notification read. Returns `None` when it does not exist or
    /// is addressed to someone else.
    async fn mark_read(
        &self,
        user_id: &UserId,
        id: &NotificationId,
    ) -> Result<Option<Notification>, NotificationRepositoryError>;

    /// Mark every unread notification of `user_id` read, returning those
    /// that changed.
    async fn mark_all_read(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Notification>, NotificationRepositoryError>;
}

/// Empty inbox.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureNotificationRepository;

#[async_trait]
impl NotificationRepository for FixtureNotificationRepository {
    async fn list_for_user(
        &self,
        _user_id: &UserId,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        Ok(Vec::new())
    }

    async fn mark_read(
        &self,
        _user_id: &UserId,
        _id: &NotificationId,
    ) -> Result<Option<Notification>, NotificationRepositoryError> {
        Ok(None)
    }

    async fn mark_all_read(
        &self,
        _user_id: &UserId,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        Ok(Vec::new())
    }
}
