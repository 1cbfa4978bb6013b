//! Driving port for a user's notification inbox.

use async_trait::async_trait;

use crate::domain::{Error, Notification, NotificationId, UserId};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationCommand: Send + Sync {
    async fn list_notifications(&self, user: &UserId) -> Result<Vec<Notification>, Error>;

    /// Mark one of the user's own notifications read.
    async fn mark_read(&self, user: &UserId, id: &NotificationId) -> Result<Notification, Error>;

    /// Returns how many notifications changed.
    async fn mark_all_read(&self, user: &UserId) -> Result<usize, Error>;
}
