//! Notification inbox service.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::domain::ports::{
    ChangePublisher, NotificationCommand, NotificationRepository, NotificationRepositoryError,
};
use crate::domain::{ChangeEvent, Error, Notification, NotificationId, UserId};

fn map_notification_error(error: NotificationRepositoryError) -> Error {
    match error {
        NotificationRepositoryError::Connection { message } => Error::service_unavailable(
            format!("notification repository unavailable: {message}"),
        ),
        NotificationRepositoryError::Query { message } => {
            Error::internal(format!("notification repository error: {message}"))
        }
    }
}

/// Lists and marks a user's notifications, announcing read-state changes on
/// the change feed.
pub struct NotificationService<N> {
    repo: Arc<N>,
    publisher: Arc<dyn ChangePublisher>,
}

impl<N> NotificationService<N> {
    pub fn new(repo: Arc<N>, publisher: Arc<dyn ChangePublisher>) -> Self {
        Self { repo, publisher }
    }

    fn announce(&self, notifications: &[Notification]) {
        if notifications.is_empty() {
            return;
        }
        let events: Vec<ChangeEvent> = notifications
            .iter()
            .map(ChangeEvent::notification_updated)
            .collect();
        if let Err(err) = self.publisher.publish(&events) {
            warn!(error = %err, "failed to publish notification changes");
        }
    }
}

#[async_trait]
impl<N> NotificationCommand for NotificationService<N>
where
    N: NotificationRepository,
{
    async fn list_notifications(&self, user: &UserId) -> Result<Vec<Notification>, Error> {
        self.repo
            .list_for_user(user)
            .await
            .map_err(map_notification_error)
    }

    async fn mark_read(&self, user: &UserId, id: &NotificationId) -> Result<Notification, Error> {
        let updated = self
            .repo
            .mark_read(user, id)
            .await
            .map_err(map_notification_error)?
            .ok_or_else(|| Error::not_found(format!("notification {id} not found")))?;
        self.announce(std::slice::from_ref(&updated));
        Ok(updated)
    }

    async fn mark_all_read(&self, user: &UserId) -> Result<usize, Error> {
        let updated = self
            .repo
            .mark_all_read(user)
            .await
            .map_err(map_notification_error)?;
        self.announce(&updated);
        Ok(updated.len())
    }
}
