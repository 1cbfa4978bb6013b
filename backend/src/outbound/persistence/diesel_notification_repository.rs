//! PostgreSQL-backed `NotificationRepository`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{NotificationRepository, NotificationRepositoryError};
use crate::domain::{Notification, NotificationId, UserId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::NotificationRow;
use super::pool::{DbPool, PoolError};
use super::schema::notifications;

/// Diesel implementation of the notification inbox port.
#[derive(Clone)]
pub struct DieselNotificationRepository {
    pool: DbPool,
}

impl DieselNotificationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> NotificationRepositoryError {
    map_pool_error(error, |message| {
        NotificationRepositoryError::connection(message)
    })
}

fn diesel_error(error: diesel::result::Error) -> NotificationRepositoryError {
    map_diesel_error(
        error,
        NotificationRepositoryError::query,
        NotificationRepositoryError::connection,
    )
}

fn decode(rows: Vec<NotificationRow>) -> Result<Vec<Notification>, NotificationRepositoryError> {
    rows.into_iter()
        .map(Notification::try_from)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| NotificationRepositoryError::query(err.to_string()))
}

#[async_trait]
impl NotificationRepository for DieselNotificationRepository {
    async fn list_for_user(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<NotificationRow> = notifications::table
            .filter(notifications::user_id.eq(*user_id.as_uuid()))
            .select(NotificationRow::as_select())
            .order_by((notifications::created_at.desc(), notifications::id))
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        decode(rows)
    }

    async fn mark_read(
        &self,
        user_id: &UserId,
        id: &NotificationId,
    ) -> Result<Option<Notification>, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<NotificationRow> = diesel::update(
            notifications::table
                .find(*id.as_uuid())
                .filter(notifications::user_id.eq(*user_id.as_uuid())),
        )
        .set(notifications::is_read.eq(true))
        .returning(NotificationRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(diesel_error)?;
        Ok(decode(row.into_iter().collect())?.pop())
    }

    async fn mark_all_read(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<NotificationRow> = diesel::update(
            notifications::table
                .filter(notifications::user_id.eq(*user_id.as_uuid()))
                .filter(notifications::is_read.eq(false)),
        )
        .set(notifications::is_read.eq(true))
        .returning(NotificationRow::as_returning())
        .get_results(&mut conn)
        .await
        .map_err(diesel_error)?;
        decode(rows)
    }
}
