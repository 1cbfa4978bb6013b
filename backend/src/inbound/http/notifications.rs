//! The signed-in user's inbox.

use actix_web::{HttpResponse, get, post, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::NotificationId;
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{ErrorSchema, NotificationSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id};

/// Result of `POST /api/v1/notifications/read`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkAllReadResponse {
    /// Notifications that were unread before the call.
    pub updated: usize,
}

/// Newest first.
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    responses(
        (status = 200, description = "Inbox", body = [NotificationSchema]),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["notifications"],
    operation_id = "listNotifications"
)]
#[get("/notifications")]
pub async fn list_notifications(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let user = session.require_user_id()?;
    let inbox = state.notifications.list_notifications(&user).await?;
    Ok(HttpResponse::Ok().json(inbox))
}

#[utoipa::path(
    post,
    path = "/api/v1/notifications/{id}/read",
    params(("id" = String, Path, format = Uuid)),
    responses(
        (status = 200, description = "Marked read", body = NotificationSchema),
        (status = 404, description = "Not in the caller's inbox", body = ErrorSchema)
    ),
    tags = ["notifications"],
    operation_id = "markNotificationRead"
)]
#[post("/notifications/{id}/read")]
pub async fn mark_read(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user = session.require_user_id()?;
    let id: NotificationId = parse_id(&path.into_inner(), FieldName::new("id"))?;
    let notification = state.notifications.mark_read(&user, &id).await?;
    Ok(HttpResponse::Ok().json(notification))
}

#[utoipa::path(
    post,
    path = "/api/v1/notifications/read",
    responses(
        (status = 200, description = "Inbox cleared", body = MarkAllReadResponse),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["notifications"],
    operation_id = "markAllNotificationsRead"
)]
#[post("/notifications/read")]
pub async fn mark_all_read(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let user = session.require_user_id()?;
    let updated = state.notifications.mark_all_read(&user).await?;
    Ok(HttpResponse::Ok().json(MarkAllReadResponse { updated }))
}
