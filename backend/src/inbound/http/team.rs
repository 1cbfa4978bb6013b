//! Team membership: adding and removing users.

use actix_web::{HttpResponse, delete, post, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;

use crate::domain::UserRole;
use crate::domain::ports::AddUserRequest;
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{ErrorSchema, UserSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id, parse_optional_id};

/// Body of `POST /api/v1/users`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddUserBody {
    #[schema(example = "Omar Said")]
    pub name: String,
    #[schema(example = "omar@example.com")]
    pub email: String,
    #[schema(value_type = String, example = "TECHNICIAN")]
    pub role: UserRole,
    /// Required for technicians; ignored for other roles.
    #[schema(format = Uuid)]
    pub manager_id: Option<String>,
    pub job_title: Option<String>,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
}

/// Add a member to the requester's hierarchy.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = AddUserBody,
    responses(
        (status = 201, description = "User created", body = UserSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Role may not add this user", body = ErrorSchema),
        (status = 409, description = "Email already registered", body = ErrorSchema)
    ),
    tags = ["team"],
    operation_id = "addUser"
)]
#[post("/users")]
pub async fn add_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<AddUserBody>,
) -> ApiResult<HttpResponse> {
    let requester = session.require_user_id()?;
    let body = payload.into_inner();
    let manager_id = parse_optional_id(body.manager_id.as_deref(), FieldName::new("managerId"))?;
    let user = state
        .team
        .add_user(AddUserRequest {
            requester,
            name: body.name,
            email: body.email,
            role: body.role,
            manager_id,
            job_title: body.job_title,
            phone: body.phone,
            avatar_url: body.avatar_url,
        })
        .await?;
    info!(user_id = %user.id(), role = %user.role(), "user added");
    Ok(HttpResponse::Created().json(user))
}

/// Remove a member with no outstanding money or reports.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, format = Uuid, description = "User to remove")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Invalid id", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Not an admin", body = ErrorSchema),
        (status = 404, description = "Unknown user", body = ErrorSchema),
        (status = 409, description = "User still holds advances or reports", body = ErrorSchema)
    ),
    tags = ["team"],
    operation_id = "deleteUser"
)]
#[delete("/users/{id}")]
pub async fn delete_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let requester = session.require_user_id()?;
    let target = parse_id(&path.into_inner(), FieldName::new("id"))?;
    state.team.delete_user(&requester, &target).await?;
    info!(user_id = %target, "user deleted");
    Ok(HttpResponse::NoContent().finish())
}
