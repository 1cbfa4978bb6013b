//! The requester's visible slice of the ledger.

use actix_web::{HttpResponse, get, web};

use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{ErrorSchema, VisibleLedgerSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Projects, users, advances and expenses the signed-in user may see.
#[utoipa::path(
    get,
    path = "/api/v1/workspace",
    responses(
        (status = 200, description = "Visible ledger", body = VisibleLedgerSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 404, description = "Requester no longer exists", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["workspace"],
    operation_id = "visibleWorkspace"
)]
#[get("/workspace")]
pub async fn visible_workspace(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    let requester = session.require_user_id()?;
    let ledger = state.workspace.visible_workspace(&requester).await?;
    Ok(HttpResponse::Ok().json(ledger))
}
