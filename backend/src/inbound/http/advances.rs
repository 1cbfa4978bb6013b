//! Advance lifecycle and settlement endpoints.
//!
//! ```text
//! POST /api/v1/advances                     issue or request an advance
//! POST /api/v1/advances/{id}/approve        fund a pending advance
//! POST /api/v1/advances/{id}/reject         refuse a pending advance
//! GET  /api/v1/advances/{id}/settlement     preview a settlement
//! POST /api/v1/advances/{id}/settlement     close the advance
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::domain::ports::{CreateAdvanceRequest, SettleAdvanceRequest};
use crate::domain::{AdvanceId, Amount};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{
    AdvanceSchema, ErrorSchema, SettleAdvanceResponseSchema, SettlementPreviewSchema,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, missing_field_error, parse_amount, parse_id, parse_optional_id,
};

const ADVANCE_ID: FieldName = FieldName::new("id");

fn advance_id(path: web::Path<String>) -> ApiResult<AdvanceId> {
    parse_id(&path.into_inner(), ADVANCE_ID)
}

/// Body of `POST /api/v1/advances`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdvanceBody {
    #[schema(format = Uuid)]
    pub project_id: String,
    /// Holder of the advance; defaults to the requester.
    #[schema(format = Uuid)]
    pub beneficiary_id: Option<String>,
    #[schema(value_type = String, example = "1000.00")]
    pub amount: Amount,
    #[schema(example = "Site float for April")]
    pub description: String,
}

/// Body of the reject endpoints.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct RejectBody {
    #[schema(example = "Duplicate request")]
    pub reason: Option<String>,
}

impl RejectBody {
    pub(crate) fn into_reason(self) -> ApiResult<String> {
        self.reason
            .filter(|reason| !reason.trim().is_empty())
            .ok_or_else(|| missing_field_error(FieldName::new("reason")))
    }
}

/// Query of the settlement preview.
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SettlementPreviewQuery {
    /// Cash handed back by the holder; defaults to zero.
    #[param(example = "100.00")]
    pub returned_cash: Option<String>,
}

/// Body of `POST /api/v1/advances/{id}/settlement`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettleAdvanceBody {
    #[schema(value_type = String, example = "100.00")]
    pub returned_cash_amount: Amount,
    pub notes: Option<String>,
}

/// Issue an advance, or request one for approval.
#[utoipa::path(
    post,
    path = "/api/v1/advances",
    request_body = CreateAdvanceBody,
    responses(
        (status = 201, description = "Advance created; OPEN when self-funded, otherwise PENDING", body = AdvanceSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 403, description = "Beneficiary outside the requester's authority", body = ErrorSchema),
        (status = 404, description = "Unknown project or beneficiary", body = ErrorSchema),
        (status = 409, description = "Project archived", body = ErrorSchema)
    ),
    tags = ["advances"],
    operation_id = "createAdvance"
)]
#[post("/advances")]
pub async fn create_advance(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateAdvanceBody>,
) -> ApiResult<HttpResponse> {
    let requester = session.require_user_id()?;
    let body = payload.into_inner();
    let project_id = parse_id(&body.project_id, FieldName::new("projectId"))?;
    let beneficiary_id =
        parse_optional_id(body.beneficiary_id.as_deref(), FieldName::new("beneficiaryId"))?;
    let advance = state
        .advances
        .create_advance(CreateAdvanceRequest {
            requester,
            project_id,
            beneficiary_id,
            amount: body.amount,
            description: body.description,
        })
        .await?;
    info!(advance_id = %advance.id(), status = %advance.status(), "advance created");
    Ok(HttpResponse::Created().json(advance))
}

#[utoipa::path(
    post,
    path = "/api/v1/advances/{id}/approve",
    params(("id" = String, Path, format = Uuid)),
    responses(
        (status = 200, description = "Advance opened", body = AdvanceSchema),
        (status = 403, description = "No approval authority", body = ErrorSchema),
        (status = 404, description = "Unknown advance", body = ErrorSchema),
        (status = 409, description = "Advance is not pending", body = ErrorSchema)
    ),
    tags = ["advances"],
    operation_id = "approveAdvance"
)]
#[post("/advances/{id}/approve")]
pub async fn approve_advance(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let requester = session.require_user_id()?;
    let id = advance_id(path)?;
    let advance = state.advances.approve_advance(&requester, &id).await?;
    info!(advance_id = %id, "advance approved");
    Ok(HttpResponse::Ok().json(advance))
}

#[utoipa::path(
    post,
    path = "/api/v1/advances/{id}/reject",
    params(("id" = String, Path, format = Uuid)),
    request_body = RejectBody,
    responses(
        (status = 200, description = "Advance rejected", body = AdvanceSchema),
        (status = 400, description = "Missing reason", body = ErrorSchema),
        (status = 403, description = "No approval authority", body = ErrorSchema),
        (status = 404, description = "Unknown advance", body = ErrorSchema),
        (status = 409, description = "Advance is not pending", body = ErrorSchema)
    ),
    tags = ["advances"],
    operation_id = "rejectAdvance"
)]
#[post("/advances/{id}/reject")]
pub async fn reject_advance(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<RejectBody>,
) -> ApiResult<HttpResponse> {
    let requester = session.require_user_id()?;
    let id = advance_id(path)?;
    let reason = payload.into_inner().into_reason()?;
    let advance = state.advances.reject_advance(&requester, &id, &reason).await?;
    info!(advance_id = %id, "advance rejected");
    Ok(HttpResponse::Ok().json(advance))
}

/// Figures a settlement would record, without writing anything.
#[utoipa::path(
    get,
    path = "/api/v1/advances/{id}/settlement",
    params(("id" = String, Path, format = Uuid), SettlementPreviewQuery),
    responses(
        (status = 200, description = "Preview", body = SettlementPreviewSchema),
        (status = 400, description = "Invalid amount", body = ErrorSchema),
        (status = 403, description = "Requester is not an admin", body = ErrorSchema),
        (status = 404, description = "Unknown advance", body = ErrorSchema)
    ),
    tags = ["settlements"],
    operation_id = "previewSettlement"
)]
#[get("/advances/{id}/settlement")]
pub async fn preview_settlement(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    query: web::Query<SettlementPreviewQuery>,
) -> ApiResult<HttpResponse> {
    let requester = session.require_user_id()?;
    let id = advance_id(path)?;
    let returned_cash = query
        .into_inner()
        .returned_cash
        .map(|raw| parse_amount(&raw, FieldName::new("returnedCash")))
        .transpose()?
        .unwrap_or(Amount::ZERO);
    let preview = state
        .settlements
        .preview_settlement(&requester, &id, returned_cash)
        .await?;
    Ok(HttpResponse::Ok().json(preview))
}

/// Close an open advance, carrying any deficit forward. Admins only.
#[utoipa::path(
    post,
    path = "/api/v1/advances/{id}/settlement",
    params(("id" = String, Path, format = Uuid)),
    request_body = SettleAdvanceBody,
    responses(
        (status = 200, description = "Advance closed", body = SettleAdvanceResponseSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Requester is not an admin", body = ErrorSchema),
        (status = 404, description = "Unknown advance", body = ErrorSchema),
        (status = 409, description = "Advance is not open", body = ErrorSchema)
    ),
    tags = ["settlements"],
    operation_id = "settleAdvance"
)]
#[post("/advances/{id}/settlement")]
pub async fn settle_advance(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<SettleAdvanceBody>,
) -> ApiResult<HttpResponse> {
    let requester = session.require_user_id()?;
    let advance_id = advance_id(path)?;
    let SettleAdvanceBody {
        returned_cash_amount,
        notes,
    } = payload.into_inner();
    let settled = state
        .settlements
        .settle_advance(SettleAdvanceRequest {
            requester,
            advance_id,
            returned_cash_amount,
            notes,
        })
        .await?;
    info!(
        advance_id = %advance_id,
        carried_forward = settled.carry_forward.is_some(),
        "advance settled"
    );
    Ok(HttpResponse::Ok().json(settled))
}
