//! Receipt uploads.
//!
//! The body is the raw file; its media type comes from `Content-Type`.

use actix_web::http::header::CONTENT_TYPE;
use actix_web::{HttpRequest, HttpResponse, post, web};

use crate::domain::RECEIPT_MAX_BYTES;
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::{ErrorSchema, StoredReceiptSchema};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, missing_field_error};

/// Body limit for raw uploads.
pub fn receipt_payload_config() -> web::PayloadConfig {
    web::PayloadConfig::new(RECEIPT_MAX_BYTES)
}

/// Store a receipt image or PDF and return its public URL.
#[utoipa::path(
    post,
    path = "/api/v1/receipts",
    request_body(
        content = Vec<u8>,
        content_type = "application/octet-stream",
        description = "JPEG, PNG, WebP or PDF bytes, with the matching Content-Type"
    ),
    responses(
        (status = 201, description = "Receipt stored", body = StoredReceiptSchema),
        (status = 400, description = "Empty body or unsupported type", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema),
        (status = 413, description = "Receipt too large"),
        (status = 503, description = "Storage unavailable", body = ErrorSchema)
    ),
    tags = ["receipts"],
    operation_id = "storeReceipt"
)]
#[post("/receipts")]
pub async fn store_receipt(
    state: web::Data<HttpState>,
    session: SessionContext,
    request: HttpRequest,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let requester = session.require_user_id()?;
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| missing_field_error(FieldName::new("Content-Type")))?
        .to_owned();
    let stored = state
        .receipts
        .store_receipt(&requester, &content_type, body.to_vec())
        .await?;
    Ok(HttpResponse::Created().json(stored))
}
