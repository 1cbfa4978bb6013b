//! Expense submission, review and invoice download.

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::ExpenseId;
use crate::domain::ports::{EditExpenseRequest, ExpensePayload, SubmitExpenseRequest};
use crate::inbound::http::ApiResult;
use crate::inbound::http::advances::RejectBody;
use crate::inbound::http::download::attachment;
use crate::inbound::http::schemas::{
    ErrorSchema, ExpensePayloadSchema, ExpenseSchema, SubmitExpenseBodySchema,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id};

fn expense_id(path: web::Path<String>) -> ApiResult<ExpenseId> {
    parse_id(&path.into_inner(), FieldName::new("id"))
}

/// Body of `POST /api/v1/expenses`.
#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitExpenseBody {
    pub advance_id: String,
    pub expense: ExpensePayload,
}

/// Record an expense against one of the requester's open advances.
#[utoipa::path(
    post,
    path = "/api/v1/expenses",
    request_body = SubmitExpenseBodySchema,
    responses(
        (status = 201, description = "Expense submitted", body = ExpenseSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Advance belongs to someone else", body = ErrorSchema),
        (status = 404, description = "Unknown advance", body = ErrorSchema),
        (status = 409, description = "Advance is not open", body = ErrorSchema)
    ),
    tags = ["expenses"],
    operation_id = "submitExpense"
)]
#[post("/expenses")]
pub async fn submit_expense(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SubmitExpenseBody>,
) -> ApiResult<HttpResponse> {
    let requester = session.require_user_id()?;
    let SubmitExpenseBody {
        advance_id,
        expense,
    } = payload.into_inner();
    let advance_id = parse_id(&advance_id, FieldName::new("advanceId"))?;
    let expense = state
        .expenses
        .submit_expense(SubmitExpenseRequest {
            requester,
            advance_id,
            expense,
        })
        .await?;
    info!(expense_id = %expense.id(), advance_id = %advance_id, "expense submitted");
    Ok(HttpResponse::Created().json(expense))
}

/// Replace the content of an editable expense.
#[utoipa::path(
    put,
    path = "/api/v1/expenses/{id}",
    params(("id" = String, Path, format = Uuid)),
    request_body = ExpensePayloadSchema,
    responses(
        (status = 200, description = "Expense updated", body = ExpenseSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 403, description = "Not the submitter", body = ErrorSchema),
        (status = 404, description = "Unknown expense", body = ErrorSchema),
        (status = 409, description = "Expense is locked", body = ErrorSchema)
    ),
    tags = ["expenses"],
    operation_id = "editExpense"
)]
#[put("/expenses/{id}")]
pub async fn edit_expense(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<ExpensePayload>,
) -> ApiResult<HttpResponse> {
    let requester = session.require_user_id()?;
    let expense_id = expense_id(path)?;
    let expense = state
        .expenses
        .edit_expense(EditExpenseRequest {
            requester,
            expense_id,
            expense: payload.into_inner(),
        })
        .await?;
    Ok(HttpResponse::Ok().json(expense))
}

#[utoipa::path(
    post,
    path = "/api/v1/expenses/{id}/approve",
    params(("id" = String, Path, format = Uuid)),
    responses(
        (status = 200, description = "Expense approved", body = ExpenseSchema),
        (status = 403, description = "No approval authority", body = ErrorSchema),
        (status = 404, description = "Unknown expense", body = ErrorSchema),
        (status = 409, description = "Expense already reviewed or advance closed", body = ErrorSchema)
    ),
    tags = ["expenses"],
    operation_id = "approveExpense"
)]
#[post("/expenses/{id}/approve")]
pub async fn approve_expense(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let requester = session.require_user_id()?;
    let id = expense_id(path)?;
    let expense = state.expenses.approve_expense(&requester, &id).await?;
    info!(expense_id = %id, "expense approved");
    Ok(HttpResponse::Ok().json(expense))
}

#[utoipa::path(
    post,
    path = "/api/v1/expenses/{id}/reject",
    params(("id" = String, Path, format = Uuid)),
    request_body = RejectBody,
    responses(
        (status = 200, description = "Expense rejected", body = ExpenseSchema),
        (status = 400, description = "Missing reason", body = ErrorSchema),
        (status = 403, description = "No approval authority", body = ErrorSchema),
        (status = 404, description = "Unknown expense", body = ErrorSchema),
        (status = 409, description = "Expense already reviewed", body = ErrorSchema)
    ),
    tags = ["expenses"],
    operation_id = "rejectExpense"
)]
#[post("/expenses/{id}/reject")]
pub async fn reject_expense(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<RejectBody>,
) -> ApiResult<HttpResponse> {
    let requester = session.require_user_id()?;
    let id = expense_id(path)?;
    let reason = payload.into_inner().into_reason()?;
    let expense = state.expenses.reject_expense(&requester, &id, &reason).await?;
    info!(expense_id = %id, "expense rejected");
    Ok(HttpResponse::Ok().json(expense))
}

/// Lock or unlock a pending expense for its submitter.
#[utoipa::path(
    post,
    path = "/api/v1/expenses/{id}/editability",
    params(("id" = String, Path, format = Uuid)),
    responses(
        (status = 200, description = "Editability toggled", body = ExpenseSchema),
        (status = 403, description = "No approval authority", body = ErrorSchema),
        (status = 404, description = "Unknown expense", body = ErrorSchema),
        (status = 409, description = "Expense already reviewed", body = ErrorSchema)
    ),
    tags = ["expenses"],
    operation_id = "toggleExpenseEditability"
)]
#[post("/expenses/{id}/editability")]
pub async fn toggle_editability(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let requester = session.require_user_id()?;
    let id = expense_id(path)?;
    let expense = state.expenses.toggle_editability(&requester, &id).await?;
    Ok(HttpResponse::Ok().json(expense))
}

/// Download the invoice workbook of an expense.
#[utoipa::path(
    get,
    path = "/api/v1/expenses/{id}/invoice",
    params(("id" = String, Path, format = Uuid)),
    responses(
        (status = 200, description = "Invoice workbook", content_type = "application/octet-stream"),
        (status = 404, description = "Unknown expense", body = ErrorSchema)
    ),
    tags = ["reports"],
    operation_id = "expenseInvoice"
)]
#[get("/expenses/{id}/invoice")]
pub async fn expense_invoice(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let requester = session.require_user_id()?;
    let id = expense_id(path)?;
    let file = state.reports.expense_invoice(&requester, &id).await?;
    Ok(attachment(file))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{ExpenseBreakdownPayload, ExportedFile};
    use crate::domain::test_fixtures::{admin, advance, amount, engineer, expense, project};
    use crate::domain::{AdvanceId, AdvanceStatus, Error, Expense, ProjectStatus};
    use crate::inbound::http::test_utils::{MockPorts, requester, signed_in, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::{fixture, rstest};
    use rust_decimal::Decimal;
    use serde_json::{Value, json};

    fn api() -> actix_web::Scope {
        web::scope("/api/v1")
            .service(submit_expense)
            .service(edit_expense)
            .service(approve_expense)
            .service(reject_expense)
            .service(toggle_editability)
            .service(expense_invoice)
    }

    #[fixture]
    fn fuel() -> Expense {
        let root = admin("Hana");
        let lead = engineer("Faisal", &root);
        let float = advance(&project(&root, ProjectStatus::Active), &lead, 500, AdvanceStatus::Open);
        expense(&float, 40)
    }

    #[rstest]
    #[actix_web::test]
    async fn submit_decodes_invoice_lines(fuel: Expense) {
        let advance_id = AdvanceId::random();
        let mut ports = MockPorts::default();
        ports
            .expenses
            .expect_submit_expense()
            .withf(move |request| {
                let ExpenseBreakdownPayload::Invoice { items } = &request.expense.breakdown else {
                    return false;
                };
                request.requester == requester()
                    && request.advance_id == advance_id
                    && items.len() == 1
                    && items[0].quantity == Decimal::new(25, 1)
                    && request.expense.additional_amount == Some(amount(2))
            })
            .return_once(move |_| Ok(fuel));
        let app = actix_test::init_service(test_app(ports, api())).await;
        let cookie = signed_in(&app).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/expenses")
                .cookie(cookie)
                .set_json(json!({
                    "advanceId": advance_id.to_string(),
                    "expense": {
                        "description": "Cement",
                        "breakdown": {
                            "kind": "INVOICE",
                            "items": [{"itemName": "Bag", "quantity": "2.5", "unitPrice": "15"}]
                        },
                        "additionalAmount": "2"
                    }
                }))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CREATED);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["status"], "PENDING");
        assert_eq!(body["amount"], "40.00");
    }

    #[rstest]
    #[actix_web::test]
    async fn unknown_breakdown_kind_is_rejected() {
        let app = actix_test::init_service(test_app(MockPorts::default(), api())).await;
        let cookie = signed_in(&app).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri("/api/v1/expenses")
                .cookie(cookie)
                .set_json(json!({
                    "advanceId": AdvanceId::random().to_string(),
                    "expense": {"description": "Fuel", "breakdown": {"kind": "ESTIMATE"}}
                }))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[rstest]
    #[actix_web::test]
    async fn edit_of_locked_expense_conflicts(fuel: Expense) {
        let id = fuel.id();
        let mut ports = MockPorts::default();
        ports
            .expenses
            .expect_edit_expense()
            .withf(move |request| request.expense_id == id)
            .return_once(|_| Err(Error::conflict("expense is locked")));
        let app = actix_test::init_service(test_app(ports, api())).await;
        let cookie = signed_in(&app).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri(&format!("/api/v1/expenses/{id}"))
                .cookie(cookie)
                .set_json(json!({
                    "description": "Fuel",
                    "breakdown": {"kind": "FIXED", "baseAmount": "45"}
                }))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[rstest]
    #[actix_web::test]
    async fn reject_passes_the_reason(fuel: Expense) {
        let id = fuel.id();
        let rejected = fuel.reject("no receipt").expect("reject");
        let mut ports = MockPorts::default();
        ports
            .expenses
            .expect_reject_expense()
            .withf(move |_, expense_id, reason| *expense_id == id && reason == "no receipt")
            .return_once(move |_, _, _| Ok(rejected));
        let app = actix_test::init_service(test_app(ports, api())).await;
        let cookie = signed_in(&app).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/expenses/{id}/reject"))
                .cookie(cookie)
                .set_json(json!({"reason": "no receipt"}))
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["status"], "REJECTED");
        assert_eq!(body["rejectionReason"], "no receipt");
    }

    #[rstest]
    #[actix_web::test]
    async fn toggle_returns_the_new_flag(fuel: Expense) {
        let id = fuel.id();
        let locked = fuel.toggle_editable().expect("toggle");
        let mut ports = MockPorts::default();
        ports
            .expenses
            .expect_toggle_editability()
            .return_once(move |_, _| Ok(locked));
        let app = actix_test::init_service(test_app(ports, api())).await;
        let cookie = signed_in(&app).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/expenses/{id}/editability"))
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["isEditable"], false);
    }

    #[rstest]
    #[actix_web::test]
    async fn invoice_download_hides_other_hierarchies() {
        let mut ports = MockPorts::default();
        ports
            .reports
            .expect_expense_invoice()
            .return_once(|_, _| Err(Error::not_found("expense not found")));
        let app = actix_test::init_service(test_app(ports, api())).await;
        let cookie = signed_in(&app).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/api/v1/expenses/{}/invoice", ExpenseId::random()))
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[rstest]
    #[actix_web::test]
    async fn invoice_download_is_an_attachment() {
        let mut ports = MockPorts::default();
        ports.reports.expect_expense_invoice().return_once(|_, _| {
            Ok(ExportedFile {
                file_name: "invoice-fuel.json".to_owned(),
                content_type: "application/json".to_owned(),
                bytes: b"{}".to_vec(),
            })
        });
        let app = actix_test::init_service(test_app(ports, api())).await;
        let cookie = signed_in(&app).await;

        let response = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri(&format!("/api/v1/expenses/{}/invoice", ExpenseId::random()))
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("content-disposition"));
    }
}
