//! OpenAPI schema definitions for domain types.
//!
//! Domain types stay framework-agnostic and do not derive `ToSchema`. The
//! wrappers here mirror their JSON shape for the generated document only.

use serde::Serialize;
use utoipa::ToSchema;

/// Stable machine-readable error codes returned in API error responses.
#[derive(ToSchema)]
#[schema(as = ErrorCode)]
pub enum ErrorCodeSchema {
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    #[schema(rename = "unauthorized")]
    Unauthorized,
    #[schema(rename = "forbidden")]
    Forbidden,
    /// Missing, or outside the caller's visibility scope.
    #[schema(rename = "not_found")]
    NotFound,
    /// The record is not in a state that allows the change.
    #[schema(rename = "conflict")]
    Conflict,
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    #[schema(rename = "internal_error")]
    InternalError,
}

/// API error payload.
#[derive(ToSchema)]
#[schema(as = Error, rename_all = "camelCase")]
#[expect(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]
pub struct ErrorSchema {
    #[schema(example = "conflict")]
    code: ErrorCodeSchema,
    #[schema(example = "advance is already closed")]
    message: String,
    /// Correlates this response with server logs.
    #[schema(example = "7d1c5f0a-2b3e-4c8d-9f6a-1e2d3c4b5a69")]
    trace_id: Option<String>,
    details: Option<serde_json::Value>,
}

/// A member of a tenant hierarchy.
#[derive(ToSchema)]
#[schema(as = User, rename_all = "camelCase")]
#[expect(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]
pub struct UserSchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    #[schema(example = "Faisal Qureshi")]
    name: String,
    #[schema(example = "faisal@example.com")]
    email: String,
    #[schema(example = "ENGINEER")]
    role: String,
    #[schema(value_type = Option<String>, format = Uuid)]
    manager_id: Option<String>,
    #[schema(value_type = Option<String>, format = Uuid)]
    root_admin_id: Option<String>,
    job_title: Option<String>,
    phone: Option<String>,
    avatar_url: Option<String>,
}

/// A project advances are issued against.
#[derive(ToSchema)]
#[schema(as = Project, rename_all = "camelCase")]
#[expect(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]
pub struct ProjectSchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    #[schema(example = "Harbour Depot")]
    name: String,
    #[schema(example = "Jeddah")]
    location: String,
    #[schema(value_type = String, format = Uuid)]
    manager_id: String,
    #[schema(example = "ACTIVE")]
    status: String,
    #[schema(value_type = String, format = DateTime)]
    created_at: String,
}

/// Figures recorded when an advance closes.
#[derive(ToSchema)]
#[schema(as = SettlementData, rename_all = "camelCase")]
#[expect(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]
pub struct SettlementDataSchema {
    #[schema(example = "850.00")]
    total_approved_expenses: String,
    #[schema(example = "100.00")]
    returned_cash_amount: String,
    /// Positive when the holder still owes money.
    #[schema(example = "50.00")]
    deficit_amount: String,
    notes: Option<String>,
    #[schema(value_type = String, format = Date)]
    settlement_date: String,
}

/// A cash advance.
#[derive(ToSchema)]
#[schema(as = Advance, rename_all = "camelCase")]
#[expect(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]
pub struct AdvanceSchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    #[schema(value_type = String, format = Uuid)]
    project_id: String,
    #[schema(value_type = String, format = Uuid)]
    user_id: String,
    #[schema(value_type = String, format = Uuid)]
    created_by: String,
    #[schema(example = "1000.00")]
    amount: String,
    #[schema(example = "150.00")]
    remaining_amount: String,
    #[schema(example = "OPEN")]
    status: String,
    description: String,
    #[schema(value_type = String, format = Date)]
    date: String,
    settlement_data: Option<SettlementDataSchema>,
    rejection_reason: Option<String>,
    /// Set on carry-forward advances.
    #[schema(value_type = Option<String>, format = Uuid)]
    origin_advance_id: Option<String>,
}

/// One invoice line.
#[derive(ToSchema)]
#[schema(as = InvoiceItem, rename_all = "camelCase")]
#[expect(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]
pub struct InvoiceItemSchema {
    item_name: String,
    #[schema(example = "2")]
    quantity: String,
    #[schema(example = "7.50")]
    unit_price: String,
    #[schema(example = "15.00")]
    total: String,
}

/// An expense recorded against an advance.
#[derive(ToSchema)]
#[schema(as = Expense, rename_all = "camelCase")]
#[expect(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]
pub struct ExpenseSchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    #[schema(value_type = String, format = Uuid)]
    advance_id: String,
    #[schema(value_type = String, format = Uuid)]
    user_id: String,
    #[schema(example = "42.50")]
    amount: String,
    base_amount: Option<String>,
    additional_amount: String,
    description: String,
    notes: Option<String>,
    image_url: Option<String>,
    #[schema(value_type = String, format = Date)]
    date: String,
    #[schema(example = "PENDING")]
    status: String,
    is_editable: bool,
    is_invoice: bool,
    invoice_items: Vec<InvoiceItemSchema>,
    rejection_reason: Option<String>,
}

/// One invoice line as submitted.
#[derive(Serialize, ToSchema)]
#[schema(as = InvoiceItemPayload)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]
pub struct InvoiceItemPayloadSchema {
    #[schema(example = "Cement bag")]
    item_name: String,
    #[schema(example = "2")]
    quantity: String,
    #[schema(example = "7.50")]
    unit_price: String,
}

/// How an expense amount is made up.
#[derive(Serialize, ToSchema)]
#[schema(as = ExpenseBreakdown)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
#[allow(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]
pub enum ExpenseBreakdownSchema {
    Fixed {
        #[serde(rename = "baseAmount")]
        #[schema(example = "40.00")]
        base_amount: String,
    },
    Invoice { items: Vec<InvoiceItemPayloadSchema> },
}

/// Expense content shared by submit and edit.
#[derive(ToSchema)]
#[schema(as = ExpensePayload, rename_all = "camelCase")]
#[expect(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]
pub struct ExpensePayloadSchema {
    #[schema(example = "Fuel for generator")]
    description: String,
    notes: Option<String>,
    image_url: Option<String>,
    breakdown: ExpenseBreakdownSchema,
    /// Added on top of the breakdown, e.g. VAT.
    #[schema(example = "2.50")]
    additional_amount: Option<String>,
}

/// Body of `POST /api/v1/expenses`.
#[derive(ToSchema)]
#[schema(as = SubmitExpenseBody, rename_all = "camelCase")]
#[expect(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]
pub struct SubmitExpenseBodySchema {
    #[schema(value_type = String, format = Uuid)]
    advance_id: String,
    expense: ExpensePayloadSchema,
}

/// What settling an advance would record.
#[derive(ToSchema)]
#[schema(as = SettlementPreview, rename_all = "camelCase")]
#[expect(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]
pub struct SettlementPreviewSchema {
    approved_expenses: String,
    theoretical_balance: String,
    returned_cash_amount: String,
    deficit: String,
}

/// Result of settling an advance.
#[derive(ToSchema)]
#[schema(as = SettleAdvanceResponse, rename_all = "camelCase")]
#[expect(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]
pub struct SettleAdvanceResponseSchema {
    advance: AdvanceSchema,
    /// Present when the holder still owes money.
    carry_forward: Option<AdvanceSchema>,
    preview: SettlementPreviewSchema,
}

/// Everything the requester may see.
#[derive(ToSchema)]
#[schema(as = VisibleLedger, rename_all = "camelCase")]
#[expect(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]
pub struct VisibleLedgerSchema {
    projects: Vec<ProjectSchema>,
    users: Vec<UserSchema>,
    advances: Vec<AdvanceSchema>,
    expenses: Vec<ExpenseSchema>,
}

/// An inbox entry.
#[derive(ToSchema)]
#[schema(as = Notification, rename_all = "camelCase")]
#[expect(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]
pub struct NotificationSchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    #[schema(value_type = String, format = Uuid)]
    user_id: String,
    message: String,
    #[schema(rename = "type", example = "SUCCESS")]
    kind: String,
    is_read: bool,
    #[schema(value_type = String, format = DateTime)]
    created_at: String,
}

/// Public location of a stored receipt.
#[derive(ToSchema)]
#[schema(as = StoredReceipt)]
#[expect(dead_code, reason = "Used only for OpenAPI schema generation via utoipa")]
pub struct StoredReceiptSchema {
    #[schema(example = "/receipts/9f86d0818.png")]
    url: String,
}
