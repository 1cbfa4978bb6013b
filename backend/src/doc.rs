//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every HTTP handler in the inbound layer, the schema
//! wrappers from [`crate::inbound::http::schemas`] (which keep `utoipa` out
//! of the domain) and the session cookie security scheme.
//!
//! The document backs Swagger UI in debug builds.

use crate::inbound::http::advances::{CreateAdvanceBody, RejectBody, SettleAdvanceBody};
use crate::inbound::http::login::LoginRequest;
use crate::inbound::http::notifications::MarkAllReadResponse;
use crate::inbound::http::projects::CreateProjectBody;
use crate::inbound::http::schemas::{
    AdvanceSchema, ErrorCodeSchema, ErrorSchema, ExpenseBreakdownSchema, ExpensePayloadSchema,
    ExpenseSchema, InvoiceItemPayloadSchema, InvoiceItemSchema, NotificationSchema,
    ProjectSchema, SettleAdvanceResponseSchema, SettlementDataSchema, SettlementPreviewSchema,
    StoredReceiptSchema, SubmitExpenseBodySchema, UserSchema, VisibleLedgerSchema,
};
use crate::inbound::http::team::AddUserBody;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Advance ledger API",
        description = "Cash advances, expenses and settlements for project teams."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::login::login,
        crate::inbound::http::workspace::visible_workspace,
        crate::inbound::http::team::add_user,
        crate::inbound::http::team::delete_user,
        crate::inbound::http::projects::create_project,
        crate::inbound::http::projects::archive_project,
        crate::inbound::http::projects::project_archive,
        crate::inbound::http::advances::create_advance,
        crate::inbound::http::advances::approve_advance,
        crate::inbound::http::advances::reject_advance,
        crate::inbound::http::advances::preview_settlement,
        crate::inbound::http::advances::settle_advance,
        crate::inbound::http::expenses::submit_expense,
        crate::inbound::http::expenses::edit_expense,
        crate::inbound::http::expenses::approve_expense,
        crate::inbound::http::expenses::reject_expense,
        crate::inbound::http::expenses::toggle_editability,
        crate::inbound::http::expenses::expense_invoice,
        crate::inbound::http::reports::spend_report,
        crate::inbound::http::receipts::store_receipt,
        crate::inbound::http::notifications::list_notifications,
        crate::inbound::http::notifications::mark_read,
        crate::inbound::http::notifications::mark_all_read,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
        crate::inbound::ws::ws_changes,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        UserSchema,
        ProjectSchema,
        AdvanceSchema,
        SettlementDataSchema,
        ExpenseSchema,
        InvoiceItemSchema,
        InvoiceItemPayloadSchema,
        ExpenseBreakdownSchema,
        ExpensePayloadSchema,
        SubmitExpenseBodySchema,
        SettlementPreviewSchema,
        SettleAdvanceResponseSchema,
        VisibleLedgerSchema,
        NotificationSchema,
        StoredReceiptSchema,
        LoginRequest,
        AddUserBody,
        CreateProjectBody,
        CreateAdvanceBody,
        RejectBody,
        SettleAdvanceBody,
        MarkAllReadResponse,
    )),
    tags(
        (name = "session", description = "Sign-in"),
        (name = "workspace", description = "Role-filtered ledger snapshot"),
        (name = "team", description = "Tenant hierarchy management"),
        (name = "projects", description = "Projects and archive reports"),
        (name = "advances", description = "Advance lifecycle and settlement"),
        (name = "expenses", description = "Expense approval and invoices"),
        (name = "reports", description = "Spend reports"),
        (name = "receipts", description = "Receipt uploads"),
        (name = "notifications", description = "User inbox"),
        (name = "changes", description = "Realtime change feed"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
