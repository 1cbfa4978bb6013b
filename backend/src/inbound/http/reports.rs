//! Spend report download.

use actix_web::{HttpResponse, get, web};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::SpendFilter;
use crate::inbound::http::ApiResult;
use crate::inbound::http::download::attachment;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_optional_date, parse_optional_id};

/// Optional narrowing of the spend report. Dates are inclusive
/// `YYYY-MM-DD` bounds on the advance date.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct SpendReportQuery {
    #[param(format = Uuid)]
    pub project_id: Option<String>,
    #[param(format = Uuid)]
    pub user_id: Option<String>,
    #[param(format = Date, example = "2026-04-01")]
    pub from: Option<String>,
    #[param(format = Date, example = "2026-04-30")]
    pub to: Option<String>,
}

impl TryFrom<SpendReportQuery> for SpendFilter {
    type Error = crate::domain::Error;

    fn try_from(query: SpendReportQuery) -> Result<Self, Self::Error> {
        Ok(Self {
            project_id: parse_optional_id(query.project_id.as_deref(), FieldName::new("projectId"))?,
            user_id: parse_optional_id(query.user_id.as_deref(), FieldName::new("userId"))?,
            from: parse_optional_date(query.from.as_deref(), FieldName::new("from"))?,
            to: parse_optional_date(query.to.as_deref(), FieldName::new("to"))?,
        })
    }
}

/// Approved spend per project and advance within the requester's view.
#[utoipa::path(
    get,
    path = "/api/v1/reports/spend",
    params(SpendReportQuery),
    responses(
        (status = 200, description = "Spend workbook", content_type = "application/octet-stream"),
        (status = 400, description = "Invalid filter", body = ErrorSchema),
        (status = 401, description = "Unauthorised", body = ErrorSchema)
    ),
    tags = ["reports"],
    operation_id = "spendReport"
)]
#[get("/reports/spend")]
pub async fn spend_report(
    state: web::Data<HttpState>,
    session: SessionContext,
    query: web::Query<SpendReportQuery>,
) -> ApiResult<HttpResponse> {
    let requester = session.require_user_id()?;
    let filter = SpendFilter::try_from(query.into_inner())?;
    let file = state.reports.spend_report(&requester, filter).await?;
    Ok(attachment(file))
}
