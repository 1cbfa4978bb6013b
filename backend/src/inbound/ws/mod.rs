//! WebSocket inbound adapter streaming ledger changes to clients.
//!
//! Responsibilities:
//! - validate upgrade requests (session and origin allow-list)
//! - start the viewer's change feed before upgrading, so failures are
//!   reported as HTTP errors
//! - pump reactions to the socket with heartbeats

use actix_web::http::header::{HeaderValue, ORIGIN};
use actix_web::web::{self, Payload};
use actix_web::{HttpRequest, HttpResponse, get};
use tracing::{error, info, warn};
use url::Url;

use crate::domain::{Error, TraceId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;

mod session;

pub mod messages;
pub mod state;

use state::{OriginPolicy, WsState};

/// Upgrade to the change-feed socket for the signed-in user.
#[utoipa::path(
    get,
    path = "/ws/changes",
    responses(
        (status = 101, description = "Switching to the change feed"),
        (status = 400, description = "Malformed Origin header"),
        (status = 401, description = "Unauthorised"),
        (status = 403, description = "Origin not allowed")
    ),
    tags = ["changes"],
    operation_id = "watchChanges"
)]
#[get("/ws/changes")]
pub async fn ws_changes(
    state: web::Data<WsState>,
    session: SessionContext,
    req: HttpRequest,
    body: Payload,
) -> ApiResult<HttpResponse> {
    let viewer = session.require_user_id()?;
    check_origin(&req, &state.origins)?;
    let reactions = state.feed.watch(&viewer).await?;
    let (response, ws_session, stream) = actix_ws::handle(&req, body).map_err(|err| {
        warn!(error = %err, "WebSocket upgrade failed");
        Error::invalid_request("WebSocket upgrade failed")
    })?;
    info!(viewer = %viewer, "change feed connected");
    actix_web::rt::spawn(TraceId::propagate(session::run_change_feed(
        viewer, reactions, ws_session, stream,
    )));
    Ok(response)
}

fn check_origin(req: &HttpRequest, policy: &OriginPolicy) -> ApiResult<()> {
    let mut origins = req.headers().get_all(ORIGIN);
    let header = origins.next().ok_or_else(|| {
        error!("missing Origin header on WebSocket upgrade");
        Error::forbidden("origin not allowed")
    })?;
    if origins.next().is_some() {
        error!("multiple Origin headers on WebSocket upgrade");
        return Err(Error::invalid_request("invalid Origin header"));
    }
    let origin = parse_origin(header)?;
    if policy.allows(&origin) {
        Ok(())
    } else {
        warn!(origin = %origin, "rejected WebSocket upgrade from disallowed origin");
        Err(Error::forbidden("origin not allowed"))
    }
}

fn parse_origin(header: &HeaderValue) -> ApiResult<Url> {
    let value = header.to_str().map_err(|err| {
        error!(error = %err, "Origin header is not visible ASCII");
        Error::invalid_request("invalid Origin header")
    })?;
    Url::parse(value).map_err(|err| {
        error!(error = %err, "Origin header is not a URL");
        Error::invalid_request("invalid Origin header")
    })
}
