//! Test helpers for inbound HTTP components.

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpResponse, Scope, test, web};

use crate::domain::UserId;
use crate::domain::ports::{
    MockAdvanceCommand, MockExpenseCommand, MockLoginService, MockNotificationCommand,
    MockProjectCommand, MockReceiptCommand, MockReportQuery, MockSettlementCommand,
    MockTeamCommand, MockWorkspaceQuery,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::error::json_config;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// The user every signed-in test request acts as.
pub const REQUESTER: &str = "0b6f3c2e-8a51-4d7e-9a43-6c1f2e7d9b10";

pub fn requester() -> UserId {
    UserId::new(REQUESTER).expect("fixture requester id")
}

/// Session middleware with a fresh key, cookie `session`, no `Secure` flag.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// One mock per driving port. Ports a test never touches keep no
/// expectations, so any call to them fails the test.
#[derive(Default)]
pub struct MockPorts {
    pub login: MockLoginService,
    pub workspace: MockWorkspaceQuery,
    pub team: MockTeamCommand,
    pub projects: MockProjectCommand,
    pub advances: MockAdvanceCommand,
    pub settlements: MockSettlementCommand,
    pub expenses: MockExpenseCommand,
    pub reports: MockReportQuery,
    pub receipts: MockReceiptCommand,
    pub notifications: MockNotificationCommand,
}

impl From<MockPorts> for HttpState {
    fn from(ports: MockPorts) -> Self {
        use std::sync::Arc;
        Self {
            login: Arc::new(ports.login),
            workspace: Arc::new(ports.workspace),
            team: Arc::new(ports.team),
            projects: Arc::new(ports.projects),
            advances: Arc::new(ports.advances),
            settlements: Arc::new(ports.settlements),
            expenses: Arc::new(ports.expenses),
            reports: Arc::new(ports.reports),
            receipts: Arc::new(ports.receipts),
            notifications: Arc::new(ports.notifications),
        }
    }
}

async fn sign_in(session: SessionContext) -> ApiResult<HttpResponse> {
    session.persist_user(&requester())?;
    Ok(HttpResponse::NoContent().finish())
}

/// App serving `api` over `ports`, plus `POST /test/sign-in`.
pub fn test_app(
    ports: MockPorts,
    api: Scope,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(HttpState::from(ports)))
        .app_data(json_config())
        .wrap(test_session_middleware())
        .route("/test/sign-in", web::post().to(sign_in))
        .service(api)
}

/// Session cookie for [`REQUESTER`].
pub async fn signed_in<S>(app: &S) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let response =
        test::call_service(app, test::TestRequest::post().uri("/test/sign-in").to_request())
            .await;
    assert!(response.status().is_success(), "test sign-in failed");
    response
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie")
        .into_owned()
}
