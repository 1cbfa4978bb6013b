//! Server construction and middleware wiring.

mod config;
pub(crate) mod session_key;
mod state_builders;

pub use config::ServerConfig;

use state_builders::{AppStates, build_states};

use actix_session::{
    SessionMiddleware,
    config::{CookieContentSecurity, PersistentSession},
    storage::CookieSessionStore,
};
use actix_web::cookie::{Key, SameSite};
use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use advance_ledger::Trace;
#[cfg(debug_assertions)]
use advance_ledger::doc::ApiDoc;
use advance_ledger::inbound::http::advances::{
    approve_advance, create_advance, preview_settlement, reject_advance, settle_advance,
};
use advance_ledger::inbound::http::error::json_config;
use advance_ledger::inbound::http::expenses::{
    approve_expense, edit_expense, expense_invoice, reject_expense, submit_expense,
    toggle_editability,
};
use advance_ledger::inbound::http::health::{HealthState, live, ready};
use advance_ledger::inbound::http::login::login;
use advance_ledger::inbound::http::notifications::{
    list_notifications, mark_all_read, mark_read,
};
use advance_ledger::inbound::http::projects::{archive_project, create_project, project_archive};
use advance_ledger::inbound::http::receipts::{receipt_payload_config, store_receipt};
use advance_ledger::inbound::http::reports::spend_report;
use advance_ledger::inbound::http::team::{add_user, delete_user};
use advance_ledger::inbound::http::workspace::visible_workspace;
use advance_ledger::inbound::ws;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

const SESSION_TTL_HOURS: i64 = 12;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    states: AppStates,
    key: Key,
    cookie_secure: bool,
    same_site: SameSite,
}

/// Every `/api/v1` endpoint.
fn api_scope() -> actix_web::Scope {
    web::scope("/api/v1")
        .service(login)
        .service(visible_workspace)
        .service(add_user)
        .service(delete_user)
        .service(create_project)
        .service(archive_project)
        .service(project_archive)
        .service(create_advance)
        .service(approve_advance)
        .service(reject_advance)
        .service(preview_settlement)
        .service(settle_advance)
        .service(submit_expense)
        .service(edit_expense)
        .service(approve_expense)
        .service(reject_expense)
        .service(toggle_editability)
        .service(expense_invoice)
        .service(spend_report)
        .service(store_receipt)
        .service(mark_all_read)
        .service(list_notifications)
        .service(mark_read)
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        states,
        key,
        cookie_secure,
        same_site,
    } = deps;

    // The socket upgrade reads the same session, so the middleware wraps the
    // whole app rather than the API scope.
    let session = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name("session".into())
        .cookie_path("/".into())
        .cookie_secure(cookie_secure)
        .cookie_http_only(true)
        .cookie_content_security(CookieContentSecurity::Private)
        .cookie_same_site(same_site)
        .session_lifecycle(
            PersistentSession::default()
                .session_ttl(actix_web::cookie::time::Duration::hours(SESSION_TTL_HOURS)),
        )
        .build();

    let app = App::new()
        .app_data(health_state)
        .app_data(states.http)
        .app_data(states.ws)
        .app_data(json_config())
        .app_data(receipt_payload_config())
        .wrap(session)
        .wrap(Trace)
        .service(api_scope())
        .service(ws::ws_changes)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    app
}

/// Construct an Actix HTTP server from `config`.
///
/// The health state is marked ready once the listener is bound.
///
/// # Errors
/// Propagates [`std::io::Error`] when the receipt directory cannot be
/// prepared or the socket cannot be bound.
pub fn create_server(
    health_state: web::Data<HealthState>,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let states = build_states(&config)?;
    let ServerConfig {
        key,
        cookie_secure,
        same_site,
        bind_addr,
        #[cfg(feature = "metrics")]
        prometheus,
        ..
    } = config;

    let server_health_state = health_state.clone();
    let server = HttpServer::new(move || {
        let app = build_app(AppDependencies {
            health_state: server_health_state.clone(),
            states: states.clone(),
            key: key.clone(),
            cookie_secure,
            same_site,
        });

        #[cfg(feature = "metrics")]
        let app = app.wrap(actix_web::middleware::Condition::from_option(
            prometheus.clone(),
        ));

        app
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use advance_ledger::settings::LedgerSettings;
    use ortho_config::OrthoConfig;
    use rstest::rstest;
    use serde_json::Value;

    fn test_dependencies(receipts: &std::path::Path) -> AppDependencies {
        let ledger = LedgerSettings::load_from_iter([std::ffi::OsString::from("advance-ledger")])
            .expect("ledger settings");
        let mut config = ServerConfig::new(
            Key::generate(),
            false,
            SameSite::Lax,
            "127.0.0.1:0".parse().expect("addr"),
            ledger,
        );
        config.ledger.receipt_dir = Some(receipts.to_path_buf());
        AppDependencies {
            health_state: web::Data::new(HealthState::new()),
            states: build_states(&config).expect("states"),
            key: Key::generate(),
            cookie_secure: false,
            same_site: SameSite::Lax,
        }
    }

    #[rstest]
    #[actix_web::test]
    async fn api_requires_a_session() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = test::init_service(build_app(test_dependencies(dir.path()))).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/v1/workspace").to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert!(res.headers().contains_key("trace-id"));
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["code"], "unauthorized");
    }

    #[rstest]
    #[actix_web::test]
    async fn unknown_login_is_refused() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = test::init_service(build_app(test_dependencies(dir.path()))).await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/login")
                .set_json(serde_json::json!({"email": "ghost@example.com", "password": "x"}))
                .to_request(),
        )
        .await;

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[rstest]
    #[actix_web::test]
    async fn liveness_is_served_outside_the_api() {
        let dir = tempfile::tempdir().expect("tempdir");
        let app = test::init_service(build_app(test_dependencies(dir.path()))).await;

        let res =
            test::call_service(&app, test::TestRequest::get().uri("/health/live").to_request())
                .await;

        assert_eq!(res.status(), StatusCode::OK);
    }
}
