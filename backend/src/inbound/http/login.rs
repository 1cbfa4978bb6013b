//! Session login.
//!
//! ```text
//! POST /api/v1/login {"email":"faisal@example.com","password":"..."}
//! ```

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::domain::{Error, LoginCredentials, LoginValidationError};
use crate::inbound::http::ApiResult;
use crate::inbound::http::schemas::ErrorSchema;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Login request body.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "faisal@example.com")]
    pub email: String,
    pub password: String,
}

impl TryFrom<&LoginRequest> for LoginCredentials {
    type Error = LoginValidationError;

    fn try_from(value: &LoginRequest) -> Result<Self, Self::Error> {
        Self::try_from_parts(&value.email, &value.password)
    }
}

fn validation_error(err: LoginValidationError) -> Error {
    Error::invalid_request(err.to_string())
        .with_details(json!({ "field": err.field(), "code": err.code() }))
}

/// Authenticate and bind the session cookie to the user.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 204, description = "Logged in", headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Invalid credentials", body = ErrorSchema),
        (status = 503, description = "Directory unavailable", body = ErrorSchema)
    ),
    tags = ["session"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let credentials =
        LoginCredentials::try_from(&payload.into_inner()).map_err(validation_error)?;
    let user_id = state.login.authenticate(&credentials).await?;
    session.persist_user(&user_id)?;
    info!(user_id = %user_id, "user logged in");
    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::inbound::http::test_utils::{MockPorts, requester, test_app};
    use actix_web::http::StatusCode;
    use actix_web::test as actix_test;
    use rstest::rstest;
    use serde_json::Value;

    fn api() -> actix_web::Scope {
        web::scope("/api/v1").service(login)
    }

    fn login_request(email: &str, password: &str) -> actix_http::Request {
        actix_test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(LoginRequest {
                email: email.to_owned(),
                password: password.to_owned(),
            })
            .to_request()
    }

    #[rstest]
    #[actix_web::test]
    async fn successful_login_sets_the_session_cookie() {
        let mut ports = MockPorts::default();
        ports
            .login
            .expect_authenticate()
            .withf(|creds| creds.email() == "faisal@example.com")
            .times(1)
            .return_once(|_| Ok(requester()));
        let app = actix_test::init_service(test_app(ports, api())).await;

        let response =
            actix_test::call_service(&app, login_request(" Faisal@Example.com ", "pw")).await;

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(
            response
                .response()
                .cookies()
                .any(|cookie| cookie.name() == "session")
        );
    }

    #[rstest]
    #[case("", "pw", "email", "empty_email")]
    #[case("faisal", "pw", "email", "malformed_email")]
    #[case("faisal@example.com", "", "password", "empty_password")]
    #[actix_web::test]
    async fn unusable_fields_are_rejected_before_lookup(
        #[case] email: &str,
        #[case] password: &str,
        #[case] field: &str,
        #[case] code: &str,
    ) {
        let app = actix_test::init_service(test_app(MockPorts::default(), api())).await;

        let response = actix_test::call_service(&app, login_request(email, password)).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = actix_test::read_body_json(response).await;
        assert_eq!(body["code"], "invalid_request");
        assert_eq!(body["details"]["field"], field);
        assert_eq!(body["details"]["code"], code);
    }

    #[rstest]
    #[actix_web::test]
    async fn refused_credentials_are_unauthorised() {
        let mut ports = MockPorts::default();
        ports
            .login
            .expect_authenticate()
            .return_once(|_| Err(Error::unauthorized("invalid credentials")));
        let app = actix_test::init_service(test_app(ports, api())).await;

        let response =
            actix_test::call_service(&app, login_request("faisal@example.com", "nope")).await;

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body: Error = actix_test::read_body_json(response).await;
        assert_eq!(body.code(), ErrorCode::Unauthorized);
    }
}
