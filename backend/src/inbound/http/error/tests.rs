//! Tests for HTTP error rendering.

use super::*;
use actix_web::body::to_bytes;
use actix_web::{App, test as actix_test};
use rstest::{fixture, rstest};
use serde::Deserialize;
use serde_json::json;

const TRACE_ID: &str = "7d1c5f0a-2b3e-4c8d-9f6a-1e2d3c4b5a69";

#[fixture]
fn trace_id() -> String {
    TRACE_ID.to_owned()
}

async fn render(error: &Error) -> (StatusCode, Option<String>, Error) {
    let response = ResponseError::error_response(error);
    let status = response.status();
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let bytes = to_bytes(response.into_body()).await.expect("body");
    let body = serde_json::from_slice(&bytes).expect("error JSON");
    (status, header, body)
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("who"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("self approval"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("advance"), StatusCode::NOT_FOUND)]
#[case(Error::conflict("advance is closed"), StatusCode::CONFLICT)]
#[case(Error::service_unavailable("db down"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn codes_map_to_statuses(#[case] error: Error, #[case] expected: StatusCode) {
    assert_eq!(ResponseError::status_code(&error), expected);
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted_but_keep_the_trace_id(trace_id: String) {
    let error = Error::internal("decimal overflow in advances row")
        .with_trace_id(trace_id.clone())
        .with_details(json!({"row": 7}));

    let (status, header, body) = render(&error).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(header.as_deref(), Some(TRACE_ID));
    assert_eq!(body.message(), "Internal server error");
    assert_eq!(body.trace_id(), Some(trace_id.as_str()));
    assert!(body.details().is_none());
}

#[rstest]
#[actix_web::test]
async fn conflicts_reach_the_client_unchanged() {
    let error = Error::conflict("project has open advances")
        .with_details(json!({"openAdvances": 2}));

    let (status, header, body) = render(&error).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(header.is_none());
    assert_eq!(body, error);
}

#[rstest]
fn actix_errors_become_internal_errors() {
    let err = Error::from(actix_web::error::ErrorBadRequest("boom"));
    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(err.message(), "Internal server error");
}

#[derive(Deserialize)]
struct Probe {
    #[expect(dead_code, reason = "only deserialised")]
    amount: u32,
}

#[actix_web::post("/probe")]
async fn probe(_body: web::Json<Probe>) -> HttpResponse {
    HttpResponse::NoContent().finish()
}

#[rstest]
#[actix_web::test]
async fn malformed_json_uses_the_error_envelope() {
    let app =
        actix_test::init_service(App::new().app_data(json_config()).service(probe)).await;
    let request = actix_test::TestRequest::post()
        .uri("/probe")
        .insert_header(("content-type", "application/json"))
        .set_payload("{\"amount\": \"lots\"}")
        .to_request();

    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Error = actix_test::read_body_json(response).await;
    assert_eq!(body.code(), ErrorCode::InvalidRequest);
    assert!(body.message().starts_with("malformed JSON body"));
}
