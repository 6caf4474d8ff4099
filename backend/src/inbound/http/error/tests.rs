//! Tests for HTTP error mapping.

use super::*;
use actix_web::ResponseError;
use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn trace_id() -> String {
    TRACE_ID.to_owned()
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::duplicate("email"), StatusCode::BAD_REQUEST)]
#[case(Error::new(ErrorCode::CourseFull, "full"), StatusCode::BAD_REQUEST)]
#[case(Error::new(ErrorCode::InvalidGrade, "E"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("no auth"), StatusCode::UNAUTHORIZED)]
#[case(Error::account_locked("locked"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("denied"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("missing"), StatusCode::NOT_FOUND)]
#[case(Error::concurrent_modification(1, 2), StatusCode::CONFLICT)]
#[case(Error::dependency_failure("db down"), StatusCode::INTERNAL_SERVER_ERROR)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] error: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&error), status);
}

async fn body_of(error: &Error) -> (StatusCode, Option<String>, Value) {
    let response = ResponseError::error_response(error);
    let status = response.status();
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let bytes = to_bytes(response.into_body()).await.expect("body");
    let value = serde_json::from_slice(&bytes).expect("json");
    (status, header, value)
}

#[rstest]
#[case(Error::internal("connection string leaked"), "internal_error")]
#[case(Error::dependency_failure("smtp relay refused"), "dependency_failure")]
#[actix_rt::test]
async fn collaborator_failures_are_redacted(
    trace_id: String,
    #[case] error: Error,
    #[case] code: &str,
) {
    let error = error
        .with_trace_id(trace_id.clone())
        .with_details(json!({ "secret": "x" }));
    let (status, header, body) = body_of(&error).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(header.as_deref(), Some(TRACE_ID));
    assert_eq!(body["code"], code);
    assert_eq!(body["traceId"], TRACE_ID);
    assert!(!body["message"].as_str().unwrap_or_default().contains("leaked"));
    assert!(!body["message"].as_str().unwrap_or_default().contains("smtp"));
    assert!(body.get("details").is_none());
}

#[rstest]
#[actix_rt::test]
async fn domain_conflicts_keep_their_details(trace_id: String) {
    let error = Error::concurrent_modification(3, 4).with_trace_id(trace_id);
    let (status, _, body) = body_of(&error).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "concurrent_modification");
    assert_eq!(body["details"]["expectedRevision"], 3);
    assert_eq!(body["details"]["actualRevision"], 4);
}

#[rstest]
#[actix_rt::test]
async fn duplicate_names_the_field() {
    let (status, header, body) = body_of(&Error::duplicate("rollNumber")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(header.is_none());
    assert_eq!(body["code"], "duplicate");
    assert_eq!(body["details"]["field"], "rollNumber");
}
