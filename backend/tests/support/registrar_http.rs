//! Shared HTTP helpers for registrar integration tests.

use actix_http::Request;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::{Method, StatusCode};
use actix_web::{test as actix_test, web};
use registrar::domain::CapacityMode;
use registrar::inbound::http::build_app;
use registrar::inbound::http::health::HealthState;
use registrar::test_support::Harness;
use serde_json::{Value, json};

pub(crate) const ADMIN_USERNAME: &str = "registrar";
pub(crate) const ADMIN_PASSWORD: &str = "correct-horse-battery";

pub(crate) async fn seeded_harness(mode: CapacityMode) -> Harness {
    let harness = Harness::new(mode).expect("harness");
    harness
        .seed_admin(ADMIN_USERNAME, ADMIN_PASSWORD)
        .await
        .expect("seed admin");
    harness
}

pub(crate) async fn init_app(
    harness: &Harness,
) -> impl Service<Request, Response = ServiceResponse, Error = actix_web::Error> {
    let health = HealthState::new();
    health.mark_ready();
    actix_test::init_service(build_app(
        web::Data::new(harness.state.clone()),
        web::Data::new(health),
    ))
    .await
}

/// Send a JSON request and return the status with the parsed body.
///
/// Empty bodies come back as `Value::Null`.
pub(crate) async fn send<S>(
    app: &S,
    method: Method,
    uri: &str,
    token: Option<&str>,
    payload: Option<Value>,
) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let mut req = actix_test::TestRequest::default().method(method).uri(uri);
    if let Some(token) = token {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    if let Some(payload) = payload {
        req = req.set_json(payload);
    }
    let res = actix_test::call_service(app, req.to_request()).await;
    let status = res.status();
    let bytes = actix_test::read_body(res).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("JSON body")
    };
    (status, body)
}

pub(crate) async fn try_login<S>(app: &S, username: &str, password: &str) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    send(
        app,
        Method::POST,
        "/api/v1/auth/login",
        None,
        Some(json!({ "username": username, "password": password })),
    )
    .await
}

pub(crate) async fn login<S>(app: &S, username: &str, password: &str) -> String
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let (status, body) = try_login(app, username, password).await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");
    body["token"].as_str().expect("token").to_owned()
}

/// POST `payload` and return the `id` of the created resource.
pub(crate) async fn create<S>(app: &S, uri: &str, token: &str, payload: Value) -> String
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let (status, body) = send(app, Method::POST, uri, Some(token), Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED, "create {uri} failed: {body}");
    body["id"].as_str().expect("id").to_owned()
}
