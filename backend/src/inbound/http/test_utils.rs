//! Test helpers for inbound HTTP components.

use actix_http::Request;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test as actix_test, web};
use serde_json::{Value, json};

use crate::domain::CapacityMode;
use crate::inbound::http::build_app;
use crate::inbound::http::health::HealthState;
use crate::test_support::Harness;

pub const ADMIN_USERNAME: &str = "registrar";
pub const ADMIN_PASSWORD: &str = "correct-horse-battery";

/// A harness with one seeded admin.
pub async fn seeded_harness() -> Harness {
    let harness = Harness::new(CapacityMode::BestEffort).expect("harness");
    harness
        .seed_admin(ADMIN_USERNAME, ADMIN_PASSWORD)
        .await
        .expect("seed admin");
    harness
}

/// Initialise the full application over `harness`.
pub async fn init_app(
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

/// Log in and return the bearer token.
pub async fn login<S>(app: &S, username: &str, password: &str) -> String
where
    S: Service<Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    let req = actix_test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "username": username, "password": password }))
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(app, req).await;
    body["token"].as_str().expect("token in login response").to_owned()
}

/// `Authorization` header pair for `token`.
pub fn bearer(token: &str) -> (&'static str, String) {
    ("Authorization", format!("Bearer {token}"))
}
