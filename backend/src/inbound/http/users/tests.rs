//! Tests for identity management and login handlers.

use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use rstest::rstest;
use serde_json::{Value, json};

use crate::inbound::http::test_utils::{
    ADMIN_PASSWORD, ADMIN_USERNAME, bearer, init_app, login, seeded_harness,
};
use crate::test_support::student_payload;

#[derive(Debug)]
struct ValidationExpectation<'a> {
    message: &'a str,
    field: &'a str,
    code: &'a str,
}

#[rstest]
#[case(
    "   ",
    "password",
    ValidationExpectation {
        message: "username must not be empty",
        field: "username",
        code: "empty_username",
    }
)]
#[case(
    "registrar",
    "",
    ValidationExpectation {
        message: "password must not be empty",
        field: "password",
        code: "empty_password",
    }
)]
#[actix_web::test]
async fn login_rejects_blank_fields(
    #[case] username: &str,
    #[case] password: &str,
    #[case] expected: ValidationExpectation<'_>,
) {
    let harness = seeded_harness().await;
    let app = init_app(&harness).await;
    let req = actix_test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "username": username, "password": password }))
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["code"], "invalid_request");
    assert_eq!(body["message"], expected.message);
    assert_eq!(body["details"]["field"], expected.field);
    assert_eq!(body["details"]["code"], expected.code);
}

#[actix_web::test]
async fn login_returns_token_and_identity_without_secrets() {
    let harness = seeded_harness().await;
    let app = init_app(&harness).await;
    let req = actix_test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "username": " Registrar ", "password": ADMIN_PASSWORD }))
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert!(body["token"].as_str().is_some_and(|token| !token.is_empty()));
    assert!(body["expiresAt"].is_string());
    assert_eq!(body["identity"]["username"], ADMIN_USERNAME);
    assert_eq!(body["identity"]["role"], "admin");
    assert!(body["identity"].get("passwordHash").is_none());
}

#[actix_web::test]
async fn wrong_password_is_unauthorised() {
    let harness = seeded_harness().await;
    let app = init_app(&harness).await;
    let req = actix_test::TestRequest::post()
        .uri("/api/v1/auth/login")
        .set_json(json!({ "username": ADMIN_USERNAME, "password": "not-the-password" }))
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert!(res.headers().contains_key("trace-id"));
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["code"], "unauthorized");
}

#[actix_web::test]
async fn listing_requires_a_bearer_token() {
    let harness = seeded_harness().await;
    let app = init_app(&harness).await;
    let req = actix_test::TestRequest::get().uri("/api/v1/users").to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn admin_lists_and_filters_identities() {
    let harness = seeded_harness().await;
    let app = init_app(&harness).await;
    let token = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    let create = actix_test::TestRequest::post()
        .uri("/api/v1/students")
        .insert_header(bearer(&token))
        .set_json(student_payload("ada", "CS23001", "student-pass-1"))
        .to_request();
    assert_eq!(
        actix_test::call_service(&app, create).await.status(),
        StatusCode::CREATED
    );

    let req = actix_test::TestRequest::get()
        .uri("/api/v1/users?role=student&sort=username")
        .insert_header(bearer(&token))
        .to_request();
    let body: Value = actix_test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["username"], "ada");
    assert_eq!(body["items"][0]["profile"]["kind"], "student");
    assert_eq!(body["limit"], 20);
}

#[actix_web::test]
async fn students_cannot_list_identities() {
    let harness = seeded_harness().await;
    let app = init_app(&harness).await;
    let admin = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let create = actix_test::TestRequest::post()
        .uri("/api/v1/students")
        .insert_header(bearer(&admin))
        .set_json(student_payload("grace", "CS23002", "student-pass-2"))
        .to_request();
    actix_test::call_service(&app, create).await;

    let token = login(&app, "grace", "student-pass-2").await;
    let req = actix_test::TestRequest::get()
        .uri("/api/v1/users")
        .insert_header(bearer(&token))
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[rstest]
#[case("/api/v1/users?role=janitor", "role")]
#[case("/api/v1/users?sort=passwordHash", "sort")]
#[actix_web::test]
async fn invalid_list_queries_name_the_field(#[case] uri: &str, #[case] field: &str) {
    let harness = seeded_harness().await;
    let app = init_app(&harness).await;
    let token = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let req = actix_test::TestRequest::get()
        .uri(uri)
        .insert_header(bearer(&token))
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["details"]["field"], field);
}

#[actix_web::test]
async fn admins_create_admins_and_duplicates_are_rejected() {
    let harness = seeded_harness().await;
    let app = init_app(&harness).await;
    let token = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let payload = json!({
        "username": "deputy",
        "email": "deputy@registrar.test",
        "password": "deputy-password"
    });

    let first = actix_test::TestRequest::post()
        .uri("/api/v1/users")
        .insert_header(bearer(&token))
        .set_json(&payload)
        .to_request();
    let res = actix_test::call_service(&app, first).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: Value = actix_test::read_body_json(res).await;
    assert_eq!(created["role"], "admin");

    let second = actix_test::TestRequest::post()
        .uri("/api/v1/users")
        .insert_header(bearer(&token))
        .set_json(&payload)
        .to_request();
    let res = actix_test::call_service(&app, second).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["code"], "duplicate");
    assert_eq!(body["details"]["field"], "username");
}

#[actix_web::test]
async fn deactivated_identities_lose_access() {
    let harness = seeded_harness().await;
    let app = init_app(&harness).await;
    let admin = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let create = actix_test::TestRequest::post()
        .uri("/api/v1/users")
        .insert_header(bearer(&admin))
        .set_json(json!({
            "username": "deputy",
            "email": "deputy@registrar.test",
            "password": "deputy-password"
        }))
        .to_request();
    let created: Value = actix_test::call_and_read_body_json(&app, create).await;
    let id = created["id"].as_str().expect("id").to_owned();
    let deputy = login(&app, "deputy", "deputy-password").await;

    let deactivate = actix_test::TestRequest::put()
        .uri(&format!("/api/v1/users/{id}"))
        .insert_header(bearer(&admin))
        .set_json(json!({ "active": false }))
        .to_request();
    let updated: Value = actix_test::call_and_read_body_json(&app, deactivate).await;
    assert_eq!(updated["active"], false);

    let me = actix_test::TestRequest::get()
        .uri("/api/v1/auth/me")
        .insert_header(bearer(&deputy))
        .to_request();
    let res = actix_test::call_service(&app, me).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn malformed_ids_use_the_error_envelope() {
    let harness = seeded_harness().await;
    let app = init_app(&harness).await;
    let token = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let req = actix_test::TestRequest::get()
        .uri("/api/v1/users/not-a-uuid")
        .insert_header(bearer(&token))
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = actix_test::read_body_json(res).await;
    assert_eq!(body["details"]["code"], "invalid_uuid");
}

#[actix_web::test]
async fn deleting_a_linked_identity_is_refused() {
    let harness = seeded_harness().await;
    let app = init_app(&harness).await;
    let token = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let create = actix_test::TestRequest::post()
        .uri("/api/v1/students")
        .insert_header(bearer(&token))
        .set_json(student_payload("linus", "CS23003", "student-pass-3"))
        .to_request();
    let student: Value = actix_test::call_and_read_body_json(&app, create).await;
    let identity = student["identityId"].as_str().expect("identity id");

    let req = actix_test::TestRequest::delete()
        .uri(&format!("/api/v1/users/{identity}"))
        .insert_header(bearer(&token))
        .to_request();
    let res = actix_test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}
