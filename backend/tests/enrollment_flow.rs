//! End-to-end enrollment scenarios over the in-memory adapters.

#[path = "support/registrar_http.rs"]
mod registrar_http;

use actix_web::http::{Method, StatusCode};
use registrar::domain::CapacityMode;
use registrar::test_support::{course_payload, faculty_payload, student_payload};
use registrar_http::{
    ADMIN_PASSWORD, ADMIN_USERNAME, create, init_app, login, seeded_harness, send, try_login,
};
use rstest::rstest;
use serde_json::json;

#[rstest]
#[actix_web::test]
async fn course_fills_up_and_results_reach_the_student() {
    let harness = seeded_harness(CapacityMode::BestEffort).await;
    let app = init_app(&harness).await;
    let admin = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    let course = create(&app, "/api/v1/courses", &admin, course_payload("CS301", 1)).await;
    let ada = create(
        &app,
        "/api/v1/students",
        &admin,
        student_payload("ada", "CS23001", "student-pass-1"),
    )
    .await;
    create(
        &app,
        "/api/v1/students",
        &admin,
        student_payload("grace", "CS23002", "student-pass-2"),
    )
    .await;
    let turing = create(
        &app,
        "/api/v1/faculty",
        &admin,
        faculty_payload("turing", "EMP001", "faculty-pass-1"),
    )
    .await;

    let ada_token = login(&app, "ada", "student-pass-1").await;
    let (status, entry) = send(
        &app,
        Method::POST,
        &format!("/api/v1/courses/{course}/enroll"),
        Some(&ada_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(entry["studentId"], ada.as_str());
    assert_eq!(entry["grade"], "I");

    let grace_token = login(&app, "grace", "student-pass-2").await;
    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/courses/{course}/enroll"),
        Some(&grace_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "course_full");
    assert_eq!(body["details"]["capacity"], 1);

    // Unassigned faculty cannot grade.
    let turing_token = login(&app, "turing", "faculty-pass-1").await;
    let grade_uri = format!("/api/v1/courses/{course}/grade/{ada}");
    let (status, _) = send(
        &app,
        Method::PUT,
        &grade_uri,
        Some(&turing_token),
        Some(json!({ "grade": "A" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, staffed) = send(
        &app,
        Method::POST,
        &format!("/api/v1/courses/{course}/faculty/{turing}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(staffed["facultyIds"][0], turing.as_str());

    let (status, graded) = send(
        &app,
        Method::PUT,
        &grade_uri,
        Some(&turing_token),
        Some(json!({ "grade": "A" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(graded["grade"], "A");

    let (status, body) = send(
        &app,
        Method::PUT,
        &grade_uri,
        Some(&turing_token),
        Some(json!({ "grade": "E" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_grade");

    let attendance_uri = format!("/api/v1/courses/{course}/attendance/{ada}");
    for present in [true, false] {
        let (status, _) = send(
            &app,
            Method::PUT,
            &attendance_uri,
            Some(&turing_token),
            Some(json!({ "present": present })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, courses) = send(
        &app,
        Method::GET,
        &format!("/api/v1/students/{ada}/courses"),
        Some(&ada_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let first = &courses[0];
    assert_eq!(first["code"], "CS301");
    assert_eq!(first["grade"], "A");
    assert_eq!(first["attendance"]["present"], 1);
    assert_eq!(first["attendance"]["total"], 2);
    assert_eq!(first["attendancePercentage"], 50.0);
}

#[rstest]
#[actix_web::test]
async fn courses_with_enrollments_cannot_be_deleted() {
    let harness = seeded_harness(CapacityMode::BestEffort).await;
    let app = init_app(&harness).await;
    let admin = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let course = create(&app, "/api/v1/courses", &admin, course_payload("CS302", 30)).await;
    let student = create(
        &app,
        "/api/v1/students",
        &admin,
        student_payload("linus", "CS23003", "student-pass-3"),
    )
    .await;
    let roster_uri = format!("/api/v1/students/{student}/courses/{course}");

    let (status, _) = send(&app, Method::POST, &roster_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = send(&app, Method::POST, &roster_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "already_enrolled");

    let course_uri = format!("/api/v1/courses/{course}");
    let (status, body) = send(&app, Method::DELETE, &course_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "has_enrollments");
    assert_eq!(body["details"]["enrolled"], 1);

    let (status, _) = send(&app, Method::DELETE, &roster_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::DELETE, &course_uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, Method::GET, &course_uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[rstest]
#[actix_web::test]
async fn public_course_view_hides_the_roster() {
    let harness = seeded_harness(CapacityMode::BestEffort).await;
    let app = init_app(&harness).await;
    let admin = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let course = create(&app, "/api/v1/courses", &admin, course_payload("CS303", 10)).await;
    let student = create(
        &app,
        "/api/v1/students",
        &admin,
        student_payload("barbara", "CS23004", "student-pass-4"),
    )
    .await;
    send(
        &app,
        Method::POST,
        &format!("/api/v1/students/{student}/courses/{course}"),
        Some(&admin),
        None,
    )
    .await;

    let uri = format!("/api/v1/courses/{course}");
    let (status, public) = send(&app, Method::GET, &uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(public["enrolledCount"], 1);
    assert_eq!(public["availableSeats"], 9);
    assert!(public.get("students").is_none());

    let (_, staff) = send(&app, Method::GET, &uri, Some(&admin), None).await;
    assert_eq!(staff["students"][0]["rollNumber"], "CS23004");
}

#[rstest]
#[actix_web::test]
async fn deleting_a_student_frees_their_seat() {
    let harness = seeded_harness(CapacityMode::Strict).await;
    let app = init_app(&harness).await;
    let admin = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let course = create(&app, "/api/v1/courses", &admin, course_payload("CS304", 1)).await;
    let student = create(
        &app,
        "/api/v1/students",
        &admin,
        student_payload("edsger", "CS23005", "student-pass-5"),
    )
    .await;
    send(
        &app,
        Method::POST,
        &format!("/api/v1/students/{student}/courses/{course}"),
        Some(&admin),
        None,
    )
    .await;

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/students/{student}"),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, course_body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/courses/{course}"),
        None,
        None,
    )
    .await;
    assert_eq!(course_body["enrolledCount"], 0);
    let (status, _) = try_login(&app, "edsger", "student-pass-5").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
