//! Regression coverage for the in-memory store.

use pagination::{PageRequest, Sort};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::course::fixtures as course_fixtures;
use crate::domain::faculty::fixtures as faculty_fixtures;
use crate::domain::ports::{
    CourseQuery, CourseRepository, CourseWrite, FacultyRepository, IdentityRepository,
    StudentQuery, StudentRepository, StudentSortField,
};
use crate::domain::student::fixtures as student_fixtures;
use crate::domain::{
    Attendance, EmailAddress, Grade, NewIdentity, PasswordHash, Role, RosterEntry, Username,
};
use crate::test_support::fixture_timestamp;

#[fixture]
fn store() -> MemoryStore {
    MemoryStore::new()
}

fn admin(username: &str, email: &str) -> Identity {
    Identity::new(
        NewIdentity {
            username: Username::parse(username).expect("username"),
            email: EmailAddress::parse(email).expect("email"),
            role: Role::Admin,
            profile: None,
        },
        PasswordHash::new("hash"),
        fixture_timestamp(),
    )
    .expect("identity")
}

fn student(roll: &str, email: &str) -> Student {
    Student::from_draft(
        StudentId::generate(),
        IdentityId::generate(),
        student_fixtures::draft(roll, email),
        fixture_timestamp(),
    )
}

fn course(code: &str, capacity: u32) -> Course {
    Course::from_draft(
        CourseId::generate(),
        course_fixtures::draft(code, capacity),
        fixture_timestamp(),
    )
}

#[rstest]
#[case("ada", "other@example.edu", "username")]
#[case("grace", "ada@example.edu", "email")]
#[tokio::test]
async fn identity_uniqueness_is_enforced(
    store: MemoryStore,
    #[case] username: &str,
    #[case] email: &str,
    #[case] field: &str,
) {
    IdentityRepository::insert(&store, &admin("ada", "ada@example.edu"))
        .await
        .expect("first insert");
    let err = IdentityRepository::insert(&store, &admin(username, email))
        .await
        .expect_err("duplicate");
    assert_eq!(err, RepositoryError::duplicate(field));
}

#[rstest]
#[tokio::test]
async fn identity_lookup_normalises_input(store: MemoryStore) {
    IdentityRepository::insert(&store, &admin("ada", "ada@example.edu"))
        .await
        .expect("insert");
    let found = store.find_by_username(" ADA ").await.expect("lookup");
    assert!(found.is_some());
    let found = store.find_by_email("Ada@Example.edu").await.expect("lookup");
    assert!(found.is_some());
}

#[rstest]
#[tokio::test]
async fn student_listing_filters_sorts_and_pages(store: MemoryStore) {
    for (roll, email, semester) in [
        ("CS003", "c@example.edu", 3),
        ("CS001", "a@example.edu", 3),
        ("CS002", "b@example.edu", 5),
    ] {
        let mut record = student(roll, email);
        record.academic.semester = semester;
        StudentRepository::insert(&store, &record).await.expect("insert");
    }

    let query = StudentQuery {
        semester: Some(3),
        sort: Sort::desc(StudentSortField::RollNumber),
        page: PageRequest::new(0, 1).expect("page"),
        ..StudentQuery::default()
    };
    let page = StudentRepository::list(&store, &query).await.expect("list");
    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].roll_number.as_str(), "CS003");
}

#[rstest]
#[tokio::test]
async fn student_search_is_case_insensitive(store: MemoryStore) {
    StudentRepository::insert(&store, &student("EE010", "volta@example.edu"))
        .await
        .expect("insert");
    let query = StudentQuery {
        search: Some("VOLTA".to_owned()),
        ..StudentQuery::default()
    };
    let page = StudentRepository::list(&store, &query).await.expect("list");
    assert_eq!(page.total, 1);
}

#[rstest]
#[tokio::test]
async fn strict_save_rejects_stale_revision(store: MemoryStore) {
    let original = course("CS101", 2);
    CourseRepository::insert(&store, &original).await.expect("insert");

    let saved = store.save(&original, Some(0)).await.expect("first save");
    assert_eq!(saved.revision, 1);

    let err = store.save(&original, Some(0)).await.expect_err("stale");
    assert_eq!(err, RepositoryError::revision_mismatch(0_u32, 1_u32));

    let saved = store.save(&original, None).await.expect("unconditional save");
    assert_eq!(saved.revision, 2);
}

fn fresh_entry(student: StudentId) -> RosterEntry {
    RosterEntry {
        student_id: student,
        enrolled_at: fixture_timestamp(),
        grade: Grade::default(),
        attendance: Attendance::default(),
    }
}

fn unguarded(course: CourseId) -> CourseWrite {
    CourseWrite {
        course,
        expected_revision: None,
        at: fixture_timestamp(),
    }
}

#[rstest]
#[tokio::test]
async fn catalogue_save_keeps_the_stored_roster(store: MemoryStore) {
    let original = course("CS101", 5);
    CourseRepository::insert(&store, &original).await.expect("insert");
    let learner = StudentId::generate();
    assert!(
        store
            .add_roster_entry(unguarded(original.id), &fresh_entry(learner))
            .await
            .expect("add")
    );

    let mut renamed = original.clone();
    renamed.name = "Renamed".to_owned();
    let saved = store.save(&renamed, None).await.expect("save");
    assert_eq!(saved.name, "Renamed");
    assert!(saved.is_enrolled(learner));
    assert_eq!(saved.revision, 2);
}

#[rstest]
#[tokio::test]
async fn single_entry_writes_report_no_ops_without_bumping(store: MemoryStore) {
    let target = course("CS101", 5);
    CourseRepository::insert(&store, &target).await.expect("insert");
    let learner = StudentId::generate();
    let write = unguarded(target.id);

    assert!(store.add_roster_entry(write, &fresh_entry(learner)).await.expect("add"));
    assert!(!store.add_roster_entry(write, &fresh_entry(learner)).await.expect("again"));
    let graded = store
        .set_grade(write, learner, Grade::BPlus)
        .await
        .expect("grade")
        .expect("on roster");
    assert_eq!(graded.grade, Grade::BPlus);
    let tally = store
        .record_attendance(write, learner, true)
        .await
        .expect("attendance")
        .expect("on roster");
    assert_eq!((tally.attendance.present, tally.attendance.total), (1, 1));
    assert!(
        store
            .set_grade(write, StudentId::generate(), Grade::A)
            .await
            .expect("grade")
            .is_none()
    );

    let stored = CourseRepository::find_by_id(&store, &target.id)
        .await
        .expect("find")
        .expect("present");
    assert_eq!(stored.revision, 3);

    let err = store
        .add_roster_entry(unguarded(CourseId::generate()), &fresh_entry(learner))
        .await
        .expect_err("missing course");
    assert_eq!(err, RepositoryError::missing("course"));
}

#[rstest]
#[tokio::test]
async fn guarded_writes_reject_a_moved_revision(store: MemoryStore) {
    let target = course("CS101", 5);
    CourseRepository::insert(&store, &target).await.expect("insert");
    let stale = CourseWrite {
        expected_revision: Some(0),
        ..unguarded(target.id)
    };
    assert!(store.add_faculty(stale, FacultyId::generate()).await.expect("first"));

    let err = store
        .add_roster_entry(stale, &fresh_entry(StudentId::generate()))
        .await
        .expect_err("stale");
    assert_eq!(err, RepositoryError::revision_mismatch(0_u32, 1_u32));
    let err = CourseRepository::delete(&store, &target.id, Some(0))
        .await
        .expect_err("stale delete");
    assert_eq!(err, RepositoryError::revision_mismatch(0_u32, 1_u32));
    assert!(CourseRepository::delete(&store, &target.id, Some(1))
            .await
            .expect("delete"));
    assert!(!CourseRepository::delete(&store, &target.id, None)
            .await
            .expect("gone"));
}

#[rstest]
#[tokio::test]
async fn course_code_is_unique(store: MemoryStore) {
    CourseRepository::insert(&store, &course("CS101", 2))
        .await
        .expect("insert");
    let err = CourseRepository::insert(&store, &course("cs101", 2))
        .await
        .expect_err("duplicate");
    assert_eq!(err, RepositoryError::duplicate("code"));
}

#[rstest]
#[tokio::test]
async fn reference_cleanup_touches_only_affected_records(store: MemoryStore) {
    let member = Faculty::from_draft(
        FacultyId::generate(),
        IdentityId::generate(),
        faculty_fixtures::draft("EMP1", "turing@example.edu"),
        fixture_timestamp(),
    );
    let learner = StudentId::generate();
    let mut taught = course("CS201", 5);
    taught.faculty.push(member.id);
    taught.roster.push(fresh_entry(learner));
    CourseRepository::insert(&store, &taught).await.expect("insert");
    CourseRepository::insert(&store, &course("CS202", 5))
        .await
        .expect("insert");

    assert_eq!(store.remove_faculty_everywhere(&member.id).await.expect("purge"), 1);
    assert_eq!(store.remove_student_everywhere(&learner).await.expect("purge"), 1);
    let reloaded = CourseRepository::find_by_id(&store, &taught.id)
        .await
        .expect("find")
        .expect("present");
    assert!(reloaded.faculty.is_empty());
    assert!(reloaded.roster.is_empty());
    assert!(store.list_by_student(&learner).await.expect("list").is_empty());

    let query = CourseQuery {
        faculty: Some(member.id),
        ..CourseQuery::default()
    };
    assert_eq!(CourseRepository::list(&store, &query).await.expect("list").total, 0);
}

#[rstest]
#[tokio::test]
async fn faculty_course_cleanup_counts_changed_profiles(store: MemoryStore) {
    let course_id = CourseId::generate();
    let mut member = Faculty::from_draft(
        FacultyId::generate(),
        IdentityId::generate(),
        faculty_fixtures::draft("EMP2", "hopper@example.edu"),
        fixture_timestamp(),
    );
    member.add_course(course_id);
    FacultyRepository::insert(&store, &member).await.expect("insert");

    assert_eq!(store.remove_course_everywhere(&course_id).await.expect("purge"), 1);
    assert_eq!(store.remove_course_everywhere(&course_id).await.expect("purge"), 0);
}
