//! Roster and faculty-list invariants for the course aggregate.

use chrono::{TimeZone, Utc};
use rstest::{fixture, rstest};

use super::*;

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 1, 8, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn course_with_capacity(capacity: u32) -> Course {
    Course::from_draft(CourseId::generate(), fixtures::draft("cs101", capacity), now())
}

#[fixture]
fn course() -> Course {
    course_with_capacity(30)
}

fn roster_ids(course: &Course) -> Vec<StudentId> {
    course.roster.iter().map(|entry| entry.student_id).collect()
}

#[rstest]
fn enroll_appends_incomplete_entry(mut course: Course) {
    let student = StudentId::generate();
    course.enroll(student, now()).expect("enroll succeeds");

    let entry = course.entry(student).expect("entry present");
    assert_eq!(entry.grade, Grade::Incomplete);
    assert_eq!(entry.attendance, Attendance::default());
    assert_eq!(entry.enrolled_at, now());
    assert_eq!(course.available_seats(), 29);
}

#[rstest]
fn admit_checks_without_touching_the_roster() {
    let mut course = course_with_capacity(1);
    let student = StudentId::generate();
    let entry = course.admit(student, now()).expect("seat free");
    assert_eq!(entry.student_id, student);
    assert!(course.roster.is_empty());

    course.enroll(student, now()).expect("enroll");
    let err = course
        .admit(StudentId::generate(), now())
        .expect_err("no seats left");
    assert_eq!(err, CourseError::CourseFull { capacity: 1 });
}

#[rstest]
fn double_enroll_is_rejected_without_mutation(mut course: Course) {
    let student = StudentId::generate();
    course.enroll(student, now()).expect("first enroll");
    let before = course.roster.clone();

    let err = course.enroll(student, now()).expect_err("second enroll fails");
    assert_eq!(err, CourseError::AlreadyEnrolled);
    assert_eq!(course.roster, before);
}

#[rstest]
fn unenroll_of_non_member_is_rejected(mut course: Course) {
    course.enroll(StudentId::generate(), now()).expect("enroll");
    let before = course.roster.clone();

    let err = course
        .unenroll(StudentId::generate(), now())
        .expect_err("not enrolled");
    assert_eq!(err, CourseError::NotEnrolled);
    assert_eq!(course.roster, before);
}

#[rstest]
fn capacity_scenario_reopens_seat_after_unenroll() {
    let mut course = course_with_capacity(2);
    let (a, b, c) = (
        StudentId::generate(),
        StudentId::generate(),
        StudentId::generate(),
    );
    course.enroll(a, now()).expect("A enrolls");
    course.enroll(b, now()).expect("B enrolls");
    assert_eq!(
        course.enroll(c, now()),
        Err(CourseError::CourseFull { capacity: 2 })
    );
    course.unenroll(a, now()).expect("A leaves");
    course.enroll(c, now()).expect("C enrolls");

    assert_eq!(roster_ids(&course), vec![b, c]);
    assert!(course.is_full());
}

#[rstest]
fn full_course_reports_full_before_duplicate() {
    let mut course = course_with_capacity(1);
    let student = StudentId::generate();
    course.enroll(student, now()).expect("enroll");
    assert_eq!(
        course.enroll(student, now()),
        Err(CourseError::CourseFull { capacity: 1 })
    );
}

#[rstest]
fn roster_never_exceeds_capacity_across_sequences() {
    let mut course = course_with_capacity(3);
    let students: Vec<StudentId> = (0..6).map(|_| StudentId::generate()).collect();
    for (round, student) in students.iter().enumerate() {
        let _ = course.enroll(*student, now());
        if round % 2 == 1 {
            let _ = course.unenroll(students[round - 1], now());
        }
        assert!(course.roster.len() <= course.capacity as usize);
    }
}

#[rstest]
fn re_enrollment_resets_grade(mut course: Course) {
    let student = StudentId::generate();
    course.enroll(student, now()).expect("enroll");
    course.assign_grade(student, "A", now()).expect("grade");
    course.unenroll(student, now()).expect("unenroll");
    course.enroll(student, now()).expect("re-enroll");

    assert_eq!(course.entry(student).map(|e| e.grade), Some(Grade::Incomplete));
}

#[rstest]
#[case("E")]
#[case("A-")]
#[case("pass")]
fn invalid_grade_leaves_existing_grade(mut course: Course, #[case] literal: &str) {
    let student = StudentId::generate();
    course.enroll(student, now()).expect("enroll");
    course.assign_grade(student, "B+", now()).expect("grade");

    let err = course
        .assign_grade(student, literal, now())
        .expect_err("invalid literal");
    assert!(matches!(err, CourseError::InvalidGrade(_)));
    assert_eq!(course.entry(student).map(|e| e.grade), Some(Grade::BPlus));
    assert_eq!(Error::from(err).code(), ErrorCode::InvalidGrade);
}

#[rstest]
fn grading_a_non_member_is_not_found(mut course: Course) {
    let err = course
        .assign_grade(StudentId::generate(), "A", now())
        .expect_err("not on roster");
    assert_eq!(err, CourseError::NotInRoster);
    assert_eq!(Error::from(err).code(), ErrorCode::NotFound);
}

#[rstest]
fn attendance_counts_sessions(mut course: Course) {
    let student = StudentId::generate();
    course.enroll(student, now()).expect("enroll");
    course.record_attendance(student, true, now()).expect("present");
    course.record_attendance(student, true, now()).expect("present");
    let tally = course
        .record_attendance(student, false, now())
        .expect("absent");

    assert_eq!(tally, Attendance { present: 2, total: 3 });
}

#[rstest]
fn faculty_list_rejects_duplicates_and_missing(mut course: Course) {
    let faculty = FacultyId::generate();
    course.assign_faculty(faculty, now()).expect("assign");
    assert_eq!(
        course.assign_faculty(faculty, now()),
        Err(CourseError::AlreadyAssigned)
    );
    course.remove_faculty(faculty, now()).expect("remove");
    assert_eq!(
        course.remove_faculty(faculty, now()),
        Err(CourseError::NotAssigned)
    );
    assert!(course.faculty.is_empty());
}

#[rstest]
fn deletion_requires_empty_roster(mut course: Course) {
    assert!(course.ensure_deletable().is_ok());
    course.enroll(StudentId::generate(), now()).expect("enroll");
    let err = course.ensure_deletable().expect_err("has enrollments");
    assert_eq!(err, CourseError::HasEnrollments { count: 1 });
    assert_eq!(Error::from(err).code(), ErrorCode::HasEnrollments);
}

#[rstest]
fn shrinking_capacity_below_enrollment_is_accepted(mut course: Course) {
    course.enroll(StudentId::generate(), now()).expect("enroll");
    course.enroll(StudentId::generate(), now()).expect("enroll");
    course
        .apply(
            CourseUpdate {
                capacity: Some(1),
                ..CourseUpdate::default()
            },
            now(),
        )
        .expect("capacity shrink accepted");

    assert_eq!(course.enrolled_count(), 2);
    assert_eq!(course.available_seats(), 0);
    assert!(course.enroll(StudentId::generate(), now()).is_err());
}

#[rstest]
#[case(CourseUpdate { credits: Some(0), ..CourseUpdate::default() })]
#[case(CourseUpdate { credits: Some(7), ..CourseUpdate::default() })]
#[case(CourseUpdate { capacity: Some(0), ..CourseUpdate::default() })]
#[case(CourseUpdate { name: Some(" ".to_owned()), ..CourseUpdate::default() })]
fn invalid_updates_are_rejected(mut course: Course, #[case] update: CourseUpdate) {
    let before = course.clone();
    let err = course.apply(update, now()).expect_err("invalid update");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(course, before);
}

#[rstest]
fn self_prerequisite_is_rejected(mut course: Course) {
    let id = course.id;
    let result = course.apply(
        CourseUpdate {
            prerequisites: Some(vec![id]),
            ..CourseUpdate::default()
        },
        now(),
    );
    assert!(result.is_err());
}

#[rstest]
fn purge_helpers_are_idempotent(mut course: Course) {
    let student = StudentId::generate();
    let faculty = FacultyId::generate();
    course.enroll(student, now()).expect("enroll");
    course.assign_faculty(faculty, now()).expect("assign");

    assert!(course.purge_student(student));
    assert!(!course.purge_student(student));
    assert!(course.purge_faculty(faculty));
    assert!(!course.purge_faculty(faculty));
}
