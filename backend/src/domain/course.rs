//! Course aggregate: catalogue data plus the enrollment roster.
//!
//! The roster embedded in a course is the authoritative enrollment ledger.
//! Every roster and faculty-list mutation goes through a method here so the
//! invariants hold after each call:
//!
//! - a student appears at most once in the roster;
//! - a faculty id appears at most once in the faculty list;
//! - the roster never grows past `capacity` through [`Course::enroll`];
//! - a course with a non-empty roster refuses deletion.
//!
//! Capacity may be lowered below the current enrollment by an update; that
//! is accepted and not reconciled.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{
    CourseId, Error, ErrorCode, FacultyId, Grade, InvalidGrade, Schedule, StudentId, Violations,
};

/// Smallest accepted credit value.
pub const MIN_CREDITS: u8 = 1;
/// Largest accepted credit value.
pub const MAX_CREDITS: u8 = 6;

/// Normalised (trimmed, uppercased) course code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "CS101")]
pub struct CourseCode(String);

impl CourseCode {
    /// Normalise a course code, rejecting blank or whitespace-containing input.
    ///
    /// # Examples
    /// ```
    /// use registrar::domain::CourseCode;
    ///
    /// assert_eq!(CourseCode::parse(" cs101 ").unwrap().as_str(), "CS101");
    /// assert!(CourseCode::parse("cs 101").is_err());
    /// ```
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() || normalized.chars().any(char::is_whitespace) {
            return Err(Error::invalid_request(
                "course code must be non-empty and contain no spaces",
            ));
        }
        Ok(Self(normalized))
    }

    /// Borrow the normalised code.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for CourseCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CourseCode> for String {
    fn from(value: CourseCode) -> Self {
        value.0
    }
}

/// Catalogue lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CourseStatus {
    #[default]
    Active,
    Inactive,
    Archived,
}

impl CourseStatus {
    /// Storage label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Archived => "archived",
        }
    }

    /// Parse a storage label.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            "archived" => Some(Self::Archived),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Syllabus {
    pub topics: Vec<String>,
    pub textbooks: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentKind {
    Quiz,
    Assignment,
    Midterm,
    Final,
    Project,
    Lab,
}

/// Weighted assessment component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub kind: AssessmentKind,
    #[serde(default)]
    pub title: String,
    /// Share of the final mark, 0 to 100.
    pub weightage: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
}

/// Attendance tally for one roster entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub present: u32,
    pub total: u32,
}

impl Attendance {
    /// Present sessions as a percentage of total; zero when nothing was held.
    ///
    /// # Examples
    /// ```
    /// use registrar::domain::Attendance;
    ///
    /// assert_eq!(Attendance { present: 3, total: 4 }.percentage(), 75.0);
    /// assert_eq!(Attendance::default().percentage(), 0.0);
    /// ```
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.present) / f64::from(self.total) * 100.0
    }

    fn record(&mut self, present: bool) {
        self.total = self.total.saturating_add(1);
        if present {
            self.present = self.present.saturating_add(1);
        }
    }
}

/// One student's membership of a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    pub student_id: StudentId,
    pub enrolled_at: DateTime<Utc>,
    pub grade: Grade,
    pub attendance: Attendance,
}

/// Failures raised by roster and faculty-list mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CourseError {
    #[error("course is full ({capacity} seats)")]
    CourseFull { capacity: u32 },
    #[error("student is already enrolled in this course")]
    AlreadyEnrolled,
    #[error("student is not enrolled in this course")]
    NotEnrolled,
    #[error("student is not on this course roster")]
    NotInRoster,
    #[error("course still has {count} enrolled students")]
    HasEnrollments { count: usize },
    #[error("faculty member is already assigned to this course")]
    AlreadyAssigned,
    #[error("faculty member is not assigned to this course")]
    NotAssigned,
    #[error(transparent)]
    InvalidGrade(#[from] InvalidGrade),
}

impl From<CourseError> for Error {
    fn from(value: CourseError) -> Self {
        let message = value.to_string();
        match value {
            CourseError::CourseFull { capacity } => Error::new(ErrorCode::CourseFull, message)
                .with_details(json!({ "capacity": capacity })),
            CourseError::AlreadyEnrolled => Error::new(ErrorCode::AlreadyEnrolled, message),
            CourseError::NotEnrolled => Error::new(ErrorCode::NotEnrolled, message),
            CourseError::NotInRoster => Error::not_found(message),
            CourseError::HasEnrollments { count } => {
                Error::new(ErrorCode::HasEnrollments, message)
                    .with_details(json!({ "enrolled": count }))
            }
            CourseError::AlreadyAssigned => Error::new(ErrorCode::AlreadyAssigned, message),
            CourseError::NotAssigned => Error::new(ErrorCode::NotAssigned, message),
            CourseError::InvalidGrade(_) => Error::new(ErrorCode::InvalidGrade, message),
        }
    }
}

/// Catalogue content supplied when a course is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CourseDraft {
    pub code: CourseCode,
    pub name: String,
    pub department: String,
    pub credits: u8,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub prerequisites: Vec<CourseId>,
    pub semester: u8,
    pub capacity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<Schedule>,
    #[serde(default)]
    pub status: CourseStatus,
    #[serde(default)]
    pub syllabus: Syllabus,
    #[serde(default)]
    pub assessments: Vec<Assessment>,
}

impl CourseDraft {
    /// Collect range and presence violations.
    pub fn validate(&self) -> Violations {
        let mut violations = Violations::default();
        violations.require(&self.name, "name");
        violations.require(&self.department, "department");
        violations.check(
            (MIN_CREDITS..=MAX_CREDITS).contains(&self.credits),
            "credits",
            "credits must be between 1 and 6",
        );
        violations.check(
            (1..=8).contains(&self.semester),
            "semester",
            "semester must be between 1 and 8",
        );
        violations.check(self.capacity >= 1, "capacity", "capacity must be at least 1");
        if let Some(schedule) = &self.schedule {
            violations.nest("schedule", schedule.validate());
        }
        for (index, assessment) in self.assessments.iter().enumerate() {
            violations.check(
                assessment.weightage <= 100,
                &format!("assessments[{index}].weightage"),
                "weightage must be between 0 and 100",
            );
        }
        violations
    }
}

/// Partial update; `None` leaves a field untouched. Roster and faculty
/// list are changed only through the enrollment workflow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct CourseUpdate {
    pub code: Option<CourseCode>,
    pub name: Option<String>,
    pub department: Option<String>,
    pub credits: Option<u8>,
    pub description: Option<String>,
    pub prerequisites: Option<Vec<CourseId>>,
    pub semester: Option<u8>,
    pub capacity: Option<u32>,
    pub schedule: Option<Schedule>,
    pub status: Option<CourseStatus>,
    pub syllabus: Option<Syllabus>,
    pub assessments: Option<Vec<Assessment>>,
}

/// Course with its roster and teaching assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub code: CourseCode,
    pub name: String,
    pub department: String,
    pub credits: u8,
    pub faculty: Vec<FacultyId>,
    pub description: String,
    pub prerequisites: Vec<CourseId>,
    pub semester: u8,
    pub capacity: u32,
    pub roster: Vec<RosterEntry>,
    pub schedule: Option<Schedule>,
    pub status: CourseStatus,
    pub syllabus: Syllabus,
    pub assessments: Vec<Assessment>,
    /// Incremented by the store on every save.
    pub revision: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// Build a new course with an empty roster.
    pub fn from_draft(id: CourseId, draft: CourseDraft, now: DateTime<Utc>) -> Self {
        let CourseDraft {
            code,
            name,
            department,
            credits,
            description,
            prerequisites,
            semester,
            capacity,
            schedule,
            status,
            syllabus,
            assessments,
        } = draft;
        Self {
            id,
            code,
            name,
            department,
            credits,
            faculty: Vec::new(),
            description,
            prerequisites,
            semester,
            capacity,
            roster: Vec::new(),
            schedule,
            status,
            syllabus,
            assessments,
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Number of roster entries.
    pub fn enrolled_count(&self) -> usize {
        self.roster.len()
    }

    /// Seats left, saturating at zero.
    pub fn available_seats(&self) -> u32 {
        let enrolled = u32::try_from(self.roster.len()).unwrap_or(u32::MAX);
        self.capacity.saturating_sub(enrolled)
    }

    /// Whether the roster has reached capacity.
    pub fn is_full(&self) -> bool {
        self.available_seats() == 0
    }

    /// Whether `student` is on the roster.
    pub fn is_enrolled(&self, student: StudentId) -> bool {
        self.roster.iter().any(|entry| entry.student_id == student)
    }

    /// Whether `faculty` teaches this course.
    pub fn is_taught_by(&self, faculty: FacultyId) -> bool {
        self.faculty.contains(&faculty)
    }

    /// Roster entry for `student`, if enrolled.
    pub fn entry(&self, student: StudentId) -> Option<&RosterEntry> {
        self.roster.iter().find(|entry| entry.student_id == student)
    }

    fn entry_mut(&mut self, student: StudentId) -> Option<&mut RosterEntry> {
        self.roster
            .iter_mut()
            .find(|entry| entry.student_id == student)
    }

    /// Check that `student` may join and build their fresh roster entry,
    /// grade `I` with empty attendance. The course itself is not changed.
    ///
    /// Capacity is checked before the duplicate check, so a full course
    /// reports `CourseFull` even for an enrolled student.
    pub fn admit(&self, student: StudentId, now: DateTime<Utc>) -> Result<RosterEntry, CourseError> {
        if self.is_full() {
            return Err(CourseError::CourseFull {
                capacity: self.capacity,
            });
        }
        if self.is_enrolled(student) {
            return Err(CourseError::AlreadyEnrolled);
        }
        Ok(RosterEntry {
            student_id: student,
            enrolled_at: now,
            grade: Grade::default(),
            attendance: Attendance::default(),
        })
    }

    /// Admit `student` and append the new entry.
    pub fn enroll(&mut self, student: StudentId, now: DateTime<Utc>) -> Result<(), CourseError> {
        let entry = self.admit(student, now)?;
        self.roster.push(entry);
        self.updated_at = now;
        Ok(())
    }

    /// Remove `student` by id and return the removed entry.
    pub fn unenroll(
        &mut self,
        student: StudentId,
        now: DateTime<Utc>,
    ) -> Result<RosterEntry, CourseError> {
        let position = self
            .roster
            .iter()
            .position(|entry| entry.student_id == student)
            .ok_or(CourseError::NotEnrolled)?;
        let removed = self.roster.remove(position);
        self.updated_at = now;
        Ok(removed)
    }

    /// Overwrite the grade of an enrolled student.
    ///
    /// The literal is parsed before the roster is touched, so an invalid
    /// grade leaves the existing grade in place.
    pub fn assign_grade(
        &mut self,
        student: StudentId,
        literal: &str,
        now: DateTime<Utc>,
    ) -> Result<Grade, CourseError> {
        let grade: Grade = literal.parse()?;
        self.set_grade(student, grade, now)?;
        Ok(grade)
    }

    /// Overwrite the grade of an enrolled student with a parsed grade.
    pub fn set_grade(
        &mut self,
        student: StudentId,
        grade: Grade,
        now: DateTime<Utc>,
    ) -> Result<(), CourseError> {
        let entry = self.entry_mut(student).ok_or(CourseError::NotInRoster)?;
        entry.grade = grade;
        self.updated_at = now;
        Ok(())
    }

    /// Count one session for an enrolled student.
    pub fn record_attendance(
        &mut self,
        student: StudentId,
        present: bool,
        now: DateTime<Utc>,
    ) -> Result<Attendance, CourseError> {
        let entry = self.entry_mut(student).ok_or(CourseError::NotInRoster)?;
        entry.attendance.record(present);
        let tally = entry.attendance;
        self.updated_at = now;
        Ok(tally)
    }

    /// Add `faculty` to the teaching list.
    pub fn assign_faculty(
        &mut self,
        faculty: FacultyId,
        now: DateTime<Utc>,
    ) -> Result<(), CourseError> {
        if self.is_taught_by(faculty) {
            return Err(CourseError::AlreadyAssigned);
        }
        self.faculty.push(faculty);
        self.updated_at = now;
        Ok(())
    }

    /// Remove `faculty` from the teaching list by value.
    pub fn remove_faculty(
        &mut self,
        faculty: FacultyId,
        now: DateTime<Utc>,
    ) -> Result<(), CourseError> {
        if !self.is_taught_by(faculty) {
            return Err(CourseError::NotAssigned);
        }
        self.faculty.retain(|id| *id != faculty);
        self.updated_at = now;
        Ok(())
    }

    /// Refuse deletion while anyone is enrolled.
    pub fn ensure_deletable(&self) -> Result<(), CourseError> {
        if self.roster.is_empty() {
            Ok(())
        } else {
            Err(CourseError::HasEnrollments {
                count: self.roster.len(),
            })
        }
    }

    /// Drop `student` if present; used by cascades. Returns whether removed.
    pub fn purge_student(&mut self, student: StudentId) -> bool {
        let before = self.roster.len();
        self.roster.retain(|entry| entry.student_id != student);
        self.roster.len() != before
    }

    /// Drop `faculty` if present; used by cascades. Returns whether removed.
    pub fn purge_faculty(&mut self, faculty: FacultyId) -> bool {
        let before = self.faculty.len();
        self.faculty.retain(|id| *id != faculty);
        self.faculty.len() != before
    }

    /// Apply a partial catalogue update and re-validate the result.
    pub fn apply(&mut self, update: CourseUpdate, now: DateTime<Utc>) -> Result<(), Error> {
        let mut candidate = self.clone();
        let CourseUpdate {
            code,
            name,
            department,
            credits,
            description,
            prerequisites,
            semester,
            capacity,
            schedule,
            status,
            syllabus,
            assessments,
        } = update;
        if let Some(value) = code {
            candidate.code = value;
        }
        if let Some(value) = name {
            candidate.name = value;
        }
        if let Some(value) = department {
            candidate.department = value;
        }
        if let Some(value) = credits {
            candidate.credits = value;
        }
        if let Some(value) = description {
            candidate.description = value;
        }
        if let Some(value) = prerequisites {
            candidate.prerequisites = value;
        }
        if let Some(value) = semester {
            candidate.semester = value;
        }
        if let Some(value) = capacity {
            candidate.capacity = value;
        }
        if schedule.is_some() {
            candidate.schedule = schedule;
        }
        if let Some(value) = status {
            candidate.status = value;
        }
        if let Some(value) = syllabus {
            candidate.syllabus = value;
        }
        if let Some(value) = assessments {
            candidate.assessments = value;
        }
        let mut violations = candidate.as_draft().validate();
        violations.check(
            !candidate.prerequisites.contains(&candidate.id),
            "prerequisites",
            "a course cannot be its own prerequisite",
        );
        violations.into_result()?;
        candidate.updated_at = now;
        *self = candidate;
        Ok(())
    }

    fn as_draft(&self) -> CourseDraft {
        CourseDraft {
            code: self.code.clone(),
            name: self.name.clone(),
            department: self.department.clone(),
            credits: self.credits,
            description: self.description.clone(),
            prerequisites: self.prerequisites.clone(),
            semester: self.semester,
            capacity: self.capacity,
            schedule: self.schedule.clone(),
            status: self.status,
            syllabus: self.syllabus.clone(),
            assessments: self.assessments.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Sample course drafts shared by unit tests.
    use super::*;

    pub(crate) fn draft(code: &str, capacity: u32) -> CourseDraft {
        CourseDraft {
            code: CourseCode::parse(code).expect("course code"),
            name: "Programming Fundamentals".to_owned(),
            department: "Computer Science".to_owned(),
            credits: 4,
            description: String::new(),
            prerequisites: Vec::new(),
            semester: 1,
            capacity,
            schedule: None,
            status: CourseStatus::Active,
            syllabus: Syllabus::default(),
            assessments: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests;
