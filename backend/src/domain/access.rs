//! Role and ownership based access policy.
//!
//! [`authorize`] is a pure function of the caller and the action. Services
//! consult it before touching any store so a denial never leaves partial
//! writes behind.

use crate::domain::{Error, FacultyId, Principal, ProfileRef, Role, StudentId};

/// Operation being attempted, with the resource facts the rules need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a> {
    /// Register, list, update, or delete identities.
    ManageIdentities,
    /// Read the caller's own identity or change its password.
    ManageOwnAccount,
    CreateStudent,
    DeleteStudent,
    /// List student profiles.
    ListStudents,
    ReadStudent(StudentId),
    UpdateStudent(StudentId),
    CreateFaculty,
    DeleteFaculty,
    ReadFaculty,
    UpdateFaculty(FacultyId),
    CreateCourse,
    DeleteCourse,
    ReadCourse,
    /// Edit catalogue fields of a course taught by `faculty`.
    UpdateCourse { faculty: &'a [FacultyId] },
    /// Enroll the caller's own student profile.
    SelfEnroll,
    /// Enroll or unenroll any student.
    ManageEnrollment,
    /// Assign or remove teaching staff.
    ManageCourseFaculty,
    /// Grade or take attendance on a course taught by `faculty`.
    RecordResults { faculty: &'a [FacultyId] },
}

/// Reason a request was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No principal was supplied.
    Unauthenticated,
    /// A principal was supplied but lacks permission.
    Forbidden,
}

/// Outcome of a policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    /// Convert into a domain result.
    pub fn into_result(self) -> Result<(), Error> {
        match self {
            Self::Allow => Ok(()),
            Self::Deny(DenyReason::Unauthenticated) => {
                Err(Error::unauthorized("authentication required"))
            }
            Self::Deny(DenyReason::Forbidden) => {
                Err(Error::forbidden("not permitted to perform this action"))
            }
        }
    }

    fn from_bool(allowed: bool) -> Self {
        if allowed {
            Self::Allow
        } else {
            Self::Deny(DenyReason::Forbidden)
        }
    }
}

fn owns_student(principal: &Principal, id: StudentId) -> bool {
    principal.profile == Some(ProfileRef::Student(id))
}

fn owns_faculty(principal: &Principal, id: FacultyId) -> bool {
    principal.profile == Some(ProfileRef::Faculty(id))
}

fn teaches(principal: &Principal, faculty: &[FacultyId]) -> bool {
    principal
        .profile
        .and_then(ProfileRef::faculty)
        .is_some_and(|id| faculty.contains(&id))
}

/// Decide whether `principal` may perform `action`.
///
/// # Examples
/// ```
/// use registrar::domain::{Action, Decision, DenyReason, authorize};
///
/// assert_eq!(authorize(None, Action::ReadCourse), Decision::Allow);
/// assert_eq!(
///     authorize(None, Action::ReadFaculty),
///     Decision::Deny(DenyReason::Unauthenticated)
/// );
/// ```
pub fn authorize(principal: Option<&Principal>, action: Action<'_>) -> Decision {
    if matches!(action, Action::ReadCourse) {
        return Decision::Allow;
    }
    let Some(principal) = principal else {
        return Decision::Deny(DenyReason::Unauthenticated);
    };
    let role = principal.role;
    let is_admin = role == Role::Admin;
    let allowed = match action {
        Action::ReadCourse | Action::ManageOwnAccount | Action::ReadFaculty => true,
        Action::ManageIdentities
        | Action::CreateStudent
        | Action::DeleteStudent
        | Action::CreateFaculty
        | Action::DeleteFaculty
        | Action::CreateCourse
        | Action::DeleteCourse => is_admin,
        Action::ListStudents | Action::ManageEnrollment | Action::ManageCourseFaculty => {
            matches!(role, Role::Admin | Role::Faculty)
        }
        Action::ReadStudent(id) => {
            matches!(role, Role::Admin | Role::Faculty) || owns_student(principal, id)
        }
        Action::UpdateStudent(id) => is_admin || owns_student(principal, id),
        Action::UpdateFaculty(id) => is_admin || owns_faculty(principal, id),
        Action::UpdateCourse { faculty } | Action::RecordResults { faculty } => {
            is_admin || teaches(principal, faculty)
        }
        Action::SelfEnroll => role == Role::Student,
    };
    Decision::from_bool(allowed)
}

/// Authorise or return the matching domain error.
pub fn require(principal: Option<&Principal>, action: Action<'_>) -> Result<(), Error> {
    authorize(principal, action).into_result()
}
