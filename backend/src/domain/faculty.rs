//! Faculty profile aggregate.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    CourseId, EmailAddress, Error, FacultyId, IdentityId, OfficeHour, PersonName, Violations,
};
use crate::domain::validation::is_plausible_phone;

/// Academic rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Professor,
    AssociateProfessor,
    AssistantProfessor,
    Lecturer,
    VisitingFaculty,
}

impl Position {
    /// Storage label.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Professor => "professor",
            Self::AssociateProfessor => "associate_professor",
            Self::AssistantProfessor => "assistant_professor",
            Self::Lecturer => "lecturer",
            Self::VisitingFaculty => "visiting_faculty",
        }
    }

    /// Parse a storage label.
    pub fn parse(raw: &str) -> Option<Self> {
        [
            Self::Professor,
            Self::AssociateProfessor,
            Self::AssistantProfessor,
            Self::Lecturer,
            Self::VisitingFaculty,
        ]
        .into_iter()
        .find(|position| position.as_str() == raw)
    }
}

/// Normalised (trimmed, uppercased) employee id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "EMP-0042")]
pub struct EmployeeId(String);

impl EmployeeId {
    /// Normalise an employee id, rejecting blank input.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(Error::invalid_request("employee id must not be empty"));
        }
        Ok(Self(normalized))
    }

    /// Borrow the normalised id.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for EmployeeId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EmployeeId> for String {
    fn from(value: EmployeeId) -> Self {
        value.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Qualification {
    pub degree: String,
    pub institution: String,
    pub year: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Publication {
    pub title: String,
    #[serde(default)]
    pub venue: String,
    pub year: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Editable profile content supplied when a faculty member is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FacultyDraft {
    pub employee_id: EmployeeId,
    pub name: PersonName,
    pub email: EmailAddress,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub department: String,
    pub position: Position,
    pub join_date: NaiveDate,
    #[serde(default)]
    pub qualifications: Vec<Qualification>,
    #[serde(default)]
    pub specializations: Vec<String>,
    #[serde(default)]
    pub publications: Vec<Publication>,
    #[serde(default)]
    pub office_hours: Vec<OfficeHour>,
}

impl FacultyDraft {
    /// Collect violations across nested values.
    pub fn validate(&self) -> Violations {
        let mut violations = Violations::default();
        violations.nest("name", self.name.validate());
        violations.require(&self.department, "department");
        if let Some(phone) = &self.phone {
            violations.check(
                is_plausible_phone(phone),
                "phone",
                "phone number must contain 7 to 15 digits",
            );
        }
        for (index, slot) in self.office_hours.iter().enumerate() {
            violations.check(
                slot.end_time > slot.start_time,
                &format!("officeHours[{index}].endTime"),
                "end time must be after start time",
            );
        }
        violations
    }
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct FacultyUpdate {
    pub employee_id: Option<EmployeeId>,
    pub name: Option<PersonName>,
    pub email: Option<EmailAddress>,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<Position>,
    pub join_date: Option<NaiveDate>,
    pub qualifications: Option<Vec<Qualification>>,
    pub specializations: Option<Vec<String>>,
    pub publications: Option<Vec<Publication>>,
    pub office_hours: Option<Vec<OfficeHour>>,
    pub active: Option<bool>,
}

/// Faculty profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Faculty {
    pub id: FacultyId,
    pub identity_id: IdentityId,
    pub employee_id: EmployeeId,
    pub name: PersonName,
    pub email: EmailAddress,
    pub phone: Option<String>,
    pub department: String,
    pub position: Position,
    pub join_date: NaiveDate,
    pub qualifications: Vec<Qualification>,
    pub specializations: Vec<String>,
    pub publications: Vec<Publication>,
    pub office_hours: Vec<OfficeHour>,
    /// Courses this member teaches; kept in step with `Course::faculty`.
    pub courses: Vec<CourseId>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Faculty {
    /// Build a new active profile from a validated draft.
    pub fn from_draft(
        id: FacultyId,
        identity_id: IdentityId,
        draft: FacultyDraft,
        now: DateTime<Utc>,
    ) -> Self {
        let FacultyDraft {
            employee_id,
            name,
            email,
            phone,
            department,
            position,
            join_date,
            qualifications,
            specializations,
            publications,
            office_hours,
        } = draft;
        Self {
            id,
            identity_id,
            employee_id,
            name,
            email,
            phone,
            department,
            position,
            join_date,
            qualifications,
            specializations,
            publications,
            office_hours,
            courses: Vec::new(),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Derived display name.
    pub fn full_name(&self) -> String {
        self.name.full_name()
    }

    /// Record a taught course; returns `false` when already listed.
    pub fn add_course(&mut self, course: CourseId) -> bool {
        if self.courses.contains(&course) {
            return false;
        }
        self.courses.push(course);
        true
    }

    /// Drop a taught course; returns `false` when it was not listed.
    pub fn remove_course(&mut self, course: CourseId) -> bool {
        let before = self.courses.len();
        self.courses.retain(|id| *id != course);
        self.courses.len() != before
    }

    /// Apply a partial update and re-validate the result.
    pub fn apply(&mut self, update: FacultyUpdate, now: DateTime<Utc>) -> Result<(), Error> {
        let mut candidate = self.clone();
        let FacultyUpdate {
            employee_id,
            name,
            email,
            phone,
            department,
            position,
            join_date,
            qualifications,
            specializations,
            publications,
            office_hours,
            active,
        } = update;
        if let Some(value) = employee_id {
            candidate.employee_id = value;
        }
        if let Some(value) = name {
            candidate.name = value;
        }
        if let Some(value) = email {
            candidate.email = value;
        }
        if phone.is_some() {
            candidate.phone = phone;
        }
        if let Some(value) = department {
            candidate.department = value;
        }
        if let Some(value) = position {
            candidate.position = value;
        }
        if let Some(value) = join_date {
            candidate.join_date = value;
        }
        if let Some(value) = qualifications {
            candidate.qualifications = value;
        }
        if let Some(value) = specializations {
            candidate.specializations = value;
        }
        if let Some(value) = publications {
            candidate.publications = value;
        }
        if let Some(value) = office_hours {
            candidate.office_hours = value;
        }
        if let Some(value) = active {
            candidate.active = value;
        }
        candidate.as_draft().validate().into_result()?;
        candidate.updated_at = now;
        *self = candidate;
        Ok(())
    }

    fn as_draft(&self) -> FacultyDraft {
        FacultyDraft {
            employee_id: self.employee_id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            department: self.department.clone(),
            position: self.position,
            join_date: self.join_date,
            qualifications: self.qualifications.clone(),
            specializations: self.specializations.clone(),
            publications: self.publications.clone(),
            office_hours: self.office_hours.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Sample faculty drafts shared by unit tests.
    use super::*;

    pub(crate) fn draft(employee_id: &str, email: &str) -> FacultyDraft {
        FacultyDraft {
            employee_id: EmployeeId::parse(employee_id).expect("employee id"),
            name: PersonName {
                first: "Edsger".to_owned(),
                middle: None,
                last: "Dijkstra".to_owned(),
            },
            email: EmailAddress::parse(email).expect("email"),
            phone: None,
            department: "Computer Science".to_owned(),
            position: Position::Professor,
            join_date: NaiveDate::from_ymd_opt(2010, 7, 1).expect("date"),
            qualifications: Vec::new(),
            specializations: vec!["algorithms".to_owned()],
            publications: Vec::new(),
            office_hours: Vec::new(),
        }
    }
}
