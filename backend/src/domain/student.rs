//! Student profile aggregate.
//!
//! A student profile is linked 1:1 to an identity with the student role.
//! Course membership is not stored here; the course roster is the single
//! source of truth and a student's course list is derived from it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    ContactInfo, EmailAddress, Error, Gender, IdentityId, PersonName, StudentId, Violations,
};

/// Normalised (trimmed, uppercased) roll number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "CS2024-017")]
pub struct RollNumber(String);

impl RollNumber {
    /// Normalise a roll number, rejecting blank input.
    pub fn parse(raw: &str) -> Result<Self, Error> {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(Error::invalid_request("roll number must not be empty"));
        }
        Ok(Self(normalized))
    }

    /// Borrow the normalised roll number.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for RollNumber {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RollNumber> for String {
    fn from(value: RollNumber) -> Self {
        value.0
    }
}

/// Academic standing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AcademicRecord {
    /// Programme branch, e.g. `CSE`.
    pub branch: String,
    /// Current semester, 1 to 8.
    pub semester: u8,
    /// Intake batch, e.g. `2024`.
    pub batch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    /// Cumulative grade point average, 0 to 10.
    #[serde(default)]
    pub cgpa: f64,
    /// Outstanding failed courses.
    #[serde(default)]
    pub backlogs: u32,
}

impl AcademicRecord {
    /// Collect range and presence violations.
    pub fn validate(&self) -> Violations {
        let mut violations = Violations::default();
        violations.require(&self.branch, "branch");
        violations.require(&self.batch, "batch");
        violations.check(
            (1..=8).contains(&self.semester),
            "semester",
            "semester must be between 1 and 8",
        );
        violations.check(
            self.cgpa.is_finite() && (0.0..=10.0).contains(&self.cgpa),
            "cgpa",
            "cgpa must be between 0 and 10",
        );
        violations
    }
}

/// Parent or guardian contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Guardian {
    pub name: String,
    pub relation: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
}

/// Uploaded document reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    /// Document kind, e.g. `transcript`.
    pub kind: String,
    /// Storage URL.
    pub url: String,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub verified: bool,
}

/// Fee ledger line. Stored verbatim; not reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FeeRecord {
    pub semester: u8,
    /// Amount in minor currency units.
    pub amount: i64,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub paid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_on: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receipt: Option<String>,
}

/// Editable profile content supplied when a student is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentDraft {
    pub roll_number: RollNumber,
    pub name: PersonName,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub contact: ContactInfo,
    pub academic: AcademicRecord,
    #[serde(default)]
    pub guardians: Vec<Guardian>,
    #[serde(default)]
    pub documents: Vec<DocumentRecord>,
    #[serde(default)]
    pub fees: Vec<FeeRecord>,
}

impl StudentDraft {
    /// Collect violations across nested values.
    pub fn validate(&self) -> Violations {
        let mut violations = Violations::default();
        violations.nest("name", self.name.validate());
        violations.nest("contact", self.contact.validate());
        violations.nest("academic", self.academic.validate());
        for (index, guardian) in self.guardians.iter().enumerate() {
            violations.require(&guardian.name, &format!("guardians[{index}].name"));
        }
        violations
    }
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct StudentUpdate {
    pub roll_number: Option<RollNumber>,
    pub name: Option<PersonName>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<Gender>,
    pub contact: Option<ContactInfo>,
    pub academic: Option<AcademicRecord>,
    pub guardians: Option<Vec<Guardian>>,
    pub documents: Option<Vec<DocumentRecord>>,
    pub fees: Option<Vec<FeeRecord>>,
    pub active: Option<bool>,
}

/// Student profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: StudentId,
    pub identity_id: IdentityId,
    pub roll_number: RollNumber,
    pub name: PersonName,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    pub contact: ContactInfo,
    pub academic: AcademicRecord,
    pub guardians: Vec<Guardian>,
    pub documents: Vec<DocumentRecord>,
    pub fees: Vec<FeeRecord>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Student {
    /// Build a new active profile from a validated draft.
    pub fn from_draft(
        id: StudentId,
        identity_id: IdentityId,
        draft: StudentDraft,
        now: DateTime<Utc>,
    ) -> Self {
        let StudentDraft {
            roll_number,
            name,
            date_of_birth,
            gender,
            contact,
            academic,
            guardians,
            documents,
            fees,
        } = draft;
        Self {
            id,
            identity_id,
            roll_number,
            name,
            date_of_birth,
            gender,
            contact,
            academic,
            guardians,
            documents,
            fees,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Derived display name.
    pub fn full_name(&self) -> String {
        self.name.full_name()
    }

    /// Apply a partial update and re-validate the result.
    pub fn apply(&mut self, update: StudentUpdate, now: DateTime<Utc>) -> Result<(), Error> {
        let StudentUpdate {
            roll_number,
            name,
            date_of_birth,
            gender,
            contact,
            academic,
            guardians,
            documents,
            fees,
            active,
        } = update;
        let mut candidate = self.clone();
        if let Some(value) = roll_number {
            candidate.roll_number = value;
        }
        if let Some(value) = name {
            candidate.name = value;
        }
        if let Some(value) = date_of_birth {
            candidate.date_of_birth = value;
        }
        if let Some(value) = gender {
            candidate.gender = value;
        }
        if let Some(value) = contact {
            candidate.contact = value;
        }
        if let Some(value) = academic {
            candidate.academic = value;
        }
        if let Some(value) = guardians {
            candidate.guardians = value;
        }
        if let Some(value) = documents {
            candidate.documents = value;
        }
        if let Some(value) = fees {
            candidate.fees = value;
        }
        if let Some(value) = active {
            candidate.active = value;
        }
        candidate.as_draft().validate().into_result()?;
        candidate.updated_at = now;
        *self = candidate;
        Ok(())
    }

    fn as_draft(&self) -> StudentDraft {
        StudentDraft {
            roll_number: self.roll_number.clone(),
            name: self.name.clone(),
            date_of_birth: self.date_of_birth,
            gender: self.gender,
            contact: self.contact.clone(),
            academic: self.academic.clone(),
            guardians: self.guardians.clone(),
            documents: self.documents.clone(),
            fees: self.fees.clone(),
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Sample student drafts shared by unit tests.
    use super::*;
    use crate::domain::Address;

    pub(crate) fn draft(roll: &str, email: &str) -> StudentDraft {
        StudentDraft {
            roll_number: RollNumber::parse(roll).expect("roll number"),
            name: PersonName {
                first: "Ada".to_owned(),
                middle: None,
                last: "Lovelace".to_owned(),
            },
            date_of_birth: NaiveDate::from_ymd_opt(2004, 12, 10).expect("date"),
            gender: Gender::Female,
            contact: ContactInfo {
                email: EmailAddress::parse(email).expect("email"),
                phone: "+44 20 7946 0958".to_owned(),
                address: Address::default(),
            },
            academic: AcademicRecord {
                branch: "CSE".to_owned(),
                semester: 3,
                batch: "2024".to_owned(),
                section: Some("A".to_owned()),
                cgpa: 8.4,
                backlogs: 0,
            },
            guardians: Vec::new(),
            documents: Vec::new(),
            fees: Vec::new(),
        }
    }
}
