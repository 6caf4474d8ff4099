//! Personal details shared by student and faculty profiles.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Violations;
use crate::domain::validation::{is_plausible_email, is_plausible_phone};

/// Error returned when an email address is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("email address is not valid")]
pub struct InvalidEmail;

/// Lowercased, trimmed email address.
///
/// # Examples
/// ```
/// use registrar::domain::EmailAddress;
///
/// let email = EmailAddress::parse("  Ada@Example.EDU ").unwrap();
/// assert_eq!(email.as_str(), "ada@example.edu");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, format = Email)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Normalise and validate an email address.
    pub fn parse(raw: &str) -> Result<Self, InvalidEmail> {
        let normalized = raw.trim().to_lowercase();
        if is_plausible_email(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(InvalidEmail)
        }
    }

    /// Borrow the normalised address.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = InvalidEmail;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Structured personal name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PersonName {
    /// Given name.
    pub first: String,
    /// Optional middle name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle: Option<String>,
    /// Family name.
    pub last: String,
}

impl PersonName {
    /// Name parts joined by single spaces, skipping blank parts.
    ///
    /// # Examples
    /// ```
    /// use registrar::domain::PersonName;
    ///
    /// let name = PersonName { first: "Ada".into(), middle: None, last: "Lovelace".into() };
    /// assert_eq!(name.full_name(), "Ada Lovelace");
    /// ```
    pub fn full_name(&self) -> String {
        [Some(self.first.as_str()), self.middle.as_deref(), Some(self.last.as_str())]
            .into_iter()
            .flatten()
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Collect violations for blank required parts.
    pub fn validate(&self) -> Violations {
        let mut violations = Violations::default();
        violations.require(&self.first, "first");
        violations.require(&self.last, "last");
        violations
    }
}

/// Self-reported gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    /// Male.
    Male,
    /// Female.
    Female,
    /// Other or undisclosed.
    Other,
}

/// Postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// Contact channels for a profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    /// Contact email; unique across student profiles.
    pub email: EmailAddress,
    /// Phone number.
    pub phone: String,
    /// Postal address.
    #[serde(default)]
    pub address: Address,
}

impl ContactInfo {
    /// Collect violations for the phone number.
    pub fn validate(&self) -> Violations {
        let mut violations = Violations::default();
        violations.check(
            is_plausible_phone(&self.phone),
            "phone",
            "phone number must contain 7 to 15 digits",
        );
        violations
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(None, "Grace Hopper")]
    #[case(Some("Brewster"), "Grace Brewster Hopper")]
    #[case(Some("  "), "Grace Hopper")]
    fn full_name_joins_present_parts(#[case] middle: Option<&str>, #[case] expected: &str) {
        let name = PersonName {
            first: "Grace".to_owned(),
            middle: middle.map(str::to_owned),
            last: "Hopper".to_owned(),
        };
        assert_eq!(name.full_name(), expected);
    }

    #[rstest]
    fn email_deserialisation_normalises_and_validates() {
        let email: EmailAddress = serde_json::from_str("\"GRACE@Navy.MIL\"").expect("valid email");
        assert_eq!(email.as_str(), "grace@navy.mil");
        assert!(serde_json::from_str::<EmailAddress>("\"not-an-email\"").is_err());
    }

    #[rstest]
    fn blank_name_parts_are_reported() {
        let name = PersonName {
            first: " ".to_owned(),
            middle: None,
            last: String::new(),
        };
        assert_eq!(name.validate().as_slice().len(), 2);
    }
}
