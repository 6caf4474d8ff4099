//! Weekly timetable primitives. Stored as data, never scheduled against.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Violations;

/// Day of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

/// Error returned for a malformed `HH:MM` literal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("time must be formatted HH:MM (24-hour), got '{0}'")]
pub struct InvalidClockTime(pub String);

/// Wall-clock time of day with minute precision, written `HH:MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String", into = "String")]
#[schema(value_type = String, example = "09:30")]
pub struct ClockTime(u16);

impl ClockTime {
    /// Build from hour and minute.
    pub fn new(hour: u16, minute: u16) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self(hour * 60 + minute))
    }

    /// Minutes since midnight.
    pub const fn minutes(self) -> u16 {
        self.0
    }
}

impl FromStr for ClockTime {
    type Err = InvalidClockTime;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidClockTime(s.to_owned());
        let (hour, minute) = s.trim().split_once(':').ok_or_else(invalid)?;
        if hour.len() != 2 || minute.len() != 2 {
            return Err(invalid());
        }
        let hour: u16 = hour.parse().map_err(|_| invalid())?;
        let minute: u16 = minute.parse().map_err(|_| invalid())?;
        Self::new(hour, minute).ok_or_else(invalid)
    }
}

impl TryFrom<String> for ClockTime {
    type Error = InvalidClockTime;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockTime> for String {
    fn from(value: ClockTime) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

/// Weekly meeting pattern for a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    /// Meeting days.
    pub days: Vec<Weekday>,
    /// Start time.
    pub start_time: ClockTime,
    /// End time; must follow `start_time`.
    pub end_time: ClockTime,
    /// Room or venue label.
    #[serde(default)]
    pub room: String,
}

impl Schedule {
    /// Collect violations for an empty day list or inverted times.
    pub fn validate(&self) -> Violations {
        let mut violations = Violations::default();
        violations.check(!self.days.is_empty(), "days", "at least one day is required");
        violations.check(
            self.end_time > self.start_time,
            "endTime",
            "end time must be after start time",
        );
        violations
    }
}

/// Weekly office-hour slot for faculty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OfficeHour {
    pub day: Weekday,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
    #[serde(default)]
    pub location: String,
}
