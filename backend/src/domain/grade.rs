//! Canonical letter grades.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Letter grade recorded against a roster entry.
///
/// `I` (incomplete) is the default for new enrollments; `W` records a
/// withdrawal that stays on the transcript.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Grade {
    #[serde(rename = "A+")]
    APlus,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "B+")]
    BPlus,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "C+")]
    CPlus,
    #[serde(rename = "C")]
    C,
    #[serde(rename = "D")]
    D,
    #[serde(rename = "F")]
    F,
    #[default]
    #[serde(rename = "I")]
    Incomplete,
    #[serde(rename = "W")]
    Withdrawn,
}

impl Grade {
    /// Every accepted grade, best first.
    pub const ALL: [Self; 10] = [
        Self::APlus,
        Self::A,
        Self::BPlus,
        Self::B,
        Self::CPlus,
        Self::C,
        Self::D,
        Self::F,
        Self::Incomplete,
        Self::Withdrawn,
    ];

    /// Literal used on the wire and in storage.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::APlus => "A+",
            Self::A => "A",
            Self::BPlus => "B+",
            Self::B => "B",
            Self::CPlus => "C+",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
            Self::Incomplete => "I",
            Self::Withdrawn => "W",
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned for a literal outside the canonical set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid grade '{0}'; expected one of A+, A, B+, B, C+, C, D, F, I, W")]
pub struct InvalidGrade(pub String);

impl FromStr for Grade {
    type Err = InvalidGrade;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|grade| grade.as_str() == trimmed)
            .ok_or_else(|| InvalidGrade(s.to_owned()))
    }
}
