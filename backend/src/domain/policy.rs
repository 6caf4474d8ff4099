//! Tunable policies handed to services at construction time.

use chrono::Duration;

use crate::domain::LockoutPolicy;

/// How enrollment protects course capacity against concurrent writers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CapacityMode {
    /// Check against a fresh read, then write the single entry unguarded.
    /// Two simultaneous enrollments for the last seat can both succeed.
    #[default]
    BestEffort,
    /// Write only if the course revision is unchanged since it was read; the
    /// losing writer receives `concurrent_modification`.
    Strict,
}

impl CapacityMode {
    /// Select the mode from a boolean switch.
    pub const fn from_strict(strict: bool) -> Self {
        if strict { Self::Strict } else { Self::BestEffort }
    }

    /// Revision to compare against when saving `revision`.
    pub const fn expected_revision(self, revision: u32) -> Option<u32> {
        match self {
            Self::BestEffort => None,
            Self::Strict => Some(revision),
        }
    }
}

/// Credential policy for login and password reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccountPolicy {
    pub lockout: LockoutPolicy,
    /// Lifetime of an emailed reset token.
    pub reset_token_ttl: Duration,
}

impl Default for AccountPolicy {
    fn default() -> Self {
        Self {
            lockout: LockoutPolicy::default(),
            reset_token_ttl: Duration::hours(1),
        }
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(false, None)]
    #[case(true, Some(7))]
    fn expected_revision_follows_mode(#[case] strict: bool, #[case] expected: Option<u32>) {
        assert_eq!(CapacityMode::from_strict(strict).expected_revision(7), expected);
    }
}
