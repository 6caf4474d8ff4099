//! Port abstraction for signed session tokens.

use chrono::{DateTime, Utc};

use crate::domain::{Identity, IssuedToken, TokenClaims};

use super::define_port_error;

define_port_error! {
    /// Errors raised by token adapters.
    pub enum TokenError {
        /// Signature, format, or claims were rejected.
        Invalid { message: String } => "token rejected: {message}",
        /// The token was well formed but past its expiry.
        Expired => "token expired",
        /// Signing a new token failed.
        Issue { message: String } => "token issue failed: {message}",
    }
}

/// Issues and verifies bearer tokens carrying identity id and role.
#[cfg_attr(test, mockall::automock)]
pub trait TokenService: Send + Sync {
    /// Sign a token for `identity`, valid from `now` for the configured TTL.
    fn issue(&self, identity: &Identity, now: DateTime<Utc>) -> Result<IssuedToken, TokenError>;

    /// Check signature and expiry and return the embedded claims.
    fn verify(&self, token: &str) -> Result<TokenClaims, TokenError>;
}

impl From<TokenError> for crate::domain::Error {
    fn from(value: TokenError) -> Self {
        match value {
            TokenError::Invalid { .. } => Self::unauthorized("invalid token"),
            TokenError::Expired => Self::unauthorized("token expired"),
            TokenError::Issue { message } => {
                tracing::error!(%message, "token signing failed");
                Self::internal("token signing failed")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use rstest::rstest;

    #[rstest]
    #[case(TokenError::invalid("bad signature"), ErrorCode::Unauthorized)]
    #[case(TokenError::expired(), ErrorCode::Unauthorized)]
    #[case(TokenError::issue("no key"), ErrorCode::InternalError)]
    fn token_errors_map_to_domain(#[case] err: TokenError, #[case] code: ErrorCode) {
        assert_eq!(crate::domain::Error::from(err).code(), code);
    }
}
