//! HS256 JSON Web Token implementation of the `TokenService` port.
//!
//! Expiry is checked against the injected clock rather than the system time
//! so token lifetimes follow the same notion of "now" as lockouts and reset
//! tokens.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mockable::Clock;
use zeroize::Zeroizing;

use crate::domain::ports::{TokenError, TokenService};
use crate::domain::{Identity, IssuedToken, TokenClaims};

/// Shortest accepted signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Signs and verifies bearer tokens with a shared secret.
#[derive(Clone)]
pub struct JwtTokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl JwtTokenService {
    /// Build a service from a raw secret.
    ///
    /// Secrets shorter than [`MIN_SECRET_LEN`] bytes are rejected.
    pub fn new(
        secret: &Zeroizing<Vec<u8>>,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, TokenError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(TokenError::issue(format!(
                "signing secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
            clock,
        })
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);
        validation
    }
}

impl TokenService for JwtTokenService {
    fn issue(&self, identity: &Identity, now: DateTime<Utc>) -> Result<IssuedToken, TokenError> {
        let expires_at = now + self.ttl;
        let claims = TokenClaims {
            sub: identity.id,
            role: identity.role,
            username: identity.username.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| TokenError::issue(err.to_string()))?;
        Ok(IssuedToken { token, expires_at })
    }

    fn verify(&self, token: &str) -> Result<TokenClaims, TokenError> {
        let data = decode::<TokenClaims>(token, &self.decoding, &Self::validation()).map_err(
            |err| match err.kind() {
                ErrorKind::ExpiredSignature => TokenError::expired(),
                _ => TokenError::invalid(err.to_string()),
            },
        )?;
        if data.claims.exp <= self.clock.utc().timestamp() {
            return Err(TokenError::expired());
        }
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EmailAddress, NewIdentity, PasswordHash, Role, Username};
    use crate::test_support::{MutableClock, fixture_timestamp};
    use rstest::{fixture, rstest};

    struct Harness {
        clock: Arc<MutableClock>,
        service: JwtTokenService,
    }

    fn secret(fill: u8) -> Zeroizing<Vec<u8>> {
        Zeroizing::new(vec![fill; MIN_SECRET_LEN])
    }

    #[fixture]
    fn harness() -> Harness {
        let clock = Arc::new(MutableClock::default());
        let service =
            JwtTokenService::new(&secret(7), Duration::hours(24), clock.clone()).expect("service");
        Harness { clock, service }
    }

    fn identity() -> Identity {
        Identity::new(
            NewIdentity {
                username: Username::parse("ada").expect("username"),
                email: EmailAddress::parse("ada@example.edu").expect("email"),
                role: Role::Admin,
                profile: None,
            },
            PasswordHash::new("hash"),
            fixture_timestamp(),
        )
        .expect("identity")
    }

    #[rstest]
    fn issued_token_round_trips_claims(harness: Harness) {
        let who = identity();
        let issued = harness
            .service
            .issue(&who, fixture_timestamp())
            .expect("issue");
        assert_eq!(issued.expires_at, fixture_timestamp() + Duration::hours(24));
        let claims = harness.service.verify(&issued.token).expect("verify");
        assert_eq!(claims.sub, who.id);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.username, "ada");
    }

    #[rstest]
    fn tokens_expire_with_the_clock(harness: Harness) {
        let issued = harness
            .service
            .issue(&identity(), fixture_timestamp())
            .expect("issue");
        harness.clock.advance(Duration::hours(24));
        let err = harness.service.verify(&issued.token).expect_err("expired");
        assert_eq!(err, TokenError::expired());
    }

    #[rstest]
    fn tokens_signed_with_another_secret_are_invalid(harness: Harness) {
        let other = JwtTokenService::new(&secret(9), Duration::hours(1), harness.clock.clone())
            .expect("service");
        let issued = other
            .issue(&identity(), fixture_timestamp())
            .expect("issue");
        let err = harness.service.verify(&issued.token).expect_err("invalid");
        assert!(matches!(err, TokenError::Invalid { .. }));
    }

    #[rstest]
    fn garbage_is_invalid(harness: Harness) {
        assert!(matches!(
            harness.service.verify("not.a.token"),
            Err(TokenError::Invalid { .. })
        ));
    }

    #[rstest]
    fn short_secrets_are_rejected() {
        let short = Zeroizing::new(vec![1_u8; 8]);
        let clock: Arc<dyn Clock> = Arc::new(MutableClock::default());
        assert!(JwtTokenService::new(&short, Duration::hours(1), clock).is_err());
    }
}
