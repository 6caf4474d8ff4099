//! Bearer-token extractors.
//!
//! Handlers take [`Authenticated`] when a caller must be logged in and
//! [`MaybeAuthenticated`] for routes that are also open to anonymous
//! callers. Both resolve the token through [`LoginService::resolve`], so a
//! deactivated or deleted identity is refused even while its token is
//! still unexpired.
//!
//! [`LoginService::resolve`]: crate::domain::ports::LoginService::resolve

use actix_web::http::header::{self, HeaderMap};
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::{Error, Principal};

use super::state::HttpState;

const BEARER_PREFIX: &str = "Bearer ";

/// Pull the token out of an `Authorization: Bearer ...` header.
///
/// `Ok(None)` means no header was sent; a header with another scheme or an
/// empty token is an error.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, Error> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };
    let raw = value
        .to_str()
        .map_err(|_| Error::unauthorized("authorization header is not valid text"))?;
    let token = raw
        .strip_prefix(BEARER_PREFIX)
        .or_else(|| raw.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::unauthorized("expected a bearer token"))?;
    Ok(Some(token.to_owned()))
}

fn http_state(req: &HttpRequest) -> Result<web::Data<HttpState>, Error> {
    req.app_data::<web::Data<HttpState>>()
        .cloned()
        .ok_or_else(|| Error::internal("HTTP state is not configured"))
}

async fn resolve(
    state: web::Data<HttpState>,
    token: Option<String>,
) -> Result<Option<Principal>, Error> {
    match token {
        Some(token) => state.login.resolve(&token).await.map(Some),
        None => Ok(None),
    }
}

/// The resolved caller of an authenticated route.
#[derive(Debug, Clone)]
pub struct Authenticated(pub Principal);

impl Authenticated {
    pub fn principal(&self) -> &Principal {
        &self.0
    }
}

impl FromRequest for Authenticated {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let prepared = http_state(req).and_then(|state| Ok((state, bearer_token(req.headers())?)));
        Box::pin(async move {
            let (state, token) = prepared?;
            let token = token.ok_or_else(|| Error::unauthorized("login required"))?;
            let principal = resolve(state, Some(token))
                .await?
                .ok_or_else(|| Error::unauthorized("login required"))?;
            Ok(Self(principal))
        })
    }
}

/// The caller of a public route, when a token was presented.
///
/// A presented but invalid token is still rejected rather than silently
/// treated as anonymous.
#[derive(Debug, Clone)]
pub struct MaybeAuthenticated(pub Option<Principal>);

impl MaybeAuthenticated {
    pub fn principal(&self) -> Option<&Principal> {
        self.0.as_ref()
    }
}

impl FromRequest for MaybeAuthenticated {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let prepared = http_state(req).and_then(|state| Ok((state, bearer_token(req.headers())?)));
        Box::pin(async move {
            let (state, token) = prepared?;
            Ok(Self(resolve(state, token).await?))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::HeaderValue;
    use rstest::rstest;

    fn headers(value: Option<&'static str>) -> HeaderMap {
        let mut map = HeaderMap::new();
        if let Some(value) = value {
            map.insert(header::AUTHORIZATION, HeaderValue::from_static(value));
        }
        map
    }

    #[rstest]
    #[case(None, None)]
    #[case(Some("Bearer abc.def"), Some("abc.def"))]
    #[case(Some("bearer  abc "), Some("abc"))]
    fn extracts_bearer_tokens(#[case] header: Option<&'static str>, #[case] expected: Option<&str>) {
        let token = bearer_token(&headers(header)).expect("token");
        assert_eq!(token.as_deref(), expected);
    }

    #[rstest]
    #[case("Basic YWRhOnB3")]
    #[case("Bearer ")]
    fn rejects_other_schemes(#[case] header: &'static str) {
        let err = bearer_token(&headers(Some(header))).expect_err("rejected");
        assert_eq!(err.code(), crate::domain::ErrorCode::Unauthorized);
    }
}
