//! Bearer-JWT boundary. Grounded on `dog-auth::jwt::JwtStrategy`'s header
//! parsing (same `Authorization: <scheme> <token>` scan, same scheme list)
//! but as a plain Axum extractor instead of a `DogApp`-coupled strategy —
//! there is no multi-strategy authentication service left to plug into.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use mg_core::errors::DogError;
use mg_core::UserId;

use crate::error::ApiError;
use crate::state::AppState;

const SCHEMES: &[&str] = &["Bearer", "JWT"];

/// The caller's identity, verified against the configured JWT secret.
/// Extracting this from a handler's arguments is the whole authorization
/// check — there is no separate middleware layer to remember to add.
pub struct AuthenticatedUser(pub UserId);

fn bearer_token(parts: &Parts) -> Option<&str> {
    let raw = parts.headers.get("authorization")?.to_str().ok()?;
    let raw = raw.trim();
    let (scheme, token) = raw.split_once(' ')?;
    if SCHEMES.iter().any(|s| s.eq_ignore_ascii_case(scheme)) {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token);
        }
    }
    None
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)
            .ok_or_else(|| DogError::not_authenticated("missing bearer token").into_anyhow())?;

        let claims = state
            .jwt
            .verify_access_token(token)
            .map_err(|e| DogError::not_authenticated(e.to_string()).into_anyhow())?;

        Ok(AuthenticatedUser(UserId::from(claims.sub)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut req = axum::http::Request::builder().body(()).unwrap();
        if let Some(h) = header {
            req.headers_mut().insert("authorization", HeaderValue::from_str(h).unwrap());
        }
        req.into_parts().0
    }

    #[test]
    fn accepts_bearer_scheme() {
        let parts = parts_with(Some("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&parts), Some("abc.def.ghi"));
    }

    #[test]
    fn rejects_unknown_scheme() {
        let parts = parts_with(Some("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&parts), None);
    }

    #[test]
    fn rejects_missing_header() {
        let parts = parts_with(None);
        assert_eq!(bearer_token(&parts), None);
    }
}
