//! JWT signing and verification. Trimmed from the teacher's pluggable
//! `AuthenticationBase`/strategy machinery down to the one strategy this
//! engine actually needs: a bearer access token carrying the caller's
//! `UserId`, checked at the `mg-api` boundary.

use anyhow::Result;
use chrono::Utc;
use mg_core::errors::DogError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::options::{JwtAlgorithm, JwtOptions, TokenType};

/// Claims carried by an access token. `sub` is the caller's user id as a
/// string (parsed into `mg_core::UserId` by callers that need it typed).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub iss: String,
    pub aud: Vec<String>,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub trait JwtProvider: Send + Sync {
    fn sign(&self, jwt: &JwtOptions, claims: &Claims, token_type: TokenType) -> Result<String>;
    fn verify(&self, jwt: &JwtOptions, token: &str) -> Result<Claims>;
}

fn algorithm(alg: &JwtAlgorithm) -> jsonwebtoken::Algorithm {
    match alg {
        JwtAlgorithm::HS256 => jsonwebtoken::Algorithm::HS256,
        JwtAlgorithm::HS384 => jsonwebtoken::Algorithm::HS384,
        JwtAlgorithm::HS512 => jsonwebtoken::Algorithm::HS512,
        JwtAlgorithm::RS256 => jsonwebtoken::Algorithm::RS256,
        JwtAlgorithm::RS384 => jsonwebtoken::Algorithm::RS384,
        JwtAlgorithm::RS512 => jsonwebtoken::Algorithm::RS512,
        JwtAlgorithm::ES256 => jsonwebtoken::Algorithm::ES256,
        JwtAlgorithm::ES384 => jsonwebtoken::Algorithm::ES384,
    }
}

struct JsonwebtokenProvider;

impl JwtProvider for JsonwebtokenProvider {
    fn sign(&self, jwt: &JwtOptions, claims: &Claims, token_type: TokenType) -> Result<String> {
        use jsonwebtoken::{encode, EncodingKey, Header};

        let secret = jwt
            .secret
            .as_ref()
            .ok_or_else(|| DogError::not_authenticated("JWT secret is not configured").into_anyhow())?;

        let mut header = Header::new(algorithm(&jwt.algorithm));
        header.typ = Some(
            match token_type {
                TokenType::Access => "access",
                TokenType::Refresh => "refresh",
            }
            .to_string(),
        );

        encode(&header, claims, &EncodingKey::from_secret(secret.as_bytes()))
            .map_err(|e| DogError::not_authenticated(e.to_string()).into_anyhow())
    }

    fn verify(&self, jwt: &JwtOptions, token: &str) -> Result<Claims> {
        use jsonwebtoken::{decode, DecodingKey, Validation};

        let secret = jwt
            .secret
            .as_ref()
            .ok_or_else(|| DogError::not_authenticated("JWT secret is not configured").into_anyhow())?;

        let mut validation = Validation::new(algorithm(&jwt.algorithm));
        validation.set_issuer(&[jwt.issuer.as_str()]);
        validation.set_audience(&jwt.audience.iter().map(String::as_str).collect::<Vec<_>>());

        decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
            .map(|data| data.claims)
            .map_err(|e| DogError::not_authenticated(e.to_string()).into_anyhow())
    }
}

/// Encodes and verifies access/refresh tokens against one `JwtOptions`
/// configuration. Holds no state beyond the config — cheap to construct
/// per-request or share behind an `Arc` in app state.
pub struct JwtService {
    options: JwtOptions,
    provider: Box<dyn JwtProvider>,
}

impl JwtService {
    pub fn new(options: JwtOptions) -> Self {
        Self { options, provider: Box::new(JsonwebtokenProvider) }
    }

    pub fn create_access_token(&self, user_id: &str) -> Result<String> {
        self.create_token(user_id, TokenType::Access, self.options.access_token_expires_in.as_secs())
    }

    pub fn create_refresh_token(&self, user_id: &str) -> Result<String> {
        self.create_token(user_id, TokenType::Refresh, self.options.refresh_token_expires_in.as_secs())
    }

    fn create_token(&self, user_id: &str, token_type: TokenType, expires_in_seconds: u64) -> Result<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            iss: self.options.issuer.clone(),
            aud: self.options.audience.clone(),
            iat: now,
            exp: now + expires_in_seconds as i64,
            jti: Uuid::new_v4().to_string(),
            extra: self
                .options
                .custom_claims
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        };
        self.provider.sign(&self.options, &claims, token_type)
    }

    pub fn verify_access_token(&self, token: &str) -> Result<Claims> {
        self.provider.verify(&self.options, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> JwtService {
        JwtService::new(JwtOptions { secret: Some("test-secret".to_string()), ..JwtOptions::default() })
    }

    #[test]
    fn round_trips_an_access_token() {
        let svc = service();
        let token = svc.create_access_token("user-123").unwrap();
        let claims = svc.verify_access_token(&token).unwrap();
        assert_eq!(claims.sub, "user-123");
    }

    #[test]
    fn rejects_a_token_from_a_different_secret() {
        let svc = service();
        let token = svc.create_access_token("user-123").unwrap();

        let other = JwtService::new(JwtOptions { secret: Some("other-secret".to_string()), ..JwtOptions::default() });
        assert!(other.verify_access_token(&token).is_err());
    }
}
