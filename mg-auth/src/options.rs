//! JWT configuration only — the OAuth/API-key/local-strategy options the
//! teacher's auth crate carried are out of scope here (spec.md's collaborator
//! surface is a bearer-JWT boundary, nothing else).

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// JWT signing algorithms.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum JwtAlgorithm {
    HS256,
    HS384,
    HS512,
    RS256,
    RS384,
    RS512,
    ES256,
    ES384,
}

impl Default for JwtAlgorithm {
    fn default() -> Self {
        Self::HS256
    }
}

/// Token type for JWT claims.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum TokenType {
    Access,
    Refresh,
}

impl Default for TokenType {
    fn default() -> Self {
        Self::Access
    }
}

/// JWT signing/verification configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct JwtOptions {
    pub algorithm: JwtAlgorithm,
    pub issuer: String,
    pub audience: Vec<String>,
    #[serde(with = "humantime_serde")]
    pub access_token_expires_in: Duration,
    #[serde(with = "humantime_serde")]
    pub refresh_token_expires_in: Duration,
    pub custom_claims: HashMap<String, serde_json::Value>,
    /// Signing secret, for HMAC algorithms.
    pub secret: Option<String>,
    pub private_key_path: Option<String>,
    pub public_key_path: Option<String>,
}

impl Default for JwtOptions {
    fn default() -> Self {
        Self {
            algorithm: JwtAlgorithm::default(),
            issuer: "mg-auth".to_string(),
            audience: vec!["mg-api".to_string()],
            access_token_expires_in: Duration::from_secs(3600),
            refresh_token_expires_in: Duration::from_secs(604_800),
            custom_claims: HashMap::new(),
            secret: None,
            private_key_path: None,
            public_key_path: None,
        }
    }
}

impl JwtOptions {
    pub fn validate(&self) -> Result<(), String> {
        if self.issuer.is_empty() {
            return Err("JWT issuer cannot be empty".to_string());
        }
        if self.audience.is_empty() {
            return Err("JWT audience cannot be empty".to_string());
        }

        match self.algorithm {
            JwtAlgorithm::HS256 | JwtAlgorithm::HS384 | JwtAlgorithm::HS512 => {
                if self.secret.is_none() {
                    return Err("HMAC algorithms require a secret".to_string());
                }
            }
            JwtAlgorithm::RS256 | JwtAlgorithm::RS384 | JwtAlgorithm::RS512 | JwtAlgorithm::ES256 | JwtAlgorithm::ES384 => {
                if self.private_key_path.is_none() && self.public_key_path.is_none() {
                    return Err("RSA/ECDSA algorithms require key files".to_string());
                }
            }
        }

        if self.access_token_expires_in.as_secs() == 0 {
            return Err("Access token expiration must be greater than 0".to_string());
        }
        if self.refresh_token_expires_in.as_secs() == 0 {
            return Err("Refresh token expiration must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hmac_without_secret_fails_validation() {
        let opts = JwtOptions { secret: None, ..JwtOptions::default() };
        assert!(opts.validate().is_err());
    }

    #[test]
    fn default_options_with_secret_validate() {
        let opts = JwtOptions { secret: Some("shh".to_string()), ..JwtOptions::default() };
        assert!(opts.validate().is_ok());
    }
}
