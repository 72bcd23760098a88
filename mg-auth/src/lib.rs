//! JWT issuance and verification for the job engine's collaborator-facing
//! API. Trimmed from the teacher's pluggable multi-strategy authentication
//! framework (OAuth, API-key, local/basic, connection hooks) down to the
//! one boundary spec.md actually calls for: a bearer access token.

pub mod jwt;
pub mod options;

pub use jwt::{Claims, JwtProvider, JwtService};
pub use options::{JwtAlgorithm, JwtOptions, TokenType};
