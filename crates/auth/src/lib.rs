//! `tabs-auth` — the authentication gate in front of protected endpoints.
//!
//! This crate is intentionally decoupled from HTTP and storage: it verifies a
//! bearer token and yields the authenticated principal, nothing more.

pub mod claims;
pub mod principal;
pub mod validator;

pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use principal::PrincipalId;
pub use validator::{Hs256JwtValidator, JwtValidator};
