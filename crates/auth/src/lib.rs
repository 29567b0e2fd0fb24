//! `recipebook-auth`: identity resolution and resource-scoped authorization.
//!
//! This crate is decoupled from HTTP; storage is reached only through the
//! `AccountStore` port from `recipebook-core`.

pub mod claims;
pub mod identity;
pub mod password;
pub mod policy;
pub mod principal;
pub mod roles;

pub use claims::{JwtClaims, TokenCodec, TokenIssueError, TokenValidationError, validate_claims};
pub use identity::{AuthFailure, CredentialSource, IdentityResolver};
pub use password::{PasswordError, PasswordHasher};
pub use policy::{Action, AuthorizationPolicy, Decision, DenyReason, Evaluation, PolicyRule, ResourceRef};
pub use principal::{Identity, Principal};
pub use roles::Role;
