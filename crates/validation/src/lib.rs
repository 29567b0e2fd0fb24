//! `recipebook-validation`: declarative, collect-all payload validation.
//!
//! Schemas are data ([`schema`]); the [`ValidationEngine`] interprets them
//! and reports every violation in a payload at once. Account uniqueness
//! lives here too since it gates the same write paths.

pub mod engine;
pub mod error;
pub mod recipe;
pub mod registry;
pub mod schema;
pub mod uniqueness;
pub mod user;

pub use engine::{BODY_FIELD, ValidationEngine};
pub use error::{FieldError, SchemaError, UniquenessError, ValidationError, ValidationFailure};
pub use registry::{PayloadKind, Schemas};
pub use schema::{CrossFieldRule, FieldSpec, Pattern, Schema, StringRule, ValueRule};
pub use uniqueness::ensure_unique;
pub use user::Registration;
