use recipebook_core::StorageError;
use serde::Serialize;
use thiserror::Error;

use crate::PayloadKind;

/// One violated rule, addressed by its path in the payload
/// (e.g. `ingredients[0].subtitle`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Every violation found in a payload, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind} data ({} violation(s))", .details.len())]
pub struct ValidationFailure {
    pub kind: PayloadKind,
    pub details: Vec<FieldError>,
}

impl ValidationFailure {
    pub fn message(&self) -> String {
        format!("invalid {} data", self.kind)
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.details.iter().any(|d| d.field == field)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Invalid(ValidationFailure),

    #[error("no schema registered for payload kind {0}")]
    UnknownKind(PayloadKind),
}

#[derive(Debug, Error)]
pub enum UniquenessError {
    #[error("name is already in use")]
    NameTaken,

    #[error("email is already in use")]
    EmailTaken,

    #[error(transparent)]
    Backend(#[from] StorageError),
}

/// A schema pattern failed to compile.
#[derive(Debug, Error)]
#[error("invalid schema pattern: {0}")]
pub struct SchemaError(#[from] regex::Error);
