//! Account schemas and typed account payloads.

use serde::Deserialize;
use serde_json::Value;

use crate::schema::{CrossFieldRule, FieldSpec, Pattern, Schema, StringRule, ValueRule};
use crate::{PayloadKind, ValidationEngine, ValidationError};

const EMAIL_PATTERN: &str = r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$";
const NAME_PATTERN: &str = r"^[\p{L}\p{N}]+$";

/// Compiled per-field rules shared by the account payload kinds.
pub(crate) struct UserFields {
    name: ValueRule,
    email: ValueRule,
    password: ValueRule,
}

impl UserFields {
    pub(crate) fn compile() -> Result<Self, regex::Error> {
        Ok(Self {
            name: ValueRule::String(
                StringRule::trimmed(2, 50)
                    .with_pattern(Pattern::new(NAME_PATTERN, "must only contain letters and digits")?),
            ),
            email: ValueRule::String(
                StringRule::non_empty().with_pattern(Pattern::new(EMAIL_PATTERN, "must be a valid email address")?),
            ),
            password: ValueRule::String(StringRule::raw(8, 50)),
        })
    }

    pub(crate) fn registration(&self) -> Schema {
        Schema::new(vec![
            FieldSpec::required("name", self.name.clone()),
            FieldSpec::required("email", self.email.clone()),
            FieldSpec::required("password", self.password.clone()),
            FieldSpec::required("confirmPassword", ValueRule::String(StringRule::raw(1, 50))),
        ])
        .with_cross(CrossFieldRule::EqualsSibling {
            field: "confirmPassword",
            other: "password",
            message: "must match password",
        })
    }

    pub(crate) fn name_only(&self) -> Schema {
        Schema::new(vec![FieldSpec::required("name", self.name.clone())])
    }

    pub(crate) fn email_only(&self) -> Schema {
        Schema::new(vec![FieldSpec::required("email", self.email.clone())])
    }

    pub(crate) fn password_only(&self) -> Schema {
        Schema::new(vec![FieldSpec::required("password", self.password.clone())])
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl ValidationEngine {
    pub fn validate_registration(&self, payload: &Value) -> Result<Registration, ValidationError> {
        self.validate_into(PayloadKind::Registration, payload)
    }

    /// Validate one account field on its own, returning the normalised value.
    pub fn validate_user_field(&self, kind: PayloadKind, field: &str, value: &Value) -> Result<String, ValidationError> {
        let mut payload = serde_json::Map::new();
        payload.insert(field.to_string(), value.clone());
        let normalized = self.validate(kind, &Value::Object(payload))?;
        Ok(normalized
            .get(field)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string())
    }
}
