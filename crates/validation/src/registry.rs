use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::schema::Schema;
use crate::{SchemaError, recipe, user};

/// Which schema a payload is validated against.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    Recipe,
    Registration,
    UserName,
    UserEmail,
    UserPassword,
}

impl PayloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadKind::Recipe => "recipe",
            PayloadKind::Registration => "registration",
            PayloadKind::UserName => "user name",
            PayloadKind::UserEmail => "user email",
            PayloadKind::UserPassword => "user password",
        }
    }
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The schema set an engine validates against.
#[derive(Debug, Clone, Default)]
pub struct Schemas {
    by_kind: HashMap<PayloadKind, Schema>,
}

impl Schemas {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The schemas the service ships with. Patterns are compiled here, once.
    pub fn standard() -> Result<Self, SchemaError> {
        let users = user::UserFields::compile()?;
        Ok(Self::empty()
            .with(PayloadKind::Recipe, recipe::schema())
            .with(PayloadKind::Registration, users.registration())
            .with(PayloadKind::UserName, users.name_only())
            .with(PayloadKind::UserEmail, users.email_only())
            .with(PayloadKind::UserPassword, users.password_only()))
    }

    pub fn with(mut self, kind: PayloadKind, schema: Schema) -> Self {
        self.by_kind.insert(kind, schema);
        self
    }

    pub fn get(&self, kind: PayloadKind) -> Option<&Schema> {
        self.by_kind.get(&kind)
    }
}
