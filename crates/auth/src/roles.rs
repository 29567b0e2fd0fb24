use serde::{Deserialize, Serialize};

use recipebook_core::UserAccount;

/// Role of a principal.
///
/// Roles are derived from the account at resolution time, never from the
/// token, so revoking admin rights takes effect on the next request.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn of(account: &UserAccount) -> Self {
        if account.admin { Self::Admin } else { Self::User }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
