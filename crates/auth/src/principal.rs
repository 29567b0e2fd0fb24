use serde::Serialize;

use recipebook_core::{UserAccount, UserId};

use crate::Role;

/// A resolved, authenticated identity.
///
/// Ephemeral: rebuilt on every request from a verified credential.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Principal {
    pub id: UserId,
    pub role: Role,
}

impl Principal {
    pub fn new(id: UserId, role: Role) -> Self {
        Self { id, role }
    }

    pub fn from_account(account: &UserAccount) -> Self {
        Self {
            id: account.id,
            role: Role::of(account),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Who is making a request: a principal, or nobody in particular.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    Principal(Principal),
}

impl Identity {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            Self::Anonymous => None,
            Self::Principal(p) => Some(p),
        }
    }
}

impl From<Principal> for Identity {
    fn from(value: Principal) -> Self {
        Self::Principal(value)
    }
}
