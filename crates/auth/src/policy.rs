//! Resource-scoped authorization as an ordered decision table.
//!
//! Each [`PolicyRule`] matches on (action, resource, subject) and yields an
//! effect; the first matching rule wins and no match denies. Adding an
//! action or a resource kind means adding rows, not branching logic.
//!
//! - No IO
//! - No panics
//! - Operates only on the ownership/visibility projection of a resource

use serde::Serialize;
use thiserror::Error;

use recipebook_core::{RecipeRef, UserId};

use crate::Identity;

/// Something a principal may try to do to a resource.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Read,
    Create,
    Write,
    Delete,
    Publish,
    AdministerUsers,
    ToggleFavorite,
}

impl Action {
    pub const ALL: [Action; 7] = [
        Action::Read,
        Action::Create,
        Action::Write,
        Action::Delete,
        Action::Publish,
        Action::AdministerUsers,
        Action::ToggleFavorite,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Create => "create",
            Self::Write => "write",
            Self::Delete => "delete",
            Self::Publish => "publish",
            Self::AdministerUsers => "administer_users",
            Self::ToggleFavorite => "toggle_favorite",
        }
    }
}

impl core::fmt::Display for Action {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minimal ownership/visibility projection of the resource acted upon.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResourceRef {
    Recipe { owner_id: UserId, is_public: bool },
    UserProfile { owner_id: UserId },
    /// A collection or service-level target with no single owner.
    Collection,
}

impl ResourceRef {
    pub fn owner_id(&self) -> Option<UserId> {
        match self {
            Self::Recipe { owner_id, .. } | Self::UserProfile { owner_id } => Some(*owner_id),
            Self::Collection => None,
        }
    }

    pub fn is_public_recipe(&self) -> bool {
        matches!(self, Self::Recipe { is_public: true, .. })
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Recipe { .. } => "recipe",
            Self::UserProfile { .. } => "user",
            Self::Collection => "collection",
        }
    }
}

impl From<RecipeRef> for ResourceRef {
    fn from(value: RecipeRef) -> Self {
        Self::Recipe {
            owner_id: value.owner_id,
            is_public: value.is_public,
        }
    }
}

#[derive(Debug, Error, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// No identity; the caller should authenticate.
    #[error("authentication required")]
    Anonymous,

    #[error("admin rights required")]
    AdminRightsRequired,

    #[error("owner rights required")]
    OwnerRightsRequired,

    #[error("rights required for this action")]
    RightsRequired,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ActionMatch {
    Any,
    OneOf(&'static [Action]),
}

impl ActionMatch {
    fn matches(&self, action: Action) -> bool {
        match self {
            Self::Any => true,
            Self::OneOf(actions) => actions.contains(&action),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResourceMatch {
    Any,
    PublicRecipe,
}

impl ResourceMatch {
    fn matches(&self, resource: &ResourceRef) -> bool {
        match self {
            Self::Any => true,
            Self::PublicRecipe => resource.is_public_recipe(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SubjectMatch {
    /// Including anonymous callers.
    Anyone,
    Anonymous,
    Authenticated,
    Admin,
    Owner,
}

impl SubjectMatch {
    fn matches(&self, identity: &Identity, resource: &ResourceRef) -> bool {
        match (self, identity.principal()) {
            (Self::Anyone, _) => true,
            (Self::Anonymous, p) => p.is_none(),
            (Self::Authenticated, p) => p.is_some(),
            (Self::Admin, Some(p)) => p.is_admin(),
            (Self::Owner, Some(p)) => resource.owner_id() == Some(p.id),
            (Self::Admin | Self::Owner, None) => false,
        }
    }

    fn admits_anonymous(&self) -> bool {
        matches!(self, Self::Anyone | Self::Anonymous)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PolicyRule {
    pub name: &'static str,
    pub actions: ActionMatch,
    pub resource: ResourceMatch,
    pub subject: SubjectMatch,
    pub effect: Decision,
}

impl PolicyRule {
    fn matches(&self, identity: &Identity, resource: &ResourceRef, action: Action) -> bool {
        self.actions.matches(action)
            && self.resource.matches(resource)
            && self.subject.matches(identity, resource)
    }
}

const ADMIN_ONLY: &[Action] = &[Action::Publish, Action::AdministerUsers];
const OWNER_ONLY: &[Action] = &[Action::ToggleFavorite];

/// The standard recipebook table, in evaluation order.
///
/// Publish stays admin-only even for the recipe owner: the admin-only rows
/// come before the ownership row.
pub const STANDARD_RULES: &[PolicyRule] = &[
    PolicyRule {
        name: "public-recipe-read",
        actions: ActionMatch::OneOf(&[Action::Read]),
        resource: ResourceMatch::PublicRecipe,
        subject: SubjectMatch::Anyone,
        effect: Decision::Allow,
    },
    PolicyRule {
        name: "anonymous",
        actions: ActionMatch::Any,
        resource: ResourceMatch::Any,
        subject: SubjectMatch::Anonymous,
        effect: Decision::Deny(DenyReason::Anonymous),
    },
    PolicyRule {
        name: "admin-only",
        actions: ActionMatch::OneOf(ADMIN_ONLY),
        resource: ResourceMatch::Any,
        subject: SubjectMatch::Admin,
        effect: Decision::Allow,
    },
    PolicyRule {
        name: "admin-only-denied",
        actions: ActionMatch::OneOf(ADMIN_ONLY),
        resource: ResourceMatch::Any,
        subject: SubjectMatch::Anyone,
        effect: Decision::Deny(DenyReason::AdminRightsRequired),
    },
    PolicyRule {
        name: "owner-only",
        actions: ActionMatch::OneOf(OWNER_ONLY),
        resource: ResourceMatch::Any,
        subject: SubjectMatch::Owner,
        effect: Decision::Allow,
    },
    PolicyRule {
        name: "owner-only-denied",
        actions: ActionMatch::OneOf(OWNER_ONLY),
        resource: ResourceMatch::Any,
        subject: SubjectMatch::Anyone,
        effect: Decision::Deny(DenyReason::OwnerRightsRequired),
    },
    PolicyRule {
        name: "authenticated-create",
        actions: ActionMatch::OneOf(&[Action::Create]),
        resource: ResourceMatch::Any,
        subject: SubjectMatch::Authenticated,
        effect: Decision::Allow,
    },
    PolicyRule {
        name: "owner",
        actions: ActionMatch::Any,
        resource: ResourceMatch::Any,
        subject: SubjectMatch::Owner,
        effect: Decision::Allow,
    },
    PolicyRule {
        name: "admin",
        actions: ActionMatch::Any,
        resource: ResourceMatch::Any,
        subject: SubjectMatch::Admin,
        effect: Decision::Allow,
    },
];

/// Outcome of an evaluation, with the rule that produced it (for audit logs).
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub decision: Decision,
    /// `None` when no rule matched and the default deny applied.
    pub rule: Option<&'static str>,
}

/// Ordered, first-match-wins authorization table.
#[derive(Debug, Clone)]
pub struct AuthorizationPolicy {
    rules: Vec<PolicyRule>,
}

impl Default for AuthorizationPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

impl AuthorizationPolicy {
    pub fn standard() -> Self {
        Self::from_rules(STANDARD_RULES.to_vec())
    }

    pub fn from_rules(rules: Vec<PolicyRule>) -> Self {
        Self { rules }
    }

    pub fn authorize(&self, identity: &Identity, resource: &ResourceRef, action: Action) -> Decision {
        self.evaluate(identity, resource, action).decision
    }

    pub fn evaluate(&self, identity: &Identity, resource: &ResourceRef, action: Action) -> Evaluation {
        self.rules
            .iter()
            .find(|rule| rule.matches(identity, resource, action))
            .map(|rule| Evaluation {
                decision: rule.effect,
                rule: Some(rule.name),
            })
            .unwrap_or(Evaluation {
                decision: Decision::Deny(DenyReason::RightsRequired),
                rule: None,
            })
    }

    /// Whether some resource could let an anonymous caller perform `action`.
    ///
    /// Derived from the table: walks the rows an anonymous subject can
    /// match, stopping at the first unconditional one.
    pub fn admits_anonymous(&self, action: Action) -> bool {
        for rule in &self.rules {
            if !rule.actions.matches(action) || !rule.subject.admits_anonymous() {
                continue;
            }
            if rule.effect.is_allowed() {
                return true;
            }
            if rule.resource == ResourceMatch::Any {
                return false;
            }
        }
        false
    }
}
