//! User accounts.

use serde::Serialize;

use crate::{RecipeId, UserId};

/// A registered user account.
///
/// # Invariants
/// - `password_hash` is never serialised.
/// - `favorites` holds each recipe id at most once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAccount {
    pub id: UserId,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub admin: bool,
    pub favorites: Vec<RecipeId>,
}

impl UserAccount {
    /// A new, non-admin account with no favorites.
    pub fn new(id: UserId, name: String, email: String, password_hash: String) -> Self {
        Self {
            id,
            name,
            email,
            password_hash,
            admin: false,
            favorites: Vec::new(),
        }
    }

    /// Add (`value = true`) or remove (`value = false`) a favorite.
    ///
    /// Returns `true` if the list changed.
    pub fn set_favorite(&mut self, recipe_id: RecipeId, value: bool) -> bool {
        let present = self.favorites.contains(&recipe_id);
        match (value, present) {
            (true, false) => {
                self.favorites.push(recipe_id);
                true
            }
            (false, true) => {
                self.favorites.retain(|id| *id != recipe_id);
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> UserAccount {
        UserAccount::new(
            UserId::new(),
            "alice".to_string(),
            "alice@example.com".to_string(),
            "$2b$hash".to_string(),
        )
    }

    #[test]
    fn favorites_have_set_semantics() {
        let mut user = account();
        let recipe = RecipeId::new();

        assert!(user.set_favorite(recipe, true));
        assert!(!user.set_favorite(recipe, true));
        assert_eq!(user.favorites, vec![recipe]);

        assert!(user.set_favorite(recipe, false));
        assert!(!user.set_favorite(recipe, false));
        assert!(user.favorites.is_empty());
    }

    #[test]
    fn password_hash_is_not_serialized() {
        let value = serde_json::to_value(account()).unwrap();
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["admin"], serde_json::json!(false));
    }
}
