//! Recipe documents.
//!
//! `RecipeBody` is the editable part of a recipe (what a client sends and the
//! validation engine checks). `Recipe` wraps it with the fields only the
//! server controls: identity, ownership and publication state.

use serde::{Deserialize, Serialize};

use crate::{RecipeId, UserId};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeDuration {
    pub hours: u32,
    pub minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeTag {
    pub name: String,
    pub color: String,
}

/// A named section of the ingredient list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeSubtitle {
    pub index: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecipeIngredient {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    pub description: String,
    /// Must equal one of the owning recipe's `subtitles`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<RecipeSubtitle>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeStep {
    pub index: u32,
    pub title: String,
    pub description: String,
    /// In `[1, pages]` of the owning recipe.
    pub page_number: u32,
}

/// Owning identity of a recipe, denormalised for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeOwner {
    pub id: UserId,
    pub name: String,
}

/// Client-editable recipe content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub title: String,
    pub description: String,
    pub duration: RecipeDuration,
    #[serde(default)]
    pub tags: Vec<RecipeTag>,
    pub portion_size: u32,
    #[serde(default)]
    pub subtitles: Vec<RecipeSubtitle>,
    pub ingredients: Vec<RecipeIngredient>,
    pub pages: u32,
    pub instructions: Vec<RecipeStep>,
}

/// A stored recipe.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: RecipeId,
    #[serde(flatten)]
    pub body: RecipeBody,
    pub public: bool,
    pub user: RecipeOwner,
}

impl Recipe {
    /// A fresh, unpublished recipe owned by `user`.
    pub fn new(id: RecipeId, body: RecipeBody, user: RecipeOwner) -> Self {
        Self {
            id,
            body,
            public: false,
            user,
        }
    }

    pub fn owner_id(&self) -> UserId {
        self.user.id
    }

    pub fn to_ref(&self) -> RecipeRef {
        RecipeRef {
            owner_id: self.user.id,
            is_public: self.public,
        }
    }
}

/// Ownership/visibility projection of a recipe.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RecipeRef {
    pub owner_id: UserId,
    pub is_public: bool,
}
