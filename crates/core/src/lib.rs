//! `recipebook-core`: domain documents, identifiers and storage ports.
//!
//! This crate contains **pure domain** types; the storage collaborator is
//! only described here (see [`store`]), never implemented.

pub mod account;
pub mod error;
pub mod id;
pub mod recipe;
pub mod store;

pub use account::UserAccount;
pub use error::{DomainError, StorageError, StorageResult};
pub use id::{RecipeId, UserId};
pub use recipe::{
    Recipe, RecipeBody, RecipeDuration, RecipeIngredient, RecipeOwner, RecipeRef, RecipeStep,
    RecipeSubtitle, RecipeTag,
};
pub use store::{AccountStore, RecipeStore, Storage};
