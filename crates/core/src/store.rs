//! Storage collaborator ports.
//!
//! The persistence mechanics live elsewhere; the domain only relies on these
//! lookups and by-id mutations. Implementations must be safe for unlimited
//! concurrent use.

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::{Recipe, RecipeId, RecipeRef, UserAccount, UserId};

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_account_by_id(&self, id: UserId) -> StorageResult<Option<UserAccount>>;

    /// Case-insensitive exact match on the account name.
    async fn find_account_by_name(&self, name: &str) -> StorageResult<Option<UserAccount>>;

    /// Case-insensitive exact match on the account email.
    async fn find_account_by_email(&self, email: &str) -> StorageResult<Option<UserAccount>>;

    async fn list_accounts(&self) -> StorageResult<Vec<UserAccount>>;

    async fn create_account(&self, account: UserAccount) -> StorageResult<()>;

    /// Replace the stored account with the same id (`NotFound` if absent).
    async fn update_account(&self, account: UserAccount) -> StorageResult<()>;

    async fn delete_account(&self, id: UserId) -> StorageResult<()>;
}

#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Ownership/visibility projection only.
    async fn find_recipe_ref(&self, id: RecipeId) -> StorageResult<Option<RecipeRef>>;

    async fn find_recipe(&self, id: RecipeId) -> StorageResult<Option<Recipe>>;

    async fn list_recipes(&self) -> StorageResult<Vec<Recipe>>;

    async fn create_recipe(&self, recipe: Recipe) -> StorageResult<()>;

    /// Replace the stored recipe with the same id (`NotFound` if absent).
    async fn update_recipe(&self, recipe: Recipe) -> StorageResult<()>;

    async fn delete_recipe(&self, id: RecipeId) -> StorageResult<()>;
}

/// The full storage collaborator.
pub trait Storage: AccountStore + RecipeStore {}

impl<T> Storage for T where T: AccountStore + RecipeStore {}
