use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use recipebook_core::{
    AccountStore, Recipe, RecipeId, RecipeRef, RecipeStore, StorageError, StorageResult, UserAccount,
    UserId,
};

/// In-memory storage for tests/dev.
///
/// Accounts and recipes live in separate maps. Listing is ordered by id,
/// which for v7 ids is creation order. The store can be switched
/// offline to exercise `BackendUnavailable` paths.
#[derive(Debug)]
pub struct InMemoryStore {
    accounts: RwLock<HashMap<UserId, UserAccount>>,
    recipes: RwLock<HashMap<RecipeId, Recipe>>,
    online: AtomicBool,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned<T>(_: T) -> StorageError {
    tracing::warn!("in-memory store lock poisoned");
    StorageError::unavailable("lock poisoned")
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            recipes: RwLock::new(HashMap::new()),
            online: AtomicBool::new(true),
        }
    }

    /// Simulate the backend going away (`false`) or coming back (`true`).
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> StorageResult<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(StorageError::unavailable("in-memory store is offline"))
        }
    }

    fn accounts(&self) -> StorageResult<RwLockReadGuard<'_, HashMap<UserId, UserAccount>>> {
        self.ensure_online()?;
        self.accounts.read().map_err(poisoned)
    }

    fn accounts_mut(&self) -> StorageResult<RwLockWriteGuard<'_, HashMap<UserId, UserAccount>>> {
        self.ensure_online()?;
        self.accounts.write().map_err(poisoned)
    }

    fn recipes(&self) -> StorageResult<RwLockReadGuard<'_, HashMap<RecipeId, Recipe>>> {
        self.ensure_online()?;
        self.recipes.read().map_err(poisoned)
    }

    fn recipes_mut(&self) -> StorageResult<RwLockWriteGuard<'_, HashMap<RecipeId, Recipe>>> {
        self.ensure_online()?;
        self.recipes.write().map_err(poisoned)
    }

    fn find_account_by(&self, matches: impl Fn(&UserAccount) -> bool) -> StorageResult<Option<UserAccount>> {
        Ok(self.accounts()?.values().find(|a| matches(a)).cloned())
    }
}

fn same_text(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Names and emails are unique across accounts, ignoring case.
fn ensure_no_clash(accounts: &HashMap<UserId, UserAccount>, account: &UserAccount) -> StorageResult<()> {
    let others = || accounts.values().filter(|other| other.id != account.id);
    if others().any(|other| same_text(&other.name, &account.name)) {
        return Err(StorageError::Conflict("name is already in use".to_string()));
    }
    if others().any(|other| same_text(&other.email, &account.email)) {
        return Err(StorageError::Conflict("email is already in use".to_string()));
    }
    Ok(())
}

#[async_trait]
impl AccountStore for InMemoryStore {
    async fn find_account_by_id(&self, id: UserId) -> StorageResult<Option<UserAccount>> {
        Ok(self.accounts()?.get(&id).cloned())
    }

    async fn find_account_by_name(&self, name: &str) -> StorageResult<Option<UserAccount>> {
        self.find_account_by(|a| same_text(&a.name, name))
    }

    async fn find_account_by_email(&self, email: &str) -> StorageResult<Option<UserAccount>> {
        self.find_account_by(|a| same_text(&a.email, email))
    }

    async fn list_accounts(&self) -> StorageResult<Vec<UserAccount>> {
        let mut accounts: Vec<_> = self.accounts()?.values().cloned().collect();
        accounts.sort_by_key(|a| a.id);
        Ok(accounts)
    }

    async fn create_account(&self, account: UserAccount) -> StorageResult<()> {
        let mut accounts = self.accounts_mut()?;
        ensure_no_clash(&accounts, &account)?;
        accounts.insert(account.id, account);
        Ok(())
    }

    async fn update_account(&self, account: UserAccount) -> StorageResult<()> {
        let mut accounts = self.accounts_mut()?;
        ensure_no_clash(&accounts, &account)?;
        match accounts.get_mut(&account.id) {
            Some(slot) => {
                *slot = account;
                Ok(())
            }
            None => Err(StorageError::NotFound),
        }
    }

    async fn delete_account(&self, id: UserId) -> StorageResult<()> {
        self.accounts_mut()?
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}

#[async_trait]
impl RecipeStore for InMemoryStore {
    async fn find_recipe_ref(&self, id: RecipeId) -> StorageResult<Option<RecipeRef>> {
        Ok(self.recipes()?.get(&id).map(Recipe::to_ref))
    }

    async fn find_recipe(&self, id: RecipeId) -> StorageResult<Option<Recipe>> {
        Ok(self.recipes()?.get(&id).cloned())
    }

    async fn list_recipes(&self) -> StorageResult<Vec<Recipe>> {
        let mut recipes: Vec<_> = self.recipes()?.values().cloned().collect();
        recipes.sort_by_key(|r| r.id);
        Ok(recipes)
    }

    async fn create_recipe(&self, recipe: Recipe) -> StorageResult<()> {
        self.recipes_mut()?.insert(recipe.id, recipe);
        Ok(())
    }

    async fn update_recipe(&self, recipe: Recipe) -> StorageResult<()> {
        match self.recipes_mut()?.get_mut(&recipe.id) {
            Some(slot) => {
                *slot = recipe;
                Ok(())
            }
            None => Err(StorageError::NotFound),
        }
    }

    async fn delete_recipe(&self, id: RecipeId) -> StorageResult<()> {
        self.recipes_mut()?
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }
}
