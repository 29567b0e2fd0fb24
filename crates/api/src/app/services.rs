use std::sync::Arc;

use recipebook_auth::{AuthorizationPolicy, IdentityResolver, PasswordError, PasswordHasher, TokenCodec};
use recipebook_core::Storage;
use recipebook_validation::{SchemaError, Schemas, ValidationEngine};
use thiserror::Error;

use crate::app::errors::ApiFailure;
use crate::config::ApiConfig;
use crate::guard::RequestGuard;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build validation schemas: {0}")]
    Schemas(#[from] SchemaError),

    #[error("failed to prepare password hashing: {0}")]
    Passwords(#[from] PasswordError),
}

/// Everything handlers need, built once at startup and shared.
pub struct AppServices {
    pub config: ApiConfig,
    pub storage: Arc<dyn Storage>,
    pub guard: RequestGuard,
    pub validation: ValidationEngine,
    pub passwords: PasswordHasher,
    /// Hash at the configured cost, verified against when a login names no
    /// account so both login failures cost one bcrypt run.
    decoy_hash: String,
}

impl AppServices {
    pub fn new(config: ApiConfig, storage: Arc<dyn Storage>) -> Result<Self, StartupError> {
        let codec = TokenCodec::new(config.jwt_secret.as_bytes(), config.token_ttl);
        let guard = RequestGuard::new(
            IdentityResolver::new(codec, Arc::clone(&storage)),
            Arc::new(AuthorizationPolicy::standard()),
            Arc::clone(&storage),
        );
        let validation = ValidationEngine::new(Arc::new(Schemas::standard()?));
        let passwords = PasswordHasher::new(config.bcrypt_cost);
        let decoy_hash = passwords.hash("recipebook decoy password")?;

        Ok(Self {
            config,
            storage,
            guard,
            validation,
            passwords,
            decoy_hash,
        })
    }

    pub fn tokens(&self) -> &TokenCodec {
        self.guard.identity_resolver().codec()
    }

    /// bcrypt is deliberately slow; keep it off the async workers.
    pub async fn hash_password(&self, password: String) -> Result<String, ApiFailure> {
        let hasher = self.passwords;
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| ApiFailure::Backend(e.to_string()))?
            .map_err(ApiFailure::from)
    }

    pub async fn verify_password(&self, password: String, hash: String) -> bool {
        let hasher = self.passwords;
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .unwrap_or(false)
    }

    /// Verify against the account's hash, or the decoy when there is none.
    pub async fn verify_login(&self, password: String, hash: Option<String>) -> bool {
        let found = hash.is_some();
        let verified = self
            .verify_password(password, hash.unwrap_or_else(|| self.decoy_hash.clone()))
            .await;
        found && verified
    }

    /// `Set-Cookie` value carrying a freshly issued session token.
    pub fn session_cookie(&self, token: &str) -> String {
        format!(
            "{}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
            self.config.session_cookie,
            self.config.token_ttl.num_seconds()
        )
    }

    /// `Set-Cookie` value that removes the session cookie.
    pub fn cleared_session_cookie(&self) -> String {
        format!(
            "{}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0",
            self.config.session_cookie
        )
    }
}
