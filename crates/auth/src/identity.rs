//! Request identity resolution.
//!
//! Turns whatever credential a transport supplies into an [`Identity`].
//! The transport (bearer header, session cookie, ...) only has to implement
//! [`CredentialSource`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use recipebook_core::{AccountStore, StorageError};

use crate::{Identity, Principal, TokenCodec};

/// Authentication failure taxonomy.
///
/// Callers match on the variant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthFailure {
    #[error("authentication required")]
    MissingCredential,

    #[error("invalid credentials")]
    MalformedCredential,

    #[error("credential expired")]
    ExpiredCredential,

    #[error("invalid credentials")]
    UnknownSubject,

    #[error("identity backend unavailable")]
    BackendUnavailable,
}

/// Supplies at most one opaque token for a request.
///
/// `Ok(None)` means the request carries no credential at all (anonymous);
/// `Err(MalformedCredential)` means something credential-shaped was present
/// but unusable.
pub trait CredentialSource: Send + Sync {
    fn token(&self) -> Result<Option<&str>, AuthFailure>;
}

impl CredentialSource for Option<String> {
    fn token(&self) -> Result<Option<&str>, AuthFailure> {
        Ok(self.as_deref())
    }
}

impl CredentialSource for &str {
    fn token(&self) -> Result<Option<&str>, AuthFailure> {
        Ok(Some(*self))
    }
}

/// Verifies credentials and maps their subject to a [`Principal`].
///
/// Stateless apart from its collaborators; one call per request.
pub struct IdentityResolver<S: ?Sized> {
    codec: TokenCodec,
    accounts: Arc<S>,
}

impl<S: ?Sized> Clone for IdentityResolver<S> {
    fn clone(&self) -> Self {
        Self {
            codec: self.codec.clone(),
            accounts: Arc::clone(&self.accounts),
        }
    }
}

impl<S> IdentityResolver<S>
where
    S: AccountStore + ?Sized,
{
    pub fn new(codec: TokenCodec, accounts: Arc<S>) -> Self {
        Self { codec, accounts }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub async fn resolve(&self, source: &dyn CredentialSource) -> Result<Identity, AuthFailure> {
        self.resolve_at(source, Utc::now()).await
    }

    /// Resolve against an explicit clock.
    pub async fn resolve_at(
        &self,
        source: &dyn CredentialSource,
        now: DateTime<Utc>,
    ) -> Result<Identity, AuthFailure> {
        let Some(token) = source.token()? else {
            return Ok(Identity::Anonymous);
        };

        let claims = self.codec.decode(token, now).inspect_err(|e| {
            debug!(reason = %e, "credential rejected");
        })?;

        let account = self
            .accounts
            .find_account_by_id(claims.sub)
            .await
            .map_err(|e| match e {
                StorageError::NotFound => AuthFailure::UnknownSubject,
                StorageError::Conflict(_) | StorageError::BackendUnavailable(_) => {
                    AuthFailure::BackendUnavailable
                }
            })?
            .ok_or_else(|| {
                debug!(subject = %claims.sub, "credential subject has no account");
                AuthFailure::UnknownSubject
            })?;

        Ok(Identity::Principal(Principal::from_account(&account)))
    }

    /// Like [`resolve`](Self::resolve), but anonymity is a failure.
    pub async fn require(&self, source: &dyn CredentialSource) -> Result<Principal, AuthFailure> {
        match self.resolve(source).await? {
            Identity::Principal(p) => Ok(p),
            Identity::Anonymous => Err(AuthFailure::MissingCredential),
        }
    }
}
