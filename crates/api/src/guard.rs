//! Per-request pipeline: identity, resource, decision, handler.
//!
//! The stages run strictly in order and the first failure ends the request.
//! Every storage await races the request's cancellation token; a cancelled
//! request never reaches authorization or the handler.

use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use recipebook_auth::{
    Action, AuthFailure, AuthorizationPolicy, CredentialSource, Decision, DenyReason, Identity,
    IdentityResolver, Principal, ResourceRef,
};
use recipebook_core::{RecipeId, Storage, UserId};

use crate::app::errors::ApiFailure;

/// How the guard finds the resource an action targets.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResourceLoader {
    Recipe(RecipeId),
    Profile(UserId),
    /// No single target (listing, creating).
    Collection,
}

/// What a handler gets once the guard lets a request through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authorized {
    pub identity: Identity,
    pub resource: ResourceRef,
}

impl Authorized {
    /// The caller, for actions that never admit anonymity.
    pub fn principal(&self) -> Result<&Principal, ApiFailure> {
        self.identity
            .principal()
            .ok_or(ApiFailure::Authentication(AuthFailure::MissingCredential))
    }
}

/// Await `fut` unless `cancel` fires first.
pub async fn cancellable<F: Future>(cancel: &CancellationToken, fut: F) -> Result<F::Output, ApiFailure> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("request cancelled");
            Err(ApiFailure::Cancelled)
        }
        out = fut => Ok(out),
    }
}

#[derive(Clone)]
pub struct RequestGuard {
    identity: IdentityResolver<dyn Storage>,
    policy: Arc<AuthorizationPolicy>,
    storage: Arc<dyn Storage>,
}

impl RequestGuard {
    pub fn new(identity: IdentityResolver<dyn Storage>, policy: Arc<AuthorizationPolicy>, storage: Arc<dyn Storage>) -> Self {
        Self {
            identity,
            policy,
            storage,
        }
    }

    pub fn identity_resolver(&self) -> &IdentityResolver<dyn Storage> {
        &self.identity
    }

    pub fn policy(&self) -> &AuthorizationPolicy {
        &self.policy
    }

    /// Resolve the caller for `action`.
    ///
    /// A missing or bad credential is tolerated (as anonymity) only when the
    /// table lets anonymous callers perform `action` somewhere. An identity
    /// backend outage is never tolerated.
    pub async fn identify(
        &self,
        source: &dyn CredentialSource,
        action: Action,
        cancel: &CancellationToken,
    ) -> Result<Identity, ApiFailure> {
        let tolerates_anonymity = self.policy.admits_anonymous(action);

        match cancellable(cancel, self.identity.resolve(source)).await? {
            Ok(Identity::Anonymous) if !tolerates_anonymity => {
                debug!(%action, "anonymous caller rejected");
                Err(ApiFailure::Authentication(AuthFailure::MissingCredential))
            }
            Ok(identity) => Ok(identity),
            Err(AuthFailure::BackendUnavailable) => Err(AuthFailure::BackendUnavailable.into()),
            Err(failure) if tolerates_anonymity => {
                debug!(%action, reason = %failure, "continuing anonymously");
                Ok(Identity::Anonymous)
            }
            Err(failure) => {
                debug!(%action, reason = %failure, "authentication failed");
                Err(ApiFailure::Authentication(failure))
            }
        }
    }

    /// Load the ownership/visibility projection the decision needs.
    pub async fn load(&self, loader: ResourceLoader, cancel: &CancellationToken) -> Result<ResourceRef, ApiFailure> {
        match loader {
            ResourceLoader::Recipe(id) => cancellable(cancel, self.storage.find_recipe_ref(id))
                .await??
                .map(ResourceRef::from)
                .ok_or(ApiFailure::NotFound),
            ResourceLoader::Profile(id) => cancellable(cancel, self.storage.find_account_by_id(id))
                .await??
                .map(|account| ResourceRef::UserProfile { owner_id: account.id })
                .ok_or(ApiFailure::NotFound),
            ResourceLoader::Collection => Ok(ResourceRef::Collection),
        }
    }

    /// Apply the decision table and map a denial to a failure.
    ///
    /// Recipes the caller may not read are reported as missing, whatever the
    /// action; an anonymous denial asks the caller to authenticate.
    pub fn decide(&self, identity: &Identity, resource: &ResourceRef, action: Action) -> Result<(), ApiFailure> {
        let evaluation = self.policy.evaluate(identity, resource, action);
        let Decision::Deny(reason) = evaluation.decision else {
            return Ok(());
        };

        info!(
            %action,
            resource = resource.kind(),
            %reason,
            rule = evaluation.rule.unwrap_or("default"),
            "request denied"
        );

        let concealed = matches!(resource, ResourceRef::Recipe { .. })
            && !self.policy.authorize(identity, resource, Action::Read).is_allowed();

        if concealed {
            Err(ApiFailure::NotFound)
        } else if reason == DenyReason::Anonymous {
            Err(ApiFailure::Authentication(AuthFailure::MissingCredential))
        } else {
            Err(ApiFailure::Authorization(reason))
        }
    }

    /// Identity, resource and decision; the handler-free part of [`run`](Self::run).
    pub async fn check(
        &self,
        source: &dyn CredentialSource,
        action: Action,
        loader: ResourceLoader,
        cancel: &CancellationToken,
    ) -> Result<Authorized, ApiFailure> {
        let identity = self.identify(source, action, cancel).await?;
        let resource = self.load(loader, cancel).await?;
        self.decide(&identity, &resource, action)?;
        Ok(Authorized { identity, resource })
    }

    /// Run the whole pipeline, then `handler` if the request is allowed.
    pub async fn run<H, Fut, T>(
        &self,
        source: &dyn CredentialSource,
        action: Action,
        loader: ResourceLoader,
        cancel: &CancellationToken,
        handler: H,
    ) -> Result<T, ApiFailure>
    where
        H: FnOnce(Authorized) -> Fut,
        Fut: Future<Output = Result<T, ApiFailure>>,
    {
        let authorized = self.check(source, action, loader, cancel).await?;
        if cancel.is_cancelled() {
            return Err(ApiFailure::Cancelled);
        }
        handler(authorized).await
    }
}
