use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use serde_json::Value;

use recipebook_auth::{Action, ResourceRef};
use recipebook_core::{UserAccount, UserId};
use recipebook_validation::{ensure_unique, FieldError, PayloadKind, ValidationError, ValidationFailure};

use crate::app::dto::{self, FavoriteRequest};
use crate::app::errors::ApiFailure;
use crate::app::services::AppServices;
use crate::context::{RequestCancellation, RequestCredential};
use crate::guard::{cancellable, Authorized, ResourceLoader};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/:id/favorites", put(set_favorite))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(credential): Extension<RequestCredential>,
    Extension(cancel): Extension<RequestCancellation>,
) -> Result<Response, ApiFailure> {
    let cancel = cancel.token();
    let services = services.as_ref();
    services
        .guard
        .run(&credential, Action::AdministerUsers, ResourceLoader::Collection, cancel, |_| async move {
            let accounts = cancellable(cancel, services.storage.list_accounts()).await??;
            Ok(Json(accounts).into_response())
        })
        .await
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(credential): Extension<RequestCredential>,
    Extension(cancel): Extension<RequestCancellation>,
    Path(id): Path<String>,
) -> Result<Response, ApiFailure> {
    let id: UserId = dto::parse_id(&id, "user")?;
    let cancel = cancel.token();
    let services = services.as_ref();
    services
        .guard
        .run(&credential, Action::Read, ResourceLoader::Profile(id), cancel, |_| async move {
            let account = load_account(services, id, cancel).await?;
            Ok(Json(account).into_response())
        })
        .await
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(credential): Extension<RequestCredential>,
    Extension(cancel): Extension<RequestCancellation>,
    Path(id): Path<String>,
) -> Result<Response, ApiFailure> {
    let id: UserId = dto::parse_id(&id, "user")?;
    let cancel = cancel.token();
    let services = services.as_ref();
    services
        .guard
        .run(&credential, Action::Delete, ResourceLoader::Profile(id), cancel, |_| async move {
            cancellable(cancel, services.storage.delete_account(id)).await??;
            tracing::info!(user_id = %id, "account deleted");
            Ok(StatusCode::NO_CONTENT.into_response())
        })
        .await
}

/// Partial profile edit: `{name?, email?, password?, newPassword?}`.
///
/// Uniqueness (excluding the account itself) is checked first; then every
/// present field is validated on its own and all violations are reported
/// together. A new password needs the current one.
pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(credential): Extension<RequestCredential>,
    Extension(cancel): Extension<RequestCancellation>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiFailure> {
    let id: UserId = dto::parse_id(&id, "user")?;
    let cancel = cancel.token();
    let services = services.as_ref();
    services
        .guard
        .run(&credential, Action::Write, ResourceLoader::Profile(id), cancel, |_| async move {
            let payload = dto::json_body(body)?;
            if !payload.is_object() {
                return Err(ApiFailure::BadRequest("payload must be a JSON object".to_string()));
            }

            cancellable(
                cancel,
                ensure_unique(
                    services.storage.as_ref(),
                    dto::str_field(&payload, "name"),
                    dto::str_field(&payload, "email"),
                    Some(id),
                ),
            )
            .await??;

            let edit = ProfileEdit::validate(services, &payload)?;
            let mut account = load_account(services, id, cancel).await?;

            if let Some(new_password) = edit.new_password {
                let current = edit.current_password.unwrap_or_default();
                if !services.verify_password(current, account.password_hash.clone()).await {
                    return Err(ApiFailure::Validation(ValidationFailure {
                        kind: PayloadKind::UserPassword,
                        details: vec![FieldError::new("password", "password does not match the current password")],
                    }));
                }
                account.password_hash = services.hash_password(new_password).await?;
            }
            if let Some(name) = edit.name {
                account.name = name;
            }
            if let Some(email) = edit.email {
                account.email = email;
            }

            cancellable(cancel, services.storage.update_account(account.clone())).await??;
            tracing::info!(user_id = %id, "account updated");
            Ok(Json(account).into_response())
        })
        .await
}

/// Add or remove a favorite recipe; owner only.
pub async fn set_favorite(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(credential): Extension<RequestCredential>,
    Extension(cancel): Extension<RequestCancellation>,
    Path(id): Path<String>,
    body: Result<Json<FavoriteRequest>, JsonRejection>,
) -> Result<Response, ApiFailure> {
    let id: UserId = dto::parse_id(&id, "user")?;
    let cancel = cancel.token();
    let services = services.as_ref();
    services
        .guard
        .run(&credential, Action::ToggleFavorite, ResourceLoader::Profile(id), cancel, |auth| async move {
            let Json(request) = body.map_err(|rejection| ApiFailure::BadRequest(rejection.body_text()))?;
            ensure_readable_recipe(services, &auth, request.recipe_id, cancel).await?;

            let mut account = load_account(services, id, cancel).await?;
            if account.set_favorite(request.recipe_id, request.value) {
                cancellable(cancel, services.storage.update_account(account.clone())).await??;
            }
            Ok(Json(account).into_response())
        })
        .await
}

async fn load_account(
    services: &AppServices,
    id: UserId,
    cancel: &tokio_util::sync::CancellationToken,
) -> Result<UserAccount, ApiFailure> {
    cancellable(cancel, services.storage.find_account_by_id(id))
        .await??
        .ok_or(ApiFailure::NotFound)
}

/// A favorite must name a recipe that exists and that the caller can see.
async fn ensure_readable_recipe(
    services: &AppServices,
    auth: &Authorized,
    recipe_id: recipebook_core::RecipeId,
    cancel: &tokio_util::sync::CancellationToken,
) -> Result<(), ApiFailure> {
    let recipe = cancellable(cancel, services.storage.find_recipe_ref(recipe_id))
        .await??
        .ok_or(ApiFailure::NotFound)?;
    let readable = services
        .guard
        .policy()
        .authorize(&auth.identity, &ResourceRef::from(recipe), Action::Read)
        .is_allowed();
    if readable { Ok(()) } else { Err(ApiFailure::NotFound) }
}

/// The normalised, individually validated fields of a profile edit.
#[derive(Debug, Default)]
struct ProfileEdit {
    name: Option<String>,
    email: Option<String>,
    current_password: Option<String>,
    new_password: Option<String>,
}

impl ProfileEdit {
    fn validate(services: &AppServices, payload: &Value) -> Result<Self, ApiFailure> {
        let mut edit = ProfileEdit::default();
        let mut failures: Vec<ValidationFailure> = Vec::new();

        let engine = &services.validation;
        let mut field = |kind: PayloadKind, schema_field: &str, reported_as: &str| -> Option<String> {
            let value = payload.get(reported_as).filter(|v| !v.is_null())?;
            match engine.validate_user_field(kind, schema_field, value) {
                Ok(normalized) => Some(normalized),
                Err(ValidationError::Invalid(mut failure)) => {
                    for detail in &mut failure.details {
                        if detail.field == schema_field && schema_field != reported_as {
                            detail.message = detail.message.replacen(schema_field, reported_as, 1);
                            detail.field = reported_as.to_string();
                        }
                    }
                    failures.push(failure);
                    None
                }
                Err(ValidationError::UnknownKind(kind)) => {
                    failures.push(ValidationFailure {
                        kind,
                        details: vec![FieldError::new(reported_as, "cannot be validated")],
                    });
                    None
                }
            }
        };

        edit.name = field(PayloadKind::UserName, "name", "name");
        edit.email = field(PayloadKind::UserEmail, "email", "email");
        edit.new_password = field(PayloadKind::UserPassword, "password", "newPassword");
        edit.current_password = dto::str_field(payload, "password").map(str::to_string);

        let wants_new_password = payload.get("newPassword").is_some_and(|v| !v.is_null());
        if wants_new_password && edit.current_password.is_none() {
            failures.push(ValidationFailure {
                kind: PayloadKind::UserPassword,
                details: vec![FieldError::new("password", "password is required to set a new password")],
            });
        }

        let Some(first) = failures.first() else {
            return Ok(edit);
        };
        let kind = first.kind;
        Err(ApiFailure::Validation(ValidationFailure {
            kind,
            details: failures.into_iter().flat_map(|f| f.details).collect(),
        }))
    }
}
