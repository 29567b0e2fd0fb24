use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::Value;

use recipebook_auth::{Action, AuthFailure, ResourceRef};
use recipebook_core::{Recipe, RecipeId, RecipeOwner};

use crate::app::dto::{self, PublishRequest};
use crate::app::errors::ApiFailure;
use crate::app::services::AppServices;
use crate::context::{RequestCancellation, RequestCredential};
use crate::guard::{cancellable, ResourceLoader};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_recipes).post(create_recipe))
        .route("/:id", get(get_recipe).put(update_recipe).delete(delete_recipe))
        .route("/:id/publish", post(publish_recipe))
}

/// Every recipe the caller may read.
pub async fn list_recipes(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(credential): Extension<RequestCredential>,
    Extension(cancel): Extension<RequestCancellation>,
) -> Result<Response, ApiFailure> {
    let cancel = cancel.token();
    let identity = services.guard.identify(&credential, Action::Read, cancel).await?;
    let policy = services.guard.policy();

    let recipes: Vec<Recipe> = cancellable(cancel, services.storage.list_recipes())
        .await??
        .into_iter()
        .filter(|recipe| {
            policy
                .authorize(&identity, &ResourceRef::from(recipe.to_ref()), Action::Read)
                .is_allowed()
        })
        .collect();

    Ok(Json(recipes).into_response())
}

pub async fn create_recipe(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(credential): Extension<RequestCredential>,
    Extension(cancel): Extension<RequestCancellation>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiFailure> {
    let cancel = cancel.token();
    let services = services.as_ref();
    services
        .guard
        .run(&credential, Action::Create, ResourceLoader::Collection, cancel, |auth| async move {
            let principal = *auth.principal()?;
            let body = services.validation.validate_recipe(&dto::strip_server_owned(dto::json_body(body)?))?;

            let owner = cancellable(cancel, services.storage.find_account_by_id(principal.id))
                .await??
                .ok_or(ApiFailure::Authentication(AuthFailure::UnknownSubject))?;
            let recipe = Recipe::new(
                RecipeId::new(),
                body,
                RecipeOwner {
                    id: owner.id,
                    name: owner.name,
                },
            );

            cancellable(cancel, services.storage.create_recipe(recipe.clone())).await??;
            tracing::info!(recipe_id = %recipe.id, owner = %principal.id, "recipe created");
            Ok((StatusCode::CREATED, Json(recipe)).into_response())
        })
        .await
}

pub async fn get_recipe(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(credential): Extension<RequestCredential>,
    Extension(cancel): Extension<RequestCancellation>,
    Path(id): Path<String>,
) -> Result<Response, ApiFailure> {
    let id: RecipeId = dto::parse_id(&id, "recipe")?;
    let cancel = cancel.token();
    let services = services.as_ref();
    services
        .guard
        .run(&credential, Action::Read, ResourceLoader::Recipe(id), cancel, |_| async move {
            let recipe = cancellable(cancel, services.storage.find_recipe(id))
                .await??
                .ok_or(ApiFailure::NotFound)?;
            Ok(Json(recipe).into_response())
        })
        .await
}

/// Replace the editable content; id, owner and publication state are kept.
pub async fn update_recipe(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(credential): Extension<RequestCredential>,
    Extension(cancel): Extension<RequestCancellation>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiFailure> {
    let id: RecipeId = dto::parse_id(&id, "recipe")?;
    let cancel = cancel.token();
    let services = services.as_ref();
    services
        .guard
        .run(&credential, Action::Write, ResourceLoader::Recipe(id), cancel, |_| async move {
            let body = services.validation.validate_recipe(&dto::strip_server_owned(dto::json_body(body)?))?;

            let mut recipe = cancellable(cancel, services.storage.find_recipe(id))
                .await??
                .ok_or(ApiFailure::NotFound)?;
            recipe.body = body;

            cancellable(cancel, services.storage.update_recipe(recipe.clone())).await??;
            tracing::info!(recipe_id = %id, "recipe updated");
            Ok(Json(recipe).into_response())
        })
        .await
}

pub async fn delete_recipe(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(credential): Extension<RequestCredential>,
    Extension(cancel): Extension<RequestCancellation>,
    Path(id): Path<String>,
) -> Result<Response, ApiFailure> {
    let id: RecipeId = dto::parse_id(&id, "recipe")?;
    let cancel = cancel.token();
    let services = services.as_ref();
    services
        .guard
        .run(&credential, Action::Delete, ResourceLoader::Recipe(id), cancel, |_| async move {
            cancellable(cancel, services.storage.delete_recipe(id)).await??;
            tracing::info!(recipe_id = %id, "recipe deleted");
            Ok(StatusCode::NO_CONTENT.into_response())
        })
        .await
}

/// Set the publication flag (`{"public": false}` unpublishes; default publishes).
pub async fn publish_recipe(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(credential): Extension<RequestCredential>,
    Extension(cancel): Extension<RequestCancellation>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Response, ApiFailure> {
    let id: RecipeId = dto::parse_id(&id, "recipe")?;
    let cancel = cancel.token();
    let services = services.as_ref();
    services
        .guard
        .run(&credential, Action::Publish, ResourceLoader::Recipe(id), cancel, |_| async move {
            let request: PublishRequest = dto::optional_json_body(&body)?;
            let public = request.public.unwrap_or(true);

            let mut recipe = cancellable(cancel, services.storage.find_recipe(id))
                .await??
                .ok_or(ApiFailure::NotFound)?;
            recipe.public = public;

            cancellable(cancel, services.storage.update_recipe(recipe.clone())).await??;
            tracing::info!(recipe_id = %id, public, "recipe publication changed");
            Ok(Json(recipe).into_response())
        })
        .await
}
