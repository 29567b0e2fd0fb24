use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::Value;

use recipebook_auth::AuthFailure;
use recipebook_core::{UserAccount, UserId};
use recipebook_validation::ensure_unique;

use crate::app::dto::{self, LoginRequest, LoginResponse};
use crate::app::errors::ApiFailure;
use crate::app::services::AppServices;
use crate::context::{RequestCancellation, RequestCredential};
use crate::guard::cancellable;

/// Uniqueness, then validation, then create.
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cancel): Extension<RequestCancellation>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ApiFailure> {
    let payload = dto::json_body(body)?;
    let cancel = cancel.token();

    cancellable(
        cancel,
        ensure_unique(
            services.storage.as_ref(),
            dto::str_field(&payload, "name"),
            dto::str_field(&payload, "email"),
            None,
        ),
    )
    .await??;

    let registration = services.validation.validate_registration(&payload)?;
    let password_hash = services.hash_password(registration.password).await?;
    let account = UserAccount::new(UserId::new(), registration.name, registration.email, password_hash);

    cancellable(cancel, services.storage.create_account(account.clone())).await??;
    tracing::info!(user_id = %account.id, "account registered");

    Ok((StatusCode::CREATED, Json(account)).into_response())
}

/// Any failure is the same terse 401.
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(cancel): Extension<RequestCancellation>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiFailure> {
    let invalid = || ApiFailure::Authentication(AuthFailure::MalformedCredential);
    let Json(request) = body.map_err(|_| invalid())?;
    let cancel = cancel.token();
    let identifier = request.identifier.trim();

    let account = match cancellable(cancel, services.storage.find_account_by_name(identifier)).await?? {
        Some(account) => Some(account),
        None => cancellable(cancel, services.storage.find_account_by_email(identifier)).await??,
    };
    let hash = account.as_ref().map(|a| a.password_hash.clone());
    let verified = services.verify_login(request.password, hash).await;

    let Some(account) = account else {
        tracing::debug!("login for unknown identifier");
        return Err(invalid());
    };
    if !verified {
        tracing::debug!(user_id = %account.id, "login with wrong password");
        return Err(invalid());
    }

    let token = services.tokens().issue(account.id, Utc::now())?;
    let cookie = services.session_cookie(&token);
    tracing::info!(user_id = %account.id, "session started");

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse { token, user: account }),
    )
        .into_response())
}

pub async fn logout(Extension(services): Extension<Arc<AppServices>>) -> Response {
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, services.cleared_session_cookie())],
    )
        .into_response()
}

/// The account behind the current credential.
pub async fn session(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(credential): Extension<RequestCredential>,
    Extension(cancel): Extension<RequestCancellation>,
) -> Result<Response, ApiFailure> {
    let cancel = cancel.token();
    let principal = cancellable(cancel, services.guard.identity_resolver().require(&credential)).await??;

    let account = cancellable(cancel, services.storage.find_account_by_id(principal.id))
        .await??
        .ok_or(ApiFailure::Authentication(AuthFailure::UnknownSubject))?;

    Ok(Json(account).into_response())
}
