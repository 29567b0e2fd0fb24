use axum::body::Bytes;
use axum::extract::rejection::JsonRejection;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use recipebook_core::{RecipeId, UserAccount};

use crate::app::errors::ApiFailure;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Account name or email.
    pub identifier: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteRequest {
    pub recipe_id: RecipeId,
    pub value: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct PublishRequest {
    pub public: Option<bool>,
}

/// Keys a client may send on a recipe but never controls.
pub const SERVER_OWNED_RECIPE_KEYS: &[&str] = &["id", "public", "user"];

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserAccount,
}

// -------------------------
// Mapping helpers
// -------------------------

/// Unwrap a JSON body, turning extractor rejections into our error shape.
pub fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, ApiFailure> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiFailure::BadRequest(rejection.body_text()))
}

/// A JSON body that may be left out entirely.
///
/// An empty (or whitespace-only) body yields `T::default()`; anything else
/// must parse as `T`, whatever the declared content type.
pub fn optional_json_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, ApiFailure> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(body).map_err(|err| ApiFailure::BadRequest(format!("invalid JSON body: {err}")))
}

pub fn parse_id<T: std::str::FromStr>(raw: &str, what: &'static str) -> Result<T, ApiFailure> {
    raw.parse()
        .map_err(|_| ApiFailure::BadRequest(format!("invalid {what} id")))
}

/// Drop server-owned keys so a client cannot smuggle them into the stored document.
pub fn strip_server_owned(mut payload: Value) -> Value {
    if let Value::Object(map) = &mut payload {
        for key in SERVER_OWNED_RECIPE_KEYS {
            map.remove(*key);
        }
    }
    payload
}

/// A string field of a JSON object, if present and a string.
pub fn str_field<'a>(payload: &'a Value, field: &str) -> Option<&'a str> {
    payload.get(field).and_then(Value::as_str)
}
