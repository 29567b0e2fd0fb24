//! HTTP API application wiring (Axum router + service wiring).
//!
//! - `services.rs`: shared collaborators (storage, guard, validation, passwords)
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: the failure taxonomy and its JSON responses

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tokio_util::sync::CancellationToken;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
///
/// Cancelling `shutdown` cancels every in-flight request.
pub fn build_app(services: Arc<AppServices>, shutdown: CancellationToken) -> Router {
    let context_state = middleware::RequestContextState {
        session_cookie: Arc::from(services.config.session_cookie.as_str()),
        shutdown,
    };

    let api = routes::router();
    let prefix = services.config.api_prefix.clone();
    let api = if prefix.is_empty() {
        api
    } else {
        Router::new().nest(&prefix, api)
    };

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(api)
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            context_state,
            middleware::request_context,
        ))
}
