use axum::{
    routing::{get, post},
    Router,
};

pub mod auth;
pub mod recipes;
pub mod system;
pub mod users;

/// Router for every endpoint under the API prefix.
pub fn router() -> Router {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/session", get(auth::session))
        .nest("/recipes", recipes::router())
        .nest("/users", users::router())
}
