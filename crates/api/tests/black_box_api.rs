use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use recipebook_api::app::{build_app, AppServices};
use recipebook_api::config::ApiConfig;
use recipebook_core::{AccountStore, RecipeStore, Storage, UserId};
use recipebook_infra::InMemoryStore;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;

const JWT_SECRET: &str = "test-secret";

struct TestServer {
    base_url: String,
    store: Arc<InMemoryStore>,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod, on an ephemeral port, with a cheap bcrypt cost.
        let mut config = ApiConfig::new(JWT_SECRET);
        config.bcrypt_cost = 4;

        let store = Arc::new(InMemoryStore::new());
        let storage: Arc<dyn Storage> = store.clone();
        let services = AppServices::new(config, storage).expect("services build");
        let app = build_app(Arc::new(services), CancellationToken::new());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}/api/v1"),
            store,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn register(&self, name: &str) -> Value {
        let res = self
            .client
            .post(self.url("/register"))
            .json(&json!({
                "name": name,
                "email": format!("{name}@example.com"),
                "password": "password123",
                "confirmPassword": "password123"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        res.json().await.unwrap()
    }

    async fn login(&self, identifier: &str) -> String {
        let res = self
            .client
            .post(self.url("/login"))
            .json(&json!({ "identifier": identifier, "password": "password123" }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    /// Register and log in; returns (user id, token).
    async fn user(&self, name: &str) -> (String, String) {
        let account = self.register(name).await;
        let token = self.login(name).await;
        (account["id"].as_str().unwrap().to_string(), token)
    }

    async fn admin(&self, name: &str) -> (String, String) {
        let (id, token) = self.user(name).await;
        let user_id: UserId = id.parse().unwrap();
        let mut account = self.store.find_account_by_id(user_id).await.unwrap().unwrap();
        account.admin = true;
        self.store.update_account(account).await.unwrap();
        (id, token)
    }

    async fn create_recipe(&self, token: &str) -> Value {
        let res = self
            .client
            .post(self.url("/recipes"))
            .bearer_auth(token)
            .json(&recipe_payload())
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        res.json().await.unwrap()
    }

    async fn publish(&self, recipe_id: &str) {
        let id = recipe_id.parse().unwrap();
        let mut recipe = self.store.find_recipe(id).await.unwrap().unwrap();
        recipe.public = true;
        self.store.update_recipe(recipe).await.unwrap();
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn recipe_payload() -> Value {
    json!({
        "title": "Pancakes",
        "description": "Thin and buttery",
        "duration": { "hours": 0, "minutes": 30 },
        "tags": [{ "name": "breakfast", "color": "#ffcc00" }],
        "portionSize": 4,
        "subtitles": [{ "index": 1, "name": "Batter" }],
        "ingredients": [
            { "quantity": 5, "unit": "dl", "description": "milk", "subtitle": { "index": 1, "name": "Batter" } },
            { "quantity": 3, "unit": "dl", "description": "flour" }
        ],
        "pages": 2,
        "instructions": [
            { "index": 1, "title": "Mix", "description": "Whisk it all", "pageNumber": 1 },
            { "index": 2, "title": "Fry", "description": "Hot pan", "pageNumber": 2 }
        ]
    })
}

fn mint_jwt(sub: &str, issued_minutes_ago: i64, ttl_minutes: i64) -> String {
    let iat = Utc::now() - ChronoDuration::minutes(issued_minutes_ago);
    let claims = json!({
        "sub": sub,
        "iat": iat.timestamp(),
        "exp": (iat + ChronoDuration::minutes(ttl_minutes)).timestamp(),
    });

    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("failed to encode jwt")
}

#[tokio::test]
async fn health_is_outside_the_prefix() {
    let srv = TestServer::spawn().await;
    let root = srv.base_url.trim_end_matches("/api/v1");
    let res = srv.client.get(format!("{root}/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn anonymous_reads_public_recipes_only() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv.user("alice").await;
    let public = srv.create_recipe(&token).await;
    let private = srv.create_recipe(&token).await;
    let public_id = public["id"].as_str().unwrap();
    srv.publish(public_id).await;

    let res = srv.client.get(srv.url(&format!("/recipes/{public_id}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["title"], "Pancakes");
    assert_eq!(body["public"], true);

    let res = srv
        .client
        .get(srv.url(&format!("/recipes/{}", private["id"].as_str().unwrap())))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let listed: Value = srv.client.get(srv.url("/recipes")).send().await.unwrap().json().await.unwrap();
    let ids: Vec<&str> = listed.as_array().unwrap().iter().map(|r| r["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec![public_id]);
}

#[tokio::test]
async fn owner_update_keeps_server_owned_fields() {
    let srv = TestServer::spawn().await;
    let (alice_id, token) = srv.user("alice").await;
    let created = srv.create_recipe(&token).await;
    let id = created["id"].as_str().unwrap();

    let mut update = recipe_payload();
    update["title"] = json!("Crepes");
    update["public"] = json!(true);
    update["user"] = json!({ "id": UserId::new().to_string(), "name": "mallory" });

    let res = srv
        .client
        .put(srv.url(&format!("/recipes/{id}")))
        .bearer_auth(&token)
        .json(&update)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["title"], "Crepes");
    assert_eq!(body["public"], false);
    assert_eq!(body["user"]["id"], alice_id.as_str());
    assert_eq!(body["user"]["name"], "alice");

    let stored = srv.store.find_recipe(id.parse().unwrap()).await.unwrap().unwrap();
    assert!(!stored.public);
    assert_eq!(stored.user.id.to_string(), alice_id);
}

#[tokio::test]
async fn publishing_is_admin_only_even_for_the_owner() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv.user("alice").await;
    let (_, admin) = srv.admin("root").await;
    let id = srv.create_recipe(&token).await["id"].as_str().unwrap().to_string();

    let res = srv
        .client
        .post(srv.url(&format!("/recipes/{id}/publish")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "forbidden");
    assert_eq!(body["message"], "admin rights required");

    let res = srv
        .client
        .post(srv.url(&format!("/recipes/{id}/publish")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["public"], true);
}

#[tokio::test]
async fn admin_can_unpublish_with_an_explicit_flag() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv.user("alice").await;
    let (_, admin) = srv.admin("root").await;
    let id = srv.create_recipe(&token).await["id"].as_str().unwrap().to_string();
    srv.publish(&id).await;
    let url = srv.url(&format!("/recipes/{id}/publish"));

    let res = srv
        .client
        .post(&url)
        .bearer_auth(&admin)
        .json(&json!({ "public": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["public"], false);

    srv.publish(&id).await;
    // No content type: the flag still decides.
    let res = srv
        .client
        .post(&url)
        .bearer_auth(&admin)
        .body(r#"{"public": false}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let stored = srv.store.find_recipe(id.parse().unwrap()).await.unwrap().unwrap();
    assert!(!stored.public);
}

#[tokio::test]
async fn malformed_publish_body_is_rejected_and_changes_nothing() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv.user("alice").await;
    let (_, admin) = srv.admin("root").await;
    let id = srv.create_recipe(&token).await["id"].as_str().unwrap().to_string();

    let res = srv
        .client
        .post(srv.url(&format!("/recipes/{id}/publish")))
        .bearer_auth(&admin)
        .json(&json!({ "public": "false" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "bad_request");

    let stored = srv.store.find_recipe(id.parse().unwrap()).await.unwrap().unwrap();
    assert!(!stored.public);
}

#[tokio::test]
async fn strangers_get_forbidden_on_public_and_not_found_on_private() {
    let srv = TestServer::spawn().await;
    let (_, alice) = srv.user("alice").await;
    let (_, bob) = srv.user("bob").await;
    let public = srv.create_recipe(&alice).await["id"].as_str().unwrap().to_string();
    let private = srv.create_recipe(&alice).await["id"].as_str().unwrap().to_string();
    srv.publish(&public).await;

    let put = |id: String| {
        srv.client
            .put(srv.url(&format!("/recipes/{id}")))
            .bearer_auth(&bob)
            .json(&recipe_payload())
            .send()
    };
    assert_eq!(put(public).await.unwrap().status(), StatusCode::FORBIDDEN);
    assert_eq!(put(private).await.unwrap().status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_recipe_reports_every_violation() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv.user("alice").await;

    let mut payload = recipe_payload();
    payload["title"] = json!("   ");
    payload["portionSize"] = json!(0);
    payload["instructions"][1]["pageNumber"] = json!(3);

    let res = srv
        .client
        .post(srv.url("/recipes"))
        .bearer_auth(&token)
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["title", "portionSize", "instructions[1].pageNumber"]);
}

#[tokio::test]
async fn anonymous_and_expired_callers_cannot_create() {
    let srv = TestServer::spawn().await;
    let (alice_id, _) = srv.user("alice").await;

    let res = srv.client.post(srv.url("/recipes")).json(&recipe_payload()).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let expired = mint_jwt(&alice_id, 120, 60);
    let res = srv
        .client
        .post(srv.url("/recipes"))
        .bearer_auth(expired)
        .json(&recipe_payload())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let fresh = mint_jwt(&alice_id, 0, 10);
    let res = srv
        .client
        .post(srv.url("/recipes"))
        .bearer_auth(fresh)
        .json(&recipe_payload())
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn registration_confirm_mismatch_names_the_field() {
    let srv = TestServer::spawn().await;
    let res = srv
        .client
        .post(srv.url("/register"))
        .json(&json!({
            "name": "alice",
            "email": "alice@example.com",
            "password": "password123",
            "confirmPassword": "password124"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    let details = body["details"].as_array().unwrap();
    assert_eq!(details.len(), 1);
    assert_eq!(details[0]["field"], "confirmPassword");
}

#[tokio::test]
async fn registration_with_taken_name_is_a_bare_conflict() {
    let srv = TestServer::spawn().await;
    srv.register("alice").await;

    // Otherwise invalid too: the conflict wins and carries no details.
    let res = srv
        .client
        .post(srv.url("/register"))
        .json(&json!({ "name": "ALICE", "email": "nope", "password": "x" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "name is already in use");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let srv = TestServer::spawn().await;
    srv.register("alice").await;

    let attempt = |identifier: &'static str, password: &'static str| {
        srv.client
            .post(srv.url("/login"))
            .json(&json!({ "identifier": identifier, "password": password }))
            .send()
    };

    let wrong_password = attempt("alice", "password999").await.unwrap();
    let unknown_user = attempt("nobody", "password123").await.unwrap();
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);

    let a: Value = wrong_password.json().await.unwrap();
    let b: Value = unknown_user.json().await.unwrap();
    assert_eq!(a, b);
    assert_eq!(a["message"], "invalid credentials");
}

#[tokio::test]
async fn session_cookie_authenticates_and_logout_clears_it() {
    let srv = TestServer::spawn().await;
    srv.register("alice").await;

    let res = srv
        .client
        .post(srv.url("/login"))
        .json(&json!({ "identifier": "alice@example.com", "password": "password123" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let set_cookie = res
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.contains("HttpOnly"));
    let cookie = set_cookie.split(';').next().unwrap().to_string();

    let res = srv
        .client
        .get(srv.url("/session"))
        .header(reqwest::header::COOKIE, &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["name"], "alice");
    assert!(body.get("password_hash").is_none());

    let res = srv.client.post(srv.url("/logout")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let cleared = res.headers().get(reqwest::header::SET_COOKIE).unwrap().to_str().unwrap();
    assert!(cleared.starts_with("token=;"));

    let res = srv.client.get(srv.url("/session")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn user_administration_requires_admin() {
    let srv = TestServer::spawn().await;
    let (alice_id, alice) = srv.user("alice").await;
    let (bob_id, bob) = srv.user("bob").await;
    let (_, admin) = srv.admin("root").await;

    let res = srv.client.get(srv.url("/users")).bearer_auth(&alice).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv.client.get(srv.url("/users")).bearer_auth(&admin).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let users: Value = res.json().await.unwrap();
    assert_eq!(users.as_array().unwrap().len(), 3);

    let res = srv
        .client
        .get(srv.url(&format!("/users/{alice_id}")))
        .bearer_auth(&bob)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .delete(srv.url(&format!("/users/{bob_id}")))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn profile_edit_checks_uniqueness_then_each_field() {
    let srv = TestServer::spawn().await;
    let (alice_id, alice) = srv.user("alice").await;
    srv.register("bob").await;
    let url = srv.url(&format!("/users/{alice_id}"));

    let res = srv
        .client
        .put(&url)
        .bearer_auth(&alice)
        .json(&json!({ "email": "BOB@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    let res = srv
        .client
        .put(&url)
        .bearer_auth(&alice)
        .json(&json!({ "name": "a", "email": "broken", "newPassword": "short" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["name", "email", "newPassword", "password"]);

    // Own current name is not a conflict.
    let res = srv
        .client
        .put(&url)
        .bearer_auth(&alice)
        .json(&json!({ "name": "Alice", "password": "password123", "newPassword": "newpassword1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["name"], "Alice");

    let res = srv
        .client
        .post(srv.url("/login"))
        .json(&json!({ "identifier": "alice", "password": "newpassword1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn favorites_are_a_set_and_owner_only() {
    let srv = TestServer::spawn().await;
    let (alice_id, alice) = srv.user("alice").await;
    let (_, admin) = srv.admin("root").await;
    let recipe_id = srv.create_recipe(&alice).await["id"].as_str().unwrap().to_string();
    let url = srv.url(&format!("/users/{alice_id}/favorites"));

    for _ in 0..2 {
        let res = srv
            .client
            .put(&url)
            .bearer_auth(&alice)
            .json(&json!({ "recipeId": recipe_id, "value": true }))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["favorites"], json!([recipe_id]));
    }

    let res = srv
        .client
        .put(&url)
        .bearer_auth(&admin)
        .json(&json!({ "recipeId": recipe_id, "value": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = srv
        .client
        .put(&url)
        .bearer_auth(&alice)
        .json(&json!({ "recipeId": UserId::new().to_string(), "value": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn storage_outage_is_an_internal_error() {
    let srv = TestServer::spawn().await;
    let (_, token) = srv.user("alice").await;
    srv.store.set_online(false);

    let res = srv.client.get(srv.url("/recipes")).bearer_auth(&token).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "internal_error");
}
