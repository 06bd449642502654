/// Common test utilities for integration tests
///
/// Every context runs the full router over a fresh in-memory store, with
/// cheap password hashing so sign-ups stay fast.
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chorely_api::app::{build_router, AppState};
use chorely_api::config::Config;
use chorely_shared::auth::password::HashCost;
use chorely_shared::services::CompletionPolicy;
use chorely_shared::store::memory::MemoryStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::Service as _;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";

/// Test context containing the router under test
pub struct TestContext {
    pub app: Router,
    pub config: Config,
}

/// A signed-up user as seen by the client
#[allow(dead_code)]
pub struct TestUser {
    pub id: i64,
    pub token: String,
}

#[allow(dead_code)]
impl TestContext {
    pub fn new() -> Self {
        Self::with_policy(CompletionPolicy::RequireAssignment)
    }

    pub fn with_policy(policy: CompletionPolicy) -> Self {
        let mut config = Config::from_lookup(|key| match key {
            "CHORELY_STORAGE" => Some("memory".to_string()),
            "JWT_SECRET" => Some(TEST_SECRET.to_string()),
            _ => None,
        })
        .expect("test configuration is valid");
        config.completion_policy = policy;
        config.password_hash = HashCost::minimal();

        let state = AppState::new(Arc::new(MemoryStore::new()), config.clone());

        Self {
            app: build_router(state),
            config,
        }
    }

    /// Sends a request and returns the status with the parsed JSON body
    ///
    /// Empty bodies come back as `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().call(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                panic!("non-JSON body: {}", String::from_utf8_lossy(&bytes))
            })
        };

        (status, json)
    }

    pub async fn get(&self, uri: &str, token: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(token), Some(body)).await
    }

    /// Signs up a user, panicking unless it succeeds
    pub async fn sign_up(&self, name: &str, email: &str) -> TestUser {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/v1/auth/sign_up",
                None,
                Some(json!({
                    "user": {
                        "name": name,
                        "email": email,
                        "password": "password123",
                        "password_confirmation": "password123"
                    }
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "sign up failed: {}", body);

        TestUser {
            id: body["user"]["id"].as_i64().unwrap(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    /// Signs up a user who creates `family`; returns them with the join code
    pub async fn family_owner(&self, name: &str, email: &str, family: &str) -> (TestUser, String) {
        let user = self.sign_up(name, email).await;
        let (status, body) = self
            .post(
                "/api/v1/families",
                &user.token,
                json!({ "family": { "name": family } }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create family failed: {}", body);

        let join_code = body["join_code"].as_str().unwrap().to_string();
        (user, join_code)
    }

    /// Signs up a user who joins the family behind `join_code`
    pub async fn member(&self, name: &str, email: &str, join_code: &str) -> TestUser {
        let user = self.sign_up(name, email).await;
        let (status, body) = self
            .post(
                "/api/v1/families/join",
                &user.token,
                json!({ "join_code": join_code }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "join family failed: {}", body);
        user
    }

    /// Creates a chore and returns its ID
    pub async fn create_chore(&self, token: &str, name: &str, points: i64) -> i64 {
        let (status, body) = self
            .post(
                "/api/v1/chores",
                token,
                json!({ "chore": { "name": name, "points": points } }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create chore failed: {}", body);
        body["id"].as_i64().unwrap()
    }
}
