/// Integration tests for the Chorely API
///
/// These tests drive the full router over an in-memory store:
/// - Sign-up, sign-in, sign-out and token handling
/// - Family creation, joining and rosters
/// - Chore lifecycle, assignment and completion
/// - Family scoping and error bodies
mod common;

use axum::http::{Method, StatusCode};
use chorely_shared::services::CompletionPolicy;
use common::TestContext;
use serde_json::json;

#[tokio::test]
async fn test_health_check_reports_store_and_security_headers() {
    let ctx = TestContext::new();

    let (status, body) = ctx.send(Method::GET, "/api/v1/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    let response = {
        use axum::body::Body;
        use tower::Service as _;
        let request = axum::http::Request::builder()
            .uri("/api/v1/health")
            .body(Body::empty())
            .unwrap();
        ctx.app.clone().call(request).await.unwrap()
    };
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
}

#[tokio::test]
async fn test_responses_compressed_when_accepted() {
    use axum::body::Body;
    use tower::Service as _;

    let ctx = TestContext::new();

    for encoding in ["gzip", "br"] {
        let request = axum::http::Request::builder()
            .uri("/api/v1/health")
            .header("accept-encoding", encoding)
            .body(Body::empty())
            .unwrap();
        let response = ctx.app.clone().call(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get("content-encoding").unwrap(), encoding);
    }
}

#[tokio::test]
async fn test_sign_up_returns_profile_and_token() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/v1/auth/sign_up",
            None,
            Some(json!({
                "user": {
                    "name": "Alice",
                    "email": "Alice@Example.com",
                    "password": "password123",
                    "password_confirmation": "password123"
                }
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user"]["name"], "Alice");
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert_eq!(body["user"]["points"], 0);
    assert!(body["user"]["family_id"].is_null());
    assert!(body["user"].get("password_hash").is_none());
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn test_sign_up_validation_errors() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/v1/auth/sign_up",
            None,
            Some(json!({
                "user": {
                    "name": "",
                    "email": "not-an-email",
                    "password": "short",
                    "password_confirmation": "different"
                }
            })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|detail| detail["field"].as_str().unwrap())
        .collect();
    for field in ["name", "email", "password", "password_confirmation"] {
        assert!(fields.contains(&field), "missing error for {}", field);
    }
}

#[tokio::test]
async fn test_sign_up_duplicate_email_conflicts() {
    let ctx = TestContext::new();
    ctx.sign_up("Alice", "alice@example.com").await;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/v1/auth/sign_up",
            None,
            Some(json!({
                "user": {
                    "name": "Other Alice",
                    "email": "ALICE@example.com",
                    "password": "password123",
                    "password_confirmation": "password123"
                }
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/v1/auth/sign_in",
            None,
            Some(json!({ "email": "alice@example.com" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_sign_in_and_me() {
    let ctx = TestContext::new();
    let alice = ctx.sign_up("Alice", "alice@example.com").await;

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/v1/auth/sign_in",
            None,
            Some(json!({ "user": { "email": "alice@example.com", "password": "password123" } })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], alice.id);

    let token = body["token"].as_str().unwrap();
    let (status, me) = ctx.get("/api/v1/auth/me", token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["id"], alice.id);
    assert_eq!(me["name"], "Alice");
}

#[tokio::test]
async fn test_sign_in_with_wrong_password() {
    let ctx = TestContext::new();
    ctx.sign_up("Alice", "alice@example.com").await;

    for (email, password) in [
        ("alice@example.com", "wrong-password"),
        ("nobody@example.com", "password123"),
    ] {
        let (status, body) = ctx
            .send(
                Method::POST,
                "/api/v1/auth/sign_in",
                None,
                Some(json!({ "user": { "email": email, "password": password } })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "invalid email or password");
    }
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let ctx = TestContext::new();

    let (status, body) = ctx.send(Method::GET, "/api/v1/chores", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = ctx.get("/api/v1/auth/me", "not.a.token").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sign_out_revokes_only_that_token() {
    let ctx = TestContext::new();
    let alice = ctx.sign_up("Alice", "alice@example.com").await;

    let (_, body) = ctx
        .send(
            Method::POST,
            "/api/v1/auth/sign_in",
            None,
            Some(json!({ "user": { "email": "alice@example.com", "password": "password123" } })),
        )
        .await;
    let second_token = body["token"].as_str().unwrap().to_string();

    let (status, body) = ctx
        .send(Method::DELETE, "/api/v1/auth/sign_out", Some(&alice.token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_null());

    let (status, _) = ctx.get("/api/v1/auth/me", &alice.token).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx.get("/api/v1/auth/me", &second_token).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_create_and_join_family() {
    let ctx = TestContext::new();
    let (alice, join_code) = ctx
        .family_owner("Alice", "alice@example.com", "Test Family")
        .await;
    assert_eq!(join_code.len(), 8);

    let bob = ctx.sign_up("Bob", "bob@example.com").await;
    let (status, body) = ctx
        .post(
            "/api/v1/families/join",
            &bob.token,
            json!({ "join_code": join_code.to_lowercase() }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Test Family");

    let (status, family) = ctx.get("/api/v1/families/my_family", &alice.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(family["join_code"], join_code.as_str());

    let mut member_ids: Vec<i64> = family["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|user| user["id"].as_i64().unwrap())
        .collect();
    member_ids.sort();
    assert_eq!(member_ids, vec![alice.id, bob.id]);

    let (_, me) = ctx.get("/api/v1/auth/me", &bob.token).await;
    assert_eq!(me["family_id"], family["id"]);
}

#[tokio::test]
async fn test_family_membership_is_exclusive() {
    let ctx = TestContext::new();
    let (alice, join_code) = ctx
        .family_owner("Alice", "alice@example.com", "Test Family")
        .await;
    let (_, other_code) = ctx
        .family_owner("Carol", "carol@example.com", "Other Family")
        .await;

    let (status, _) = ctx
        .post(
            "/api/v1/families",
            &alice.token,
            json!({ "family": { "name": "Second Family" } }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    for code in [join_code, other_code] {
        let (status, _) = ctx
            .post("/api/v1/families/join", &alice.token, json!({ "join_code": code }))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }
}

#[tokio::test]
async fn test_family_not_found_cases() {
    let ctx = TestContext::new();
    let alice = ctx.sign_up("Alice", "alice@example.com").await;

    let (status, _) = ctx
        .post("/api/v1/families/join", &alice.token, json!({ "join_code": "ZZZZZZZZ" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.get("/api/v1/families/my_family", &alice.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = ctx
        .post("/api/v1/families", &alice.token, json!({ "family": { "name": "  " } }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "name");
}

#[tokio::test]
async fn test_chores_require_a_family() {
    let ctx = TestContext::new();
    let alice = ctx.sign_up("Alice", "alice@example.com").await;

    let (status, body) = ctx
        .post(
            "/api/v1/chores",
            &alice.token,
            json!({ "chore": { "name": "Wash Dishes", "points": 10 } }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "user must belong to a family");
}

#[tokio::test]
async fn test_chore_crud() {
    let ctx = TestContext::new();
    let (alice, _) = ctx
        .family_owner("Alice", "alice@example.com", "Test Family")
        .await;

    let (status, created) = ctx
        .post(
            "/api/v1/chores",
            &alice.token,
            json!({
                "chore": {
                    "name": "Wash Dishes",
                    "description": "After dinner",
                    "points": 10,
                    "frequency": "weekly"
                }
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["name"], "Wash Dishes");
    assert_eq!(created["frequency"], "weekly");
    assert!(created["assigned_to_user_id"].is_null());
    assert!(created["last_completed_at"].is_null());

    let id = created["id"].as_i64().unwrap();
    let uri = format!("/api/v1/chores/{}", id);

    let (status, fetched) = ctx.get(&uri, &alice.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, created);

    let (status, updated) = ctx
        .send(
            Method::PUT,
            &uri,
            Some(&alice.token),
            Some(json!({ "chore": { "points": 15 } })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["points"], 15);
    assert_eq!(updated["name"], "Wash Dishes");
    assert_eq!(updated["description"], "After dinner");

    ctx.create_chore(&alice.token, "Take Out Trash", 5).await;
    let (status, list) = ctx.get("/api/v1/chores", &alice.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 2);
    assert_eq!(list[0]["id"], id);

    let (status, _) = ctx
        .send(Method::DELETE, &uri, Some(&alice.token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx
        .send(
            Method::PUT,
            &uri,
            Some(&alice.token),
            Some(json!({ "chore": { "points": 20 } })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_chore_validation() {
    let ctx = TestContext::new();
    let (alice, _) = ctx
        .family_owner("Alice", "alice@example.com", "Test Family")
        .await;

    let (status, body) = ctx
        .post(
            "/api/v1/chores",
            &alice.token,
            json!({ "chore": { "name": "Wash Dishes", "points": 0 } }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "points");

    let (status, body) = ctx.get("/api/v1/chores/not-a-number", &alice.token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_assign_and_complete_awards_points() {
    let ctx = TestContext::new();
    let (alice, join_code) = ctx
        .family_owner("Alice", "alice@example.com", "Test Family")
        .await;
    let bob = ctx.member("Bob", "bob@example.com", &join_code).await;
    let chore_id = ctx.create_chore(&alice.token, "Wash Dishes", 10).await;

    let (status, chore) = ctx
        .post(
            &format!("/api/v1/chores/{}/assign", chore_id),
            &alice.token,
            json!({ "user_id": bob.id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(chore["assigned_to_user_id"], bob.id);

    let (status, completion) = ctx
        .send(
            Method::POST,
            &format!("/api/v1/chores/{}/complete", chore_id),
            Some(&bob.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(completion["chore_id"], chore_id);
    assert_eq!(completion["user_id"], bob.id);
    assert!(completion["completed_at"].is_string());

    let (_, me) = ctx.get("/api/v1/auth/me", &bob.token).await;
    assert_eq!(me["points"], 10);

    let (_, chore) = ctx
        .get(&format!("/api/v1/chores/{}", chore_id), &alice.token)
        .await;
    assert_eq!(chore["last_completed_at"], completion["completed_at"]);

    let (status, history) = ctx.get("/api/v1/completions", &alice.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["id"], completion["id"]);
}

#[tokio::test]
async fn test_completing_unassigned_chore_follows_policy() {
    let strict = TestContext::new();
    let (alice, _) = strict
        .family_owner("Alice", "alice@example.com", "Test Family")
        .await;
    let chore_id = strict.create_chore(&alice.token, "Wash Dishes", 10).await;

    let (status, _) = strict
        .send(
            Method::POST,
            &format!("/api/v1/chores/{}/complete", chore_id),
            Some(&alice.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let lenient = TestContext::with_policy(CompletionPolicy::SelfClaim);
    let (alice, _) = lenient
        .family_owner("Alice", "alice@example.com", "Test Family")
        .await;
    let chore_id = lenient.create_chore(&alice.token, "Wash Dishes", 10).await;

    let (status, _) = lenient
        .send(
            Method::POST,
            &format!("/api/v1/chores/{}/complete", chore_id),
            Some(&alice.token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, chore) = lenient
        .get(&format!("/api/v1/chores/{}", chore_id), &alice.token)
        .await;
    assert_eq!(chore["assigned_to_user_id"], alice.id);
}

#[tokio::test]
async fn test_other_family_chores_are_not_found() {
    let ctx = TestContext::new();
    let (alice, _) = ctx
        .family_owner("Alice", "alice@example.com", "Alice Family")
        .await;
    let (carol, _) = ctx
        .family_owner("Carol", "carol@example.com", "Carol Family")
        .await;
    let chore_id = ctx.create_chore(&alice.token, "Wash Dishes", 10).await;
    let uri = format!("/api/v1/chores/{}", chore_id);

    let (status, _) = ctx.get(&uri, &carol.token).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .send(
            Method::PUT,
            &uri,
            Some(&carol.token),
            Some(json!({ "chore": { "name": "Mine now" } })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .post(&format!("{}/assign", uri), &carol.token, json!({ "user_id": carol.id }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .send(Method::POST, &format!("{}/complete", uri), Some(&carol.token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.send(Method::DELETE, &uri, Some(&carol.token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Assigning to someone outside the family is refused too
    let (status, _) = ctx
        .post(&format!("{}/assign", uri), &alice.token, json!({ "user_id": carol.id }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, chores) = ctx.get("/api/v1/chores", &carol.token).await;
    assert!(chores.as_array().unwrap().is_empty());

    let (status, chore) = ctx.get(&uri, &alice.token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(chore["name"], "Wash Dishes");
}

#[tokio::test]
async fn test_completions_survive_chore_deletion() {
    let ctx = TestContext::new();
    let (alice, _) = ctx
        .family_owner("Alice", "alice@example.com", "Test Family")
        .await;
    let chore_id = ctx.create_chore(&alice.token, "Wash Dishes", 10).await;
    let uri = format!("/api/v1/chores/{}", chore_id);

    ctx.post(&format!("{}/assign", uri), &alice.token, json!({ "user_id": alice.id }))
        .await;
    let (status, _) = ctx
        .send(Method::POST, &format!("{}/complete", uri), Some(&alice.token), None)
        .await;
    assert_eq!(status, StatusCode::CREATED);

    ctx.send(Method::DELETE, &uri, Some(&alice.token), None).await;

    let (_, history) = ctx.get("/api/v1/completions", &alice.token).await;
    assert_eq!(history.as_array().unwrap().len(), 1);
    assert_eq!(history[0]["chore_id"], chore_id);

    let (_, me) = ctx.get("/api/v1/auth/me", &alice.token).await;
    assert_eq!(me["points"], 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_completions_over_http() {
    const N: usize = 10;

    let ctx = TestContext::new();
    let (alice, _) = ctx
        .family_owner("Alice", "alice@example.com", "Test Family")
        .await;
    let chore_id = ctx.create_chore(&alice.token, "Wash Dishes", 7).await;
    ctx.post(
        &format!("/api/v1/chores/{}/assign", chore_id),
        &alice.token,
        json!({ "user_id": alice.id }),
    )
    .await;

    let uri = format!("/api/v1/chores/{}/complete", chore_id);
    let requests = (0..N).map(|_| ctx.send(Method::POST, &uri, Some(&alice.token), None));
    let results = futures::future::join_all(requests).await;

    assert!(results
        .iter()
        .all(|(status, _)| *status == StatusCode::CREATED));

    let (_, me) = ctx.get("/api/v1/auth/me", &alice.token).await;
    assert_eq!(me["points"], 7 * N as i64);

    let (_, history) = ctx.get("/api/v1/completions", &alice.token).await;
    assert_eq!(history.as_array().unwrap().len(), N);
}

#[tokio::test]
async fn test_over_length_fields_are_validation_errors() {
    let ctx = TestContext::new();

    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/v1/auth/sign_up",
            None,
            Some(json!({
                "user": {
                    "name": "n".repeat(500),
                    "email": "long@example.com",
                    "password": "password123",
                    "password_confirmation": "password123"
                }
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "name");

    let (alice, _) = ctx
        .family_owner("Alice", "alice@example.com", "Test Family")
        .await;

    for (chore, field) in [
        (json!({ "name": "x".repeat(256), "points": 10 }), "name"),
        (json!({ "name": "Dishes", "points": 10, "frequency": "f".repeat(51) }), "frequency"),
        (json!({ "name": "Dishes", "points": 1_000_001 }), "points"),
    ] {
        let (status, body) = ctx
            .post("/api/v1/chores", &alice.token, json!({ "chore": chore }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{} should be rejected", field);
        assert_eq!(body["details"][0]["field"], field);
    }

    let (_, chores) = ctx.get("/api/v1/chores", &alice.token).await;
    assert!(chores.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_update_cannot_raise_points_past_limit() {
    let ctx = TestContext::new();
    let (alice, _) = ctx
        .family_owner("Alice", "alice@example.com", "Test Family")
        .await;
    let chore_id = ctx.create_chore(&alice.token, "Wash Dishes", 1_000_000).await;

    let (status, body) = ctx
        .send(
            Method::PUT,
            &format!("/api/v1/chores/{}", chore_id),
            Some(&alice.token),
            Some(json!({ "chore": { "points": i64::MAX } })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "points");
}
