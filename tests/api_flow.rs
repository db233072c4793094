//! End-to-end flows through the full router, backed by the in-memory store.

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use store_tag_api::user_auth::{RevocationStore, TokenService, UserAuthService};
use store_tag_api::{AppState, MemoryStore, build_router};

/// Router over a fresh in-memory store. User id 1 is the admin.
fn app() -> Router {
    let store = Arc::new(MemoryStore::new());
    let revocations = Arc::new(RevocationStore::new());
    let tokens = Arc::new(TokenService::new("integration-secret", 900, 86_400));
    let user_auth = Arc::new(UserAuthService::new(
        store.clone(),
        tokens,
        revocations.clone(),
        vec![1],
    ));
    build_router(Arc::new(AppState::new(store, user_auth, revocations)))
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Register (if needed) and log in; returns (access, refresh)
async fn login(app: &Router, username: &str, password: &str) -> (String, String) {
    let creds = json!({ "username": username, "password": password });
    send(app, Method::POST, "/register", None, Some(creds.clone())).await;

    let (status, body) = send(app, Method::POST, "/login", None, Some(creds)).await;
    assert_eq!(status, StatusCode::OK, "login failed: {}", body);
    (
        body["data"]["access_token"].as_str().unwrap().to_string(),
        body["data"]["refresh_token"].as_str().unwrap().to_string(),
    )
}

async fn create_store(app: &Router, token: &str, name: &str) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/store",
        Some(token),
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"]["id"].as_i64().unwrap()
}

async fn create_item(app: &Router, token: &str, store_id: i64, name: &str) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/item",
        Some(token),
        Some(json!({ "name": name, "price": 15.99, "store_id": store_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"]["id"].as_i64().unwrap()
}

async fn create_tag(app: &Router, token: &str, store_id: i64, name: &str) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        &format!("/store/{}/tag", store_id),
        Some(token),
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"]["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_duplicate_store_rejected() {
    let app = app();
    let (access, _) = login(&app, "alice", "pw1").await;

    create_store(&app, &access, "S1").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/store",
        Some(&access),
        Some(json!({ "name": "S1" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 4009);
    assert_eq!(body["msg"], "A store with that name already exists.");

    let (_, body) = send(&app, Method::GET, "/store", Some(&access), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_non_admin_delete_is_unauthorized() {
    let app = app();
    login(&app, "root", "pw").await;
    let (bob, _) = login(&app, "bob", "pw").await;

    // Item 5 does not exist; the privilege check answers first
    let (status, body) = send(&app, Method::DELETE, "/item/5", Some(&bob), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 2003);
    assert_eq!(body["msg"], "Admin privilege required");

    let (status, _) = send(&app, Method::DELETE, "/store/1", Some(&bob), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_delete_missing_item_is_not_found() {
    let app = app();
    let (root, _) = login(&app, "root", "pw").await;

    let (status, body) = send(&app, Method::DELETE, "/item/5", Some(&root), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["msg"], "Item not found");
}

#[tokio::test]
async fn test_missing_or_malformed_token() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/item", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], 2002);

    let request = Request::builder()
        .uri("/item")
        .header(header::AUTHORIZATION, "Basic abc")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/item", Some("not.a.jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_revokes_token() {
    let app = app();
    let (access, _) = login(&app, "alice", "pw1").await;

    let (status, _) = send(&app, Method::GET, "/store", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::POST, "/logout", Some(&access), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Successfully logged out");

    let (status, body) = send(&app, Method::GET, "/store", Some(&access), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["msg"], "Token has been revoked");

    // A new login is unaffected
    let (fresh, _) = login(&app, "alice", "pw1").await;
    let (status, _) = send(&app, Method::GET, "/store", Some(&fresh), None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_refreshed_token_cannot_create() {
    let app = app();
    let (_, refresh) = login(&app, "alice", "pw1").await;

    let (status, body) = send(&app, Method::POST, "/refresh", Some(&refresh), None).await;
    assert_eq!(status, StatusCode::OK);
    let stale = body["data"]["access_token"].as_str().unwrap().to_string();

    let (status, _) = send(&app, Method::GET, "/store", Some(&stale), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::POST,
        "/store",
        Some(&stale),
        Some(json!({ "name": "S1" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["msg"], "Fresh token required");
}

#[tokio::test]
async fn test_token_types_not_interchangeable() {
    let app = app();
    let (access, refresh) = login(&app, "alice", "pw1").await;

    let (status, _) = send(&app, Method::POST, "/refresh", Some(&access), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/store", Some(&refresh), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_tag_in_use_cannot_be_deleted() {
    let app = app();
    let (root, _) = login(&app, "root", "pw").await;

    let store_id = create_store(&app, &root, "S1").await;
    let item_id = create_item(&app, &root, store_id, "Chair").await;
    let tag_id = create_tag(&app, &root, store_id, "furniture").await;

    let link = format!("/item/{}/tag/{}", item_id, tag_id);
    let (status, body) = send(&app, Method::POST, &link, Some(&root), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["items"][0]["id"], item_id);

    let tag_uri = format!("/tag/{}", tag_id);
    let (status, body) = send(&app, Method::DELETE, &tag_uri, Some(&root), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["msg"].as_str().unwrap().starts_with("Could not delete tag"));

    // Tag and link intact
    let (status, body) = send(&app, Method::GET, &tag_uri, Some(&root), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);

    let (status, body) = send(&app, Method::DELETE, &link, Some(&root), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["message"], "Item removed from tag");
    assert_eq!(body["data"]["item"]["id"], item_id);
    assert_eq!(body["data"]["tag"]["id"], tag_id);

    let (status, _) = send(&app, Method::DELETE, &tag_uri, Some(&root), None).await;
    assert_eq!(status, StatusCode::ACCEPTED);

    let (status, _) = send(&app, Method::GET, &tag_uri, Some(&root), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_link_is_idempotent_and_checks_both_ends() {
    let app = app();
    let (root, _) = login(&app, "root", "pw").await;

    let store_id = create_store(&app, &root, "S1").await;
    let item_id = create_item(&app, &root, store_id, "Chair").await;
    let tag_id = create_tag(&app, &root, store_id, "furniture").await;

    let link = format!("/item/{}/tag/{}", item_id, tag_id);
    send(&app, Method::POST, &link, Some(&root), None).await;
    let (status, _) = send(&app, Method::POST, &link, Some(&root), None).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = send(&app, Method::GET, &format!("/item/{}", item_id), Some(&root), None).await;
    assert_eq!(body["data"]["tags"].as_array().unwrap().len(), 1);

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/item/{}/tag/99", item_id),
        Some(&root),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/item/99/tag/{}", tag_id),
        Some(&root),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_duplicate_tag_scoped_to_store() {
    let app = app();
    let (root, _) = login(&app, "root", "pw").await;

    let s1 = create_store(&app, &root, "S1").await;
    let s2 = create_store(&app, &root, "S2").await;
    create_tag(&app, &root, s1, "sale").await;
    create_tag(&app, &root, s2, "sale").await;

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/store/{}/tag", s1),
        Some(&root),
        Some(json!({ "name": "sale" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, Method::GET, &format!("/store/{}/tag", s1), Some(&root), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::GET, "/store/99/tag", Some(&root), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_put_item_upserts() {
    let app = app();
    let (root, _) = login(&app, "root", "pw").await;
    let store_id = create_store(&app, &root, "S1").await;

    // New item needs a store
    let (status, _) = send(
        &app,
        Method::PUT,
        "/item/42",
        Some(&root),
        Some(json!({ "name": "Lamp", "price": 9.5 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/item/42",
        Some(&root),
        Some(json!({ "name": "Lamp", "price": 9.5, "store_id": store_id })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], 42);

    let (status, body) = send(
        &app,
        Method::PUT,
        "/item/42",
        Some(&root),
        Some(json!({ "name": "Desk Lamp", "price": 12 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Desk Lamp");
    assert_eq!(body["data"]["price"], "12");
    assert_eq!(body["data"]["store_id"], store_id);

    let (_, body) = send(&app, Method::GET, "/item", Some(&root), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_create_item_in_missing_store() {
    let app = app();
    let (root, _) = login(&app, "root", "pw").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/item",
        Some(&root),
        Some(json!({ "name": "Chair", "price": 1.0, "store_id": 7 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["msg"], "Store not found");
}

#[tokio::test]
async fn test_store_delete_cascades() {
    let app = app();
    let (root, _) = login(&app, "root", "pw").await;

    let store_id = create_store(&app, &root, "S1").await;
    let item_id = create_item(&app, &root, store_id, "Chair").await;
    let tag_id = create_tag(&app, &root, store_id, "furniture").await;
    send(
        &app,
        Method::POST,
        &format!("/item/{}/tag/{}", item_id, tag_id),
        Some(&root),
        None,
    )
    .await;

    let (_, body) = send(&app, Method::GET, &format!("/store/{}", store_id), Some(&root), None).await;
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"]["tags"].as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::DELETE, &format!("/store/{}", store_id), Some(&root), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, &format!("/item/{}", item_id), Some(&root), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::GET, &format!("/tag/{}", tag_id), Some(&root), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_bodies_rejected() {
    let app = app();
    let (root, _) = login(&app, "root", "pw").await;
    let store_id = create_store(&app, &root, "S1").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/store",
        Some(&root),
        Some(json!({ "name": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 1001);

    let (status, _) = send(
        &app,
        Method::POST,
        "/item",
        Some(&root),
        Some(json!({ "name": "Chair", "price": -1, "store_id": store_id })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/item",
        Some(&root),
        Some(json!({ "name": "Chair" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_price_outside_column_rejected() {
    let app = app();
    let (root, _) = login(&app, "root", "pw").await;
    let store_id = create_store(&app, &root, "S1").await;

    for price in [json!(1e12), json!(15.999)] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/item",
            Some(&root),
            Some(json!({ "name": "Chair", "price": price, "store_id": store_id })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "price {}", price);
        assert_eq!(body["code"], 1001);
    }

    let (_, body) = send(&app, Method::GET, "/item", Some(&root), None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_put_item_id_out_of_range() {
    let app = app();
    let (root, _) = login(&app, "root", "pw").await;
    let store_id = create_store(&app, &root, "S1").await;
    let body = json!({ "name": "Lamp", "price": 9.5, "store_id": store_id });

    for id in ["0", "-3", "2147483648", "9223372036854775807"] {
        let (status, resp) = send(
            &app,
            Method::PUT,
            &format!("/item/{}", id),
            Some(&root),
            Some(body.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "id {}", id);
        assert_eq!(resp["code"], 1001);
    }

    // serial ids still work afterwards
    assert_eq!(create_item(&app, &root, store_id, "Chair").await, 1);

    let (status, _) = send(&app, Method::PUT, "/item/2147483647", Some(&root), Some(body)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_non_numeric_path_gets_envelope() {
    let app = app();
    let (root, _) = login(&app, "root", "pw").await;

    for (method, uri) in [
        (Method::GET, "/item/abc"),
        (Method::GET, "/store/x"),
        (Method::POST, "/item/1/tag/y"),
        (Method::GET, "/user/me"),
    ] {
        let (status, body) = send(&app, method, uri, Some(&root), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["code"], 1001, "{}", uri);
        assert!(body["msg"].as_str().unwrap().starts_with("Invalid path"));
    }
}

#[tokio::test]
async fn test_register_and_login_errors() {
    let app = app();
    let creds = json!({ "username": "alice", "password": "pw1" });

    let (status, body) = send(&app, Method::POST, "/register", None, Some(creds.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["username"], "alice");
    assert!(body["data"].get("password_hash").is_none());

    let (status, body) = send(&app, Method::POST, "/register", None, Some(creds)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], 4090);

    let (status, body) = send(
        &app,
        Method::POST,
        "/login",
        None,
        Some(json!({ "username": "alice", "password": "wrong" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["msg"], "Invalid credentials");
}

#[tokio::test]
async fn test_user_lookup_and_admin_delete() {
    let app = app();
    let (root, _) = login(&app, "root", "pw").await;
    let (bob, _) = login(&app, "bob", "pw").await;

    let (status, body) = send(&app, Method::GET, "/user/2", Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], "bob");

    let (status, _) = send(&app, Method::DELETE, "/user/2", Some(&bob), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::DELETE, "/user/2", Some(&root), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, Method::GET, "/user/2", Some(&root), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_public_routes() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["timestamp_ms"].as_u64().unwrap() > 0);
    assert!(!body["data"]["version"].as_str().unwrap().is_empty());

    let (status, body) = send(&app, Method::GET, "/api-docs/openapi.json", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["info"]["title"], "Store Tag API");

    // Unknown paths are not masked as auth failures
    let (status, _) = send(&app, Method::GET, "/nope", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
