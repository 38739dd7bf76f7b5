//! End-to-end HTTP tests against the in-memory credential store.

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use clipstream_api::{build_router, AppState};
use clipstream_common::config::{
    AppConfig, AuthConfig, CookieConfig, DatabaseConfig, SameSitePolicy, ServerConfig,
};
use clipstream_db::{CredentialStore, MemoryCredentialStore};
use serde_json::{json, Value};
use tower::ServiceExt;

fn config() -> AppConfig {
    AppConfig {
        server: ServerConfig {
            host: "127.0.0.1".into(),
            port: 0,
            cors_origin: None,
            body_limit_bytes: 16 * 1024,
        },
        database: DatabaseConfig {
            url: "memory://".into(),
            max_connections: 1,
            min_connections: 1,
        },
        auth: AuthConfig {
            access_token_secret: "test-access-secret-0123456789abcdef".into(),
            refresh_token_secret: "test-refresh-secret-0123456789abcdef".into(),
            access_token_ttl_secs: 900,
            refresh_token_ttl_secs: 864_000,
        },
        cookies: CookieConfig {
            secure: true,
            same_site: SameSitePolicy::Strict,
        },
    }
}

fn app() -> Router {
    let store: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
    build_router(AppState::new(store, config()))
}

struct Reply {
    status: StatusCode,
    headers: HeaderMap,
    body: Value,
}

impl Reply {
    /// Value of a `Set-Cookie` header for `name`.
    fn cookie(&self, name: &str) -> Option<String> {
        let prefix = format!("{name}=");
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with(&prefix))
            .map(|v| {
                v[prefix.len()..]
                    .split(';')
                    .next()
                    .unwrap_or_default()
                    .to_string()
            })
    }
}

async fn send(app: &Router, request: Request<Body>) -> Reply {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    Reply {
        status,
        headers,
        body,
    }
}

fn json_request(method: Method, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn bearer(method: Method, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn with_cookie(method: Method, uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

async fn register(app: &Router, username: &str, email: &str) -> Reply {
    send(
        app,
        json_request(
            Method::POST,
            "/api/v1/users/register",
            json!({
                "full_name": "Alice Liddell",
                "username": username,
                "email": email,
                "password": "wonderland-42",
                "avatar": "https://media.example.com/alice.png"
            }),
        ),
    )
    .await
}

async fn login(app: &Router) -> Reply {
    send(
        app,
        json_request(
            Method::POST,
            "/api/v1/users/login",
            json!({ "email": "alice@example.com", "password": "wonderland-42" }),
        ),
    )
    .await
}

#[tokio::test]
async fn register_returns_sanitized_record() {
    let app = app();
    let reply = register(&app, "Alice", "Alice@Example.com").await;

    assert_eq!(reply.status, StatusCode::CREATED);
    assert_eq!(reply.body["success"], true);
    assert_eq!(reply.body["status_code"], 201);
    let user = &reply.body["data"];
    assert_eq!(user["username"], "alice");
    assert_eq!(user["email"], "alice@example.com");
    assert!(user.get("password_hash").is_none());
    assert!(user.get("refresh_token_hash").is_none());
    assert!(reply.cookie("accessToken").is_none());
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = app();
    register(&app, "alice", "alice@example.com").await;

    let reply = register(&app, "ALICE", "someone-else@example.com").await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert_eq!(reply.body["success"], false);
    assert_eq!(reply.body["code"], 409);
}

#[tokio::test]
async fn invalid_registration_is_rejected() {
    let app = app();
    let reply = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/users/register",
            json!({
                "full_name": "  ",
                "username": "alice",
                "email": "alice@example.com",
                "password": "wonderland-42",
                "avatar": "https://media.example.com/alice.png"
            }),
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn registration_missing_a_field_is_a_validation_error() {
    let app = app();
    let reply = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/users/register",
            json!({
                "full_name": "Alice Liddell",
                "username": "alice",
                "email": "alice@example.com",
                "password": "wonderland-42"
            }),
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert_eq!(reply.body["code"], 400);
    assert_eq!(reply.body["success"], false);
    assert_eq!(reply.body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn unreadable_bodies_are_validation_errors() {
    let app = app();

    let no_content_type = send(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/users/login")
            .body(Body::from(
                json!({ "email": "alice@example.com", "password": "wonderland-42" })
                    .to_string(),
            ))
            .unwrap(),
    )
    .await;
    assert_eq!(no_content_type.status, StatusCode::BAD_REQUEST);
    assert_eq!(no_content_type.body["error"], "VALIDATION_ERROR");

    let malformed = send(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/users/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"email\": "))
            .unwrap(),
    )
    .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert_eq!(malformed.body["error"], "VALIDATION_ERROR");

    let wrong_type = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/users/login",
            json!({ "email": "alice@example.com", "password": 42 }),
        ),
    )
    .await;
    assert_eq!(wrong_type.status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong_type.body["error"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn login_sets_cookies_and_returns_tokens() {
    let app = app();
    register(&app, "alice", "alice@example.com").await;

    let reply = login(&app).await;
    assert_eq!(reply.status, StatusCode::OK);
    let access = reply.body["data"]["access_token"].as_str().unwrap();
    let refresh = reply.body["data"]["refresh_token"].as_str().unwrap();
    assert_eq!(reply.cookie("accessToken").as_deref(), Some(access));
    assert_eq!(reply.cookie("refreshToken").as_deref(), Some(refresh));
    assert_eq!(reply.body["data"]["user"]["username"], "alice");

    let set_cookie = reply
        .headers
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect::<Vec<_>>();
    assert!(set_cookie.iter().all(|c| c.contains("HttpOnly")));
    assert!(set_cookie.iter().all(|c| c.contains("Secure")));
}

#[tokio::test]
async fn login_by_username_works() {
    let app = app();
    register(&app, "alice", "alice@example.com").await;

    let reply = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/users/login",
            json!({ "username": "Alice", "password": "wonderland-42" }),
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
}

#[tokio::test]
async fn login_failures() {
    let app = app();
    register(&app, "alice", "alice@example.com").await;

    let wrong = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/users/login",
            json!({ "email": "alice@example.com", "password": "not-the-password" }),
        ),
    )
    .await;
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);

    let unknown = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/users/login",
            json!({ "email": "nobody@example.com", "password": "wonderland-42" }),
        ),
    )
    .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    let missing = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/users/login",
            json!({ "password": "wonderland-42" }),
        ),
    )
    .await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn profile_via_bearer_and_cookie() {
    let app = app();
    register(&app, "alice", "alice@example.com").await;
    let access = login(&app).await.cookie("accessToken").unwrap();

    let by_header = send(&app, bearer(Method::GET, "/api/v1/users/profile", &access)).await;
    assert_eq!(by_header.status, StatusCode::OK);
    assert_eq!(by_header.body["data"]["username"], "alice");

    let by_cookie = send(
        &app,
        with_cookie(
            Method::GET,
            "/api/v1/users/profile",
            &format!("accessToken={access}"),
        ),
    )
    .await;
    assert_eq!(by_cookie.status, StatusCode::OK);
    assert_eq!(by_cookie.body["data"], by_header.body["data"]);
}

#[tokio::test]
async fn hard_gate_rejects_missing_and_bad_tokens() {
    let app = app();

    let missing = send(
        &app,
        Request::builder()
            .uri("/api/v1/users/profile")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let garbage = send(&app, bearer(Method::GET, "/api/v1/users/profile", "not.a.jwt")).await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
    assert_eq!(garbage.body["success"], false);
}

#[tokio::test]
async fn refresh_token_cannot_open_the_gate() {
    let app = app();
    register(&app, "alice", "alice@example.com").await;
    let refresh = login(&app).await.cookie("refreshToken").unwrap();

    let reply = send(&app, bearer(Method::GET, "/api/v1/users/profile", &refresh)).await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn refresh_rotates_and_rejects_replay() {
    let app = app();
    register(&app, "alice", "alice@example.com").await;
    let first = login(&app).await.cookie("refreshToken").unwrap();

    let rotated = send(
        &app,
        with_cookie(
            Method::POST,
            "/api/v1/users/refresh-token",
            &format!("refreshToken={first}"),
        ),
    )
    .await;
    assert_eq!(rotated.status, StatusCode::OK);
    let second = rotated.cookie("refreshToken").unwrap();
    assert_ne!(first, second);

    let replay = send(
        &app,
        with_cookie(
            Method::POST,
            "/api/v1/users/refresh-token",
            &format!("refreshToken={first}"),
        ),
    )
    .await;
    assert_eq!(replay.status, StatusCode::UNAUTHORIZED);

    // The replay does not burn the current token.
    let again = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/users/refresh-token",
            json!({ "refresh_token": second }),
        ),
    )
    .await;
    assert_eq!(again.status, StatusCode::OK);
}

#[tokio::test]
async fn refresh_without_token_is_unauthorized() {
    let app = app();
    let reply = send(
        &app,
        Request::builder()
            .method(Method::POST)
            .uri("/api/v1/users/refresh-token")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn logout_clears_cookies_and_revokes_refresh() {
    let app = app();
    register(&app, "alice", "alice@example.com").await;
    let session = login(&app).await;
    let access = session.cookie("accessToken").unwrap();
    let refresh = session.cookie("refreshToken").unwrap();

    let reply = send(&app, bearer(Method::POST, "/api/v1/users/logout", &access)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.cookie("accessToken").as_deref(), Some(""));
    assert_eq!(reply.cookie("refreshToken").as_deref(), Some(""));

    let after = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/users/refresh-token",
            json!({ "refresh_token": refresh }),
        ),
    )
    .await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn session_probe_never_rejects() {
    let app = app();
    register(&app, "alice", "alice@example.com").await;
    let access = login(&app).await.cookie("accessToken").unwrap();

    let anonymous = send(
        &app,
        Request::builder()
            .uri("/api/v1/users/session")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(anonymous.status, StatusCode::OK);
    assert_eq!(anonymous.body["data"]["authenticated"], false);
    assert!(anonymous.body["data"]["user"].is_null());

    let bad = send(&app, bearer(Method::GET, "/api/v1/users/session", "junk")).await;
    assert_eq!(bad.status, StatusCode::OK);
    assert_eq!(bad.body["data"]["authenticated"], false);

    let known = send(&app, bearer(Method::GET, "/api/v1/users/session", &access)).await;
    assert_eq!(known.status, StatusCode::OK);
    assert_eq!(known.body["data"]["authenticated"], true);
    assert_eq!(known.body["data"]["user"]["username"], "alice");
}

#[tokio::test]
async fn change_password_then_login_with_new_password() {
    let app = app();
    register(&app, "alice", "alice@example.com").await;
    let access = login(&app).await.cookie("accessToken").unwrap();

    let mut request = json_request(
        Method::PUT,
        "/api/v1/users/change-password",
        json!({ "old_password": "wonderland-42", "new_password": "looking-glass-7" }),
    );
    request.headers_mut().insert(
        header::AUTHORIZATION,
        format!("Bearer {access}").parse().unwrap(),
    );
    assert_eq!(send(&app, request).await.status, StatusCode::OK);

    assert_eq!(login(&app).await.status, StatusCode::UNAUTHORIZED);
    let fresh = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/users/login",
            json!({ "email": "alice@example.com", "password": "looking-glass-7" }),
        ),
    )
    .await;
    assert_eq!(fresh.status, StatusCode::OK);
}

#[tokio::test]
async fn profile_updates() {
    let app = app();
    register(&app, "alice", "alice@example.com").await;
    let access = login(&app).await.cookie("accessToken").unwrap();

    let authed = |method: Method, uri: &str, body: Value| {
        let mut request = json_request(method, uri, body);
        request.headers_mut().insert(
            header::AUTHORIZATION,
            format!("Bearer {access}").parse().unwrap(),
        );
        request
    };

    let renamed = send(
        &app,
        authed(
            Method::PUT,
            "/api/v1/users/update-profile",
            json!({ "full_name": "Alice L." }),
        ),
    )
    .await;
    assert_eq!(renamed.status, StatusCode::OK);
    assert_eq!(renamed.body["data"]["full_name"], "Alice L.");
    assert_eq!(renamed.body["data"]["username"], "alice");

    let empty = send(
        &app,
        authed(Method::PUT, "/api/v1/users/update-profile", json!({})),
    )
    .await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);

    let avatar = send(
        &app,
        authed(
            Method::PUT,
            "/api/v1/users/update-avatar",
            json!({ "avatar": "https://media.example.com/alice-2.png" }),
        ),
    )
    .await;
    assert_eq!(avatar.status, StatusCode::OK);
    assert_eq!(
        avatar.body["data"]["avatar"],
        "https://media.example.com/alice-2.png"
    );

    let bad_avatar = send(
        &app,
        authed(
            Method::PUT,
            "/api/v1/users/update-avatar",
            json!({ "avatar": "not a url" }),
        ),
    )
    .await;
    assert_eq!(bad_avatar.status, StatusCode::BAD_REQUEST);

    let cover = send(
        &app,
        authed(
            Method::PUT,
            "/api/v1/users/update-cover-image",
            json!({ "cover_image": "https://media.example.com/cover.png" }),
        ),
    )
    .await;
    assert_eq!(cover.status, StatusCode::OK);
    assert_eq!(
        cover.body["data"]["cover_image"],
        "https://media.example.com/cover.png"
    );

    let removed = send(
        &app,
        authed(
            Method::PUT,
            "/api/v1/users/update-cover-image",
            json!({ "cover_image": null }),
        ),
    )
    .await;
    assert_eq!(removed.status, StatusCode::OK);
    assert!(removed.body["data"]["cover_image"].is_null());
}

#[tokio::test]
async fn healthcheck_reports_healthy() {
    let app = app();
    let reply = send(
        &app,
        Request::builder()
            .uri("/api/v1/healthcheck")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(reply.status, StatusCode::OK);
    assert_eq!(reply.body["data"]["status"], "healthy");
    assert_eq!(reply.body["message"], "Health check successfully passed");
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let app = app();
    let padding = "x".repeat(32 * 1024);
    let reply = send(
        &app,
        json_request(
            Method::POST,
            "/api/v1/users/login",
            json!({ "email": padding, "password": "pw" }),
        ),
    )
    .await;
    assert_eq!(reply.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(reply.body["error"], "PAYLOAD_TOO_LARGE");
}
