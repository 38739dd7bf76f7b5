//! # clipstream-api
//!
//! Session manager and REST API for Clipstream accounts: registration, login,
//! refresh-token rotation, logout, password and profile changes, and the
//! request gate that resolves a caller's identity.

pub mod auth;
pub mod cookies;
pub mod middleware;
pub mod routes;
pub mod session;

use axum::{
    http::{header, HeaderValue, Method},
    Router,
};
use clipstream_common::config::AppConfig;
use clipstream_db::CredentialStore;
use cookies::CookiePolicy;
use session::SessionManager;
use std::sync::Arc;
use std::time::Instant;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};

/// Shared application state available to all route handlers.
pub struct AppState {
    pub sessions: SessionManager,
    pub cookies: CookiePolicy,
    pub config: AppConfig,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn CredentialStore>, config: AppConfig) -> Self {
        Self {
            sessions: SessionManager::new(store, &config.auth),
            cookies: CookiePolicy::new(
                &config.cookies,
                config.auth.access_token_ttl_secs,
                config.auth.refresh_token_ttl_secs,
            ),
            config,
            started_at: Instant::now(),
        }
    }
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    // Cookies only flow cross-origin to an explicit, credentialed origin.
    match origin.and_then(|o| o.parse::<HeaderValue>().ok()) {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::PUT])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    }
}

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let state = Arc::new(state);

    let api_routes = Router::new()
        .merge(routes::auth::router(&state))
        .merge(routes::users::router(&state))
        .merge(routes::health::router());

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(RequestBodyLimitLayer::new(
            state.config.server.body_limit_bytes,
        ))
        .layer(cors_layer(state.config.server.cors_origin.as_deref()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
