//! Authentication routes: register, login, refresh, logout, session probe.
//!
//! Login and refresh set both token cookies and also return the tokens in the
//! body for clients that cannot hold cookies.

use axum::{
    body::Bytes,
    extract::{Extension, State},
    middleware,
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::{cookie::CookieJar, WithRejection};
use clipstream_common::{
    error::{ClipError, ClipResult},
    models::user::{LoginRequest, RefreshRequest, RegisterRequest, UserResponse},
    response::ApiResponse,
    validation::validate_request,
};
use serde::Serialize;
use std::sync::Arc;

use crate::{
    cookies,
    middleware::{auth_gate, AuthContext, Gate, MaybeAuth},
    session::Session,
    AppState,
};

/// Auth router.
pub fn router(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let public = Router::new()
        .route("/users/register", post(register))
        .route("/users/login", post(login))
        .route("/users/refresh-token", post(refresh_token));

    let gated = Router::new()
        .route("/users/logout", post(logout))
        .route_layer(middleware::from_fn_with_state(
            Gate::required(state),
            auth_gate,
        ));

    let probe = Router::new()
        .route("/users/session", get(session_status))
        .route_layer(middleware::from_fn_with_state(
            Gate::optional(state),
            auth_gate,
        ));

    public.merge(gated).merge(probe)
}

#[derive(Debug, Serialize)]
pub struct SessionStatus {
    authenticated: bool,
    user: Option<UserResponse>,
}

/// POST /api/v1/users/register
///
/// Create an account. Returns the sanitized record; no tokens are issued.
async fn register(
    State(state): State<Arc<AppState>>,
    WithRejection(Json(body), _): WithRejection<Json<RegisterRequest>, ClipError>,
) -> ClipResult<ApiResponse<UserResponse>> {
    let user = state.sessions.register(body).await?;
    Ok(ApiResponse::created(user, "User registered successfully"))
}

/// POST /api/v1/users/login
///
/// Authenticate with email or username plus password.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    WithRejection(Json(body), _): WithRejection<Json<LoginRequest>, ClipError>,
) -> ClipResult<(CookieJar, ApiResponse<Session>)> {
    let identifier = body
        .identifier()
        .ok_or_else(|| ClipError::validation("Email or username is required"))?
        .to_string();
    validate_request(&body)?;

    let session = state
        .sessions
        .authenticate(&identifier, &body.password)
        .await?;

    let jar = state.cookies.set_session(jar, &session.tokens);
    Ok((jar, ApiResponse::ok(session, "User logged in successfully")))
}

/// POST /api/v1/users/refresh-token
///
/// Rotate the refresh token. Reads the `refreshToken` cookie, falling back to
/// a JSON body `{"refresh_token": "..."}`.
async fn refresh_token(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    body: Bytes,
) -> ClipResult<(CookieJar, ApiResponse<Session>)> {
    let presented = cookies::read(&jar, cookies::REFRESH_COOKIE)
        .or_else(|| {
            serde_json::from_slice::<RefreshRequest>(&body)
                .ok()
                .map(|r| r.refresh_token.trim().to_string())
                .filter(|t| !t.is_empty())
        })
        .ok_or(ClipError::Unauthorized)?;

    let session = state.sessions.refresh(&presented).await?;

    let jar = state.cookies.set_session(jar, &session.tokens);
    Ok((jar, ApiResponse::ok(session, "Access token refreshed")))
}

/// POST /api/v1/users/logout
async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    jar: CookieJar,
) -> ClipResult<(CookieJar, ApiResponse<()>)> {
    state.sessions.logout(auth.user_id).await?;

    let jar = state.cookies.clear_session(jar);
    Ok((jar, ApiResponse::ok((), "User logged out")))
}

/// GET /api/v1/users/session
///
/// Reports whether the caller holds a valid access token. Never rejects.
async fn session_status(Extension(auth): Extension<MaybeAuth>) -> ApiResponse<SessionStatus> {
    let user = auth.0.map(|ctx| ctx.user);
    ApiResponse::ok(
        SessionStatus {
            authenticated: user.is_some(),
            user,
        },
        "Session status fetched",
    )
}
