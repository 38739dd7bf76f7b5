//! Request gate: resolve the presented access token into a request-scoped identity.
//!
//! The gate runs once per request and stores its result in request extensions;
//! handlers read it, they never re-derive it. Each route group picks a
//! [`GateMode`] when it attaches the layer:
//!
//! - [`GateMode::Required`] rejects the request with 401 when no valid identity
//!   can be resolved and inserts [`AuthContext`].
//! - [`GateMode::Optional`] never rejects for auth reasons and inserts
//!   [`MaybeAuth`], which is empty when the token is missing or invalid.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use clipstream_common::{
    auth::TokenKind,
    error::{ClipError, ClipResult},
    models::user::UserResponse,
};
use uuid::Uuid;

use crate::{cookies, AppState};

/// Identity attached by the gate.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    /// Sanitized record, loaded once by the gate.
    pub user: UserResponse,
}

/// Identity attached by an optional gate.
#[derive(Debug, Clone, Default)]
pub struct MaybeAuth(pub Option<AuthContext>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateMode {
    Required,
    Optional,
}

/// Middleware state: the app plus the mode this route group asked for.
#[derive(Clone)]
pub struct Gate {
    state: Arc<AppState>,
    mode: GateMode,
}

impl Gate {
    pub fn required(state: &Arc<AppState>) -> Self {
        Self {
            state: state.clone(),
            mode: GateMode::Required,
        }
    }

    pub fn optional(state: &Arc<AppState>) -> Self {
        Self {
            state: state.clone(),
            mode: GateMode::Optional,
        }
    }
}

/// The presented access token: the `accessToken` cookie, else `Authorization: Bearer`.
pub fn presented_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    cookies::read(jar, cookies::ACCESS_COOKIE).or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    })
}

async fn resolve(state: &AppState, token: Option<String>) -> ClipResult<AuthContext> {
    let token = token.ok_or(ClipError::Unauthorized)?;
    let user_id = state.sessions.verify(&token, TokenKind::Access)?;

    let user = state
        .sessions
        .store()
        .find_by_id(user_id)
        .await?
        .ok_or(ClipError::InvalidToken)?;

    Ok(AuthContext {
        user_id,
        user: user.into(),
    })
}

/// Axum middleware implementing both gate modes.
pub async fn auth_gate(
    State(gate): State<Gate>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ClipError> {
    let token = presented_token(&jar, request.headers());
    let resolved = resolve(&gate.state, token).await;

    match (gate.mode, resolved) {
        (GateMode::Required, Ok(ctx)) => {
            request.extensions_mut().insert(ctx);
        }
        (GateMode::Required, Err(e)) => return Err(e),
        (GateMode::Optional, Ok(ctx)) => {
            request.extensions_mut().insert(MaybeAuth(Some(ctx)));
        }
        // Store failures are not an auth outcome; surface them.
        (GateMode::Optional, Err(e)) if e.status_code() != StatusCode::UNAUTHORIZED => {
            return Err(e);
        }
        (GateMode::Optional, Err(e)) => {
            tracing::debug!(reason = %e, "Optional gate continuing without identity");
            request.extensions_mut().insert(MaybeAuth(None));
        }
    }

    Ok(next.run(request).await)
}
