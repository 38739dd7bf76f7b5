//! Account routes for the authenticated user.

use axum::{
    extract::{Extension, State},
    middleware,
    routing::{get, put},
    Json, Router,
};
use axum_extra::extract::WithRejection;
use clipstream_common::{
    error::{ClipError, ClipResult},
    models::user::{
        ChangePasswordRequest, UpdateAvatarRequest, UpdateCoverImageRequest,
        UpdateProfileRequest, UserResponse,
    },
    response::ApiResponse,
    validation::validate_request,
};
use std::sync::Arc;

use crate::{
    middleware::{auth_gate, AuthContext, Gate},
    AppState,
};

/// User routes (all require authentication).
pub fn router(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/profile", get(get_profile))
        .route("/users/change-password", put(change_password))
        .route("/users/update-profile", put(update_profile))
        .route("/users/update-avatar", put(update_avatar))
        .route("/users/update-cover-image", put(update_cover_image))
        .route_layer(middleware::from_fn_with_state(
            Gate::required(state),
            auth_gate,
        ))
}

/// GET /api/v1/users/profile
async fn get_profile(Extension(auth): Extension<AuthContext>) -> ApiResponse<UserResponse> {
    ApiResponse::ok(auth.user, "User profile fetched")
}

/// PUT /api/v1/users/change-password
async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    WithRejection(Json(body), _): WithRejection<Json<ChangePasswordRequest>, ClipError>,
) -> ClipResult<ApiResponse<()>> {
    state.sessions.change_password(auth.user_id, &body).await?;
    Ok(ApiResponse::ok((), "Password changed successfully"))
}

/// PUT /api/v1/users/update-profile
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    WithRejection(Json(body), _): WithRejection<Json<UpdateProfileRequest>, ClipError>,
) -> ClipResult<ApiResponse<UserResponse>> {
    let user = state.sessions.update_profile(auth.user_id, &body).await?;
    Ok(ApiResponse::ok(user, "Profile updated successfully"))
}

/// PUT /api/v1/users/update-avatar
async fn update_avatar(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    WithRejection(Json(body), _): WithRejection<Json<UpdateAvatarRequest>, ClipError>,
) -> ClipResult<ApiResponse<UserResponse>> {
    validate_request(&body)?;
    let user = state
        .sessions
        .update_avatar(auth.user_id, &body.avatar)
        .await?;
    Ok(ApiResponse::ok(user, "Avatar updated successfully"))
}

/// PUT /api/v1/users/update-cover-image
///
/// A null or blank `cover_image` removes it.
async fn update_cover_image(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    WithRejection(Json(body), _): WithRejection<Json<UpdateCoverImageRequest>, ClipError>,
) -> ClipResult<ApiResponse<UserResponse>> {
    let cover_image = body.cover_image.as_deref().map(str::trim).filter(|s| !s.is_empty());
    if cover_image.is_some() {
        validate_request(&body)?;
    }
    let user = state
        .sessions
        .update_cover_image(auth.user_id, cover_image)
        .await?;
    Ok(ApiResponse::ok(user, "Cover image updated successfully"))
}
