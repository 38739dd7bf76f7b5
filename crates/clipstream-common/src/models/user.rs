//! User model: the Credential Record and its request/response shapes.
//!
//! Username and email are stored trimmed and lower-cased, so equality on the
//! stored values is case-insensitive equality on what the user typed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::validation::USERNAME_REGEX;

/// A stored account, secrets included. Never serialized to clients directly;
/// convert to [`UserResponse`] first.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v7, time-sortable)
    pub id: Uuid,

    /// Unique, lower-cased username
    pub username: String,

    /// Unique, lower-cased email
    pub email: String,

    pub full_name: String,

    /// Avatar reference on the external media host (required)
    pub avatar: String,

    /// Optional cover image reference
    pub cover_image: Option<String>,

    /// Argon2id password hash
    pub password_hash: String,

    /// SHA-256 digest of the single live refresh token, if a session exists
    pub refresh_token_hash: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to insert a new account. Already normalized and hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub password_hash: String,
}

/// Partial profile update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub full_name: Option<String>,
    pub username: Option<String>,
    pub email: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.username.is_none() && self.email.is_none()
    }
}

/// Registration request. Media upload happens elsewhere; the avatar and cover
/// image arrive as references the media host already issued.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(max = 64, message = "Full name must be at most 64 characters"))]
    pub full_name: String,

    #[validate(length(min = 3, max = 32, message = "Username must be 3-32 characters"))]
    #[validate(regex(
        path = *USERNAME_REGEX,
        message = "Username can only contain letters, numbers, dots, underscores, and hyphens"
    ))]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub password: String,

    #[validate(url(message = "Avatar must be a URL"))]
    pub avatar: String,

    #[validate(url(message = "Cover image must be a URL"))]
    pub cover_image: Option<String>,
}

/// Login request: email or username, plus password.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    pub email: Option<String>,

    pub username: Option<String>,

    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

impl LoginRequest {
    /// The identifier to look up: email when given, otherwise username.
    pub fn identifier(&self) -> Option<&str> {
        [self.email.as_deref(), self.username.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|s| !s.is_empty())
    }
}

/// Body fallback for clients that cannot send the refresh cookie.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, max = 128))]
    pub old_password: String,

    #[validate(length(min = 8, max = 128, message = "Password must be 8-128 characters"))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 64))]
    pub full_name: Option<String>,

    #[validate(length(min = 3, max = 32, message = "Username must be 3-32 characters"))]
    #[validate(regex(
        path = *USERNAME_REGEX,
        message = "Username can only contain letters, numbers, dots, underscores, and hyphens"
    ))]
    pub username: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateAvatarRequest {
    #[validate(url(message = "Avatar must be a URL"))]
    pub avatar: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCoverImageRequest {
    /// `None` removes the cover image.
    #[validate(url(message = "Cover image must be a URL"))]
    pub cover_image: Option<String>,
}

/// Sanitized user: password hash and refresh token removed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    pub cover_image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            full_name: u.full_name,
            avatar: u.avatar,
            cover_image: u.cover_image,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}
