//! Session/credential manager.
//!
//! Owns password verification, token issuance, refresh-token rotation and
//! logout. The refresh-token field of a Credential Record moves through two
//! states:
//!
//! ```text
//! no-session        --issue-->             active(T1)
//! active(T)         --refresh(T)-->        active(T2)
//! active(T)         --refresh(other)-->    active(T)   (401, unchanged)
//! active(T)         --logout-->            no-session
//! no-session        --refresh(any)-->      no-session  (401)
//! ```
//!
//! Only digests of refresh tokens are persisted; the compare-and-overwrite on
//! refresh is delegated to [`CredentialStore::rotate_refresh_token`], which is
//! atomic in every backend.

use std::sync::Arc;

use clipstream_common::{
    auth::TokenKind,
    config::AuthConfig,
    error::{ClipError, ClipResult},
    ids,
    models::user::{
        ChangePasswordRequest, NewUser, ProfileChanges, RegisterRequest, UpdateProfileRequest,
        UserResponse,
    },
    validation::{normalize_identity, require_non_blank, validate_request},
};
use clipstream_db::CredentialStore;
use serde::Serialize;
use uuid::Uuid;

use crate::auth::{self, TokenPair, TokenService};

/// Tokens plus the sanitized record they were issued for.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user: UserResponse,
    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
    tokens: Arc<TokenService>,
}

impl SessionManager {
    pub fn new(store: Arc<dyn CredentialStore>, config: &AuthConfig) -> Self {
        Self {
            store,
            tokens: Arc::new(TokenService::new(config)),
        }
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Create a Credential Record. Every check runs before the store is touched
    /// for writing.
    pub async fn register(&self, req: RegisterRequest) -> ClipResult<UserResponse> {
        require_non_blank("Password", &req.password)?;
        let req = RegisterRequest {
            full_name: require_non_blank("Full name", &req.full_name)?.to_string(),
            username: normalize_identity(require_non_blank("Username", &req.username)?),
            email: normalize_identity(require_non_blank("Email", &req.email)?),
            password: req.password,
            avatar: require_non_blank("Avatar image", &req.avatar)?.to_string(),
            cover_image: req
                .cover_image
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        };
        validate_request(&req)?;

        if self
            .store
            .find_conflicting(&req.username, &req.email)
            .await?
            .is_some()
        {
            return Err(ClipError::AlreadyExists {
                resource: "User with email or username".into(),
            });
        }

        let password_hash = auth::hash_password(&req.password)?;

        // The unique indexes still guard against a concurrent registration
        // slipping between the check above and this insert.
        let created = self
            .store
            .insert(NewUser {
                id: ids::generate_id(),
                username: req.username,
                email: req.email,
                full_name: req.full_name,
                avatar: req.avatar,
                cover_image: req.cover_image,
                password_hash,
            })
            .await?;

        let user = self
            .store
            .find_by_id(created.id)
            .await?
            .ok_or_else(|| ClipError::internal("user vanished immediately after registration"))?;

        tracing::info!(user_id = %user.id, username = %user.username, "New user registered");
        Ok(user.into())
    }

    /// Check a password against the record found by email or username, then
    /// start a session.
    pub async fn authenticate(&self, identifier: &str, password: &str) -> ClipResult<Session> {
        let identifier = normalize_identity(require_non_blank("Username or email", identifier)?);

        let user = self
            .store
            .find_by_identifier(&identifier)
            .await?
            .ok_or_else(|| ClipError::NotFound {
                resource: "User".into(),
            })?;

        if !auth::verify_password(password, &user.password_hash)? {
            tracing::warn!(user_id = %user.id, "Login rejected: wrong password");
            return Err(ClipError::InvalidCredentials);
        }

        let session = self.issue(user.id).await?;
        tracing::info!(user_id = %user.id, "User logged in");
        Ok(session)
    }

    /// Mint a fresh token pair for `user_id` and make its refresh token the
    /// only live one, replacing whatever was stored before.
    pub async fn issue(&self, user_id: Uuid) -> ClipResult<Session> {
        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ClipError::internal("user disappeared before tokens were issued"))?;

        let tokens = self.tokens.generate_token_pair(&user)?;

        if !self
            .store
            .set_refresh_token(user.id, &auth::digest_token(&tokens.refresh_token))
            .await?
        {
            return Err(ClipError::internal(
                "user disappeared while tokens were issued",
            ));
        }

        Ok(Session {
            user: user.into(),
            tokens,
        })
    }

    /// Pure signature/expiry check; never touches the store.
    pub fn verify(&self, token: &str, kind: TokenKind) -> ClipResult<Uuid> {
        self.tokens.verify(token, kind)
    }

    /// Exchange a refresh token for a new pair. The presented token must be
    /// the one currently stored; once rotated away it is dead for good.
    pub async fn refresh(&self, presented: &str) -> ClipResult<Session> {
        let presented = presented.trim();
        if presented.is_empty() {
            return Err(ClipError::Unauthorized);
        }

        let user_id = self.tokens.verify(presented, TokenKind::Refresh)?;

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(ClipError::InvalidToken)?;

        let tokens = self.tokens.generate_token_pair(&user)?;

        let rotated = self
            .store
            .rotate_refresh_token(
                user.id,
                &auth::digest_token(presented),
                &auth::digest_token(&tokens.refresh_token),
            )
            .await?;

        if !rotated {
            tracing::warn!(user_id = %user.id, "Refresh rejected: token is stale or session ended");
            return Err(ClipError::RefreshTokenReused);
        }

        tracing::debug!(user_id = %user.id, "Refresh token rotated");
        Ok(Session {
            user: user.into(),
            tokens,
        })
    }

    /// End the session: no refresh succeeds until the next login.
    pub async fn logout(&self, user_id: Uuid) -> ClipResult<()> {
        self.store.clear_refresh_token(user_id).await?;
        tracing::info!(user_id = %user_id, "User logged out");
        Ok(())
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        req: &ChangePasswordRequest,
    ) -> ClipResult<()> {
        validate_request(req)?;

        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ClipError::NotFound {
                resource: "User".into(),
            })?;

        if !auth::verify_password(&req.old_password, &user.password_hash)? {
            tracing::warn!(user_id = %user.id, "Password change rejected: wrong old password");
            return Err(ClipError::InvalidCredentials);
        }

        let new_hash = auth::hash_password(&req.new_password)?;
        if !self.store.update_password(user.id, &new_hash).await? {
            return Err(ClipError::NotFound {
                resource: "User".into(),
            });
        }

        tracing::info!(user_id = %user.id, "Password changed");
        Ok(())
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        req: &UpdateProfileRequest,
    ) -> ClipResult<UserResponse> {
        let req = UpdateProfileRequest {
            full_name: req
                .full_name
                .as_deref()
                .map(|v| require_non_blank("Full name", v).map(str::to_string))
                .transpose()?,
            username: req
                .username
                .as_deref()
                .map(|v| require_non_blank("Username", v).map(normalize_identity))
                .transpose()?,
            email: req
                .email
                .as_deref()
                .map(|v| require_non_blank("Email", v).map(normalize_identity))
                .transpose()?,
        };
        validate_request(&req)?;

        let changes = ProfileChanges {
            full_name: req.full_name,
            username: req.username,
            email: req.email,
        };
        if changes.is_empty() {
            return Err(ClipError::validation(
                "At least one of full_name, username or email is required",
            ));
        }

        let user = self
            .store
            .update_profile(user_id, &changes)
            .await?
            .ok_or_else(|| ClipError::NotFound {
                resource: "User".into(),
            })?;

        tracing::info!(user_id = %user.id, "Profile updated");
        Ok(user.into())
    }

    pub async fn update_avatar(&self, user_id: Uuid, avatar: &str) -> ClipResult<UserResponse> {
        let avatar = require_non_blank("Avatar image", avatar)?;
        self.store
            .update_avatar(user_id, avatar)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| ClipError::NotFound {
                resource: "User".into(),
            })
    }

    pub async fn update_cover_image(
        &self,
        user_id: Uuid,
        cover_image: Option<&str>,
    ) -> ClipResult<UserResponse> {
        let cover_image = cover_image.map(str::trim).filter(|s| !s.is_empty());
        self.store
            .update_cover_image(user_id, cover_image)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| ClipError::NotFound {
                resource: "User".into(),
            })
    }
}
