//! The Credential Record store contract.
//!
//! The store is the single source of truth for refresh-token validity. Every
//! method that mutates the refresh-token field does so in one atomic step;
//! [`CredentialStore::rotate_refresh_token`] in particular must compare and
//! overwrite without a window in between.

use async_trait::async_trait;
use clipstream_common::error::ClipResult;
use clipstream_common::models::user::{NewUser, ProfileChanges, User};
use uuid::Uuid;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new record. Fails with `AlreadyExists` when the username or
    /// email is taken (case-insensitive).
    async fn insert(&self, user: NewUser) -> ClipResult<User>;

    async fn find_by_id(&self, id: Uuid) -> ClipResult<Option<User>>;

    /// Look up by email or username; `identifier` is already normalized.
    async fn find_by_identifier(&self, identifier: &str) -> ClipResult<Option<User>>;

    /// Any record whose username or email matches either value.
    async fn find_conflicting(&self, username: &str, email: &str) -> ClipResult<Option<User>>;

    /// Unconditionally store `token_hash` as the live refresh token.
    /// Returns `false` if the record does not exist.
    async fn set_refresh_token(&self, id: Uuid, token_hash: &str) -> ClipResult<bool>;

    /// Replace the live refresh token only if it currently equals `expected`.
    /// Returns `false` (and changes nothing) on mismatch, on a cleared
    /// session, or if the record does not exist.
    async fn rotate_refresh_token(
        &self,
        id: Uuid,
        expected: &str,
        replacement: &str,
    ) -> ClipResult<bool>;

    /// Drop the live refresh token, ending the session.
    async fn clear_refresh_token(&self, id: Uuid) -> ClipResult<()>;

    /// Returns `false` if the record does not exist.
    async fn update_password(&self, id: Uuid, password_hash: &str) -> ClipResult<bool>;

    /// Apply a partial profile update. `AlreadyExists` if the new username or
    /// email belongs to another record; `None` if the record is gone.
    async fn update_profile(&self, id: Uuid, changes: &ProfileChanges)
    -> ClipResult<Option<User>>;

    async fn update_avatar(&self, id: Uuid, avatar: &str) -> ClipResult<Option<User>>;

    async fn update_cover_image(
        &self,
        id: Uuid,
        cover_image: Option<&str>,
    ) -> ClipResult<Option<User>>;

    /// Whether the backing store is reachable.
    async fn health_check(&self) -> bool;
}
