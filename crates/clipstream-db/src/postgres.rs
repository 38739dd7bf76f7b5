//! PostgreSQL-backed [`CredentialStore`].

use async_trait::async_trait;
use clipstream_common::error::{ClipError, ClipResult};
use clipstream_common::models::user::{NewUser, ProfileChanges, User};
use sqlx::PgPool;
use uuid::Uuid;

use crate::repository::users;
use crate::store::CredentialStore;

/// Verify the database is reachable.
pub async fn health_check(pool: &PgPool) -> bool {
    sqlx::query("SELECT 1").execute(pool).await.is_ok()
}

/// Turn a unique-index violation into a 409; pass everything else through.
fn map_unique_violation(err: sqlx::Error) -> ClipError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            let resource = match db.constraint() {
                Some(c) if c.contains("email") => "Email",
                Some(c) if c.contains("username") => "Username",
                _ => "User with email or username",
            };
            ClipError::AlreadyExists {
                resource: resource.into(),
            }
        }
        _ => ClipError::Database(err),
    }
}

#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn insert(&self, user: NewUser) -> ClipResult<User> {
        users::create_user(&self.pool, &user)
            .await
            .map_err(map_unique_violation)
    }

    async fn find_by_id(&self, id: Uuid) -> ClipResult<Option<User>> {
        Ok(users::find_by_id(&self.pool, id).await?)
    }

    async fn find_by_identifier(&self, identifier: &str) -> ClipResult<Option<User>> {
        Ok(users::find_by_identifier(&self.pool, identifier).await?)
    }

    async fn find_conflicting(&self, username: &str, email: &str) -> ClipResult<Option<User>> {
        Ok(users::find_by_username_or_email(&self.pool, username, email).await?)
    }

    async fn set_refresh_token(&self, id: Uuid, token_hash: &str) -> ClipResult<bool> {
        Ok(users::set_refresh_token(&self.pool, id, token_hash).await? == 1)
    }

    async fn rotate_refresh_token(
        &self,
        id: Uuid,
        expected: &str,
        replacement: &str,
    ) -> ClipResult<bool> {
        Ok(users::swap_refresh_token(&self.pool, id, expected, replacement).await? == 1)
    }

    async fn clear_refresh_token(&self, id: Uuid) -> ClipResult<()> {
        Ok(users::clear_refresh_token(&self.pool, id).await?)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> ClipResult<bool> {
        Ok(users::update_password(&self.pool, id, password_hash).await? == 1)
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> ClipResult<Option<User>> {
        users::update_profile(&self.pool, id, changes)
            .await
            .map_err(map_unique_violation)
    }

    async fn update_avatar(&self, id: Uuid, avatar: &str) -> ClipResult<Option<User>> {
        Ok(users::update_avatar(&self.pool, id, avatar).await?)
    }

    async fn update_cover_image(
        &self,
        id: Uuid,
        cover_image: Option<&str>,
    ) -> ClipResult<Option<User>> {
        Ok(users::update_cover_image(&self.pool, id, cover_image).await?)
    }

    async fn health_check(&self) -> bool {
        health_check(&self.pool).await
    }
}
