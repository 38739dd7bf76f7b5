//! In-process [`CredentialStore`] for lite mode and tests.
//!
//! One `RwLock` guards the whole map, so every read-modify-write (uniqueness
//! check + insert, compare + swap) happens under a single write guard.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use clipstream_common::error::{ClipError, ClipResult};
use clipstream_common::models::user::{NewUser, ProfileChanges, User};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::store::CredentialStore;

#[derive(Default)]
pub struct MemoryCredentialStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

/// Which unique field of `candidate` collides with some record other than `skip`.
fn conflict(
    users: &HashMap<Uuid, User>,
    skip: Option<Uuid>,
    username: Option<&str>,
    email: Option<&str>,
) -> Option<&'static str> {
    users
        .values()
        .filter(|u| Some(u.id) != skip)
        .find_map(|u| {
            if username.is_some_and(|n| u.username.eq_ignore_ascii_case(n)) {
                Some("Username")
            } else if email.is_some_and(|e| u.email.eq_ignore_ascii_case(e)) {
                Some("Email")
            } else {
                None
            }
        })
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn insert(&self, new: NewUser) -> ClipResult<User> {
        let mut users = self.users.write().await;
        if let Some(resource) = conflict(&users, None, Some(&new.username), Some(&new.email)) {
            return Err(ClipError::AlreadyExists {
                resource: resource.into(),
            });
        }

        let now = Utc::now();
        let user = User {
            id: new.id,
            username: new.username,
            email: new.email,
            full_name: new.full_name,
            avatar: new.avatar,
            cover_image: new.cover_image,
            password_hash: new.password_hash,
            refresh_token_hash: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> ClipResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_identifier(&self, identifier: &str) -> ClipResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| {
                u.email.eq_ignore_ascii_case(identifier) || u.username.eq_ignore_ascii_case(identifier)
            })
            .cloned())
    }

    async fn find_conflicting(&self, username: &str, email: &str) -> ClipResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.username.eq_ignore_ascii_case(username) || u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn set_refresh_token(&self, id: Uuid, token_hash: &str) -> ClipResult<bool> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) => {
                user.refresh_token_hash = Some(token_hash.to_string());
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn rotate_refresh_token(
        &self,
        id: Uuid,
        expected: &str,
        replacement: &str,
    ) -> ClipResult<bool> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) if user.refresh_token_hash.as_deref() == Some(expected) => {
                user.refresh_token_hash = Some(replacement.to_string());
                user.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn clear_refresh_token(&self, id: Uuid) -> ClipResult<()> {
        if let Some(user) = self.users.write().await.get_mut(&id) {
            user.refresh_token_hash = None;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> ClipResult<bool> {
        let mut users = self.users.write().await;
        match users.get_mut(&id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: &ProfileChanges,
    ) -> ClipResult<Option<User>> {
        let mut users = self.users.write().await;
        if let Some(resource) = conflict(
            &users,
            Some(id),
            changes.username.as_deref(),
            changes.email.as_deref(),
        ) {
            return Err(ClipError::AlreadyExists {
                resource: resource.into(),
            });
        }

        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(full_name) = &changes.full_name {
            user.full_name = full_name.clone();
        }
        if let Some(username) = &changes.username {
            user.username = username.clone();
        }
        if let Some(email) = &changes.email {
            user.email = email.clone();
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn update_avatar(&self, id: Uuid, avatar: &str) -> ClipResult<Option<User>> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).map(|user| {
            user.avatar = avatar.to_string();
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn update_cover_image(
        &self,
        id: Uuid,
        cover_image: Option<&str>,
    ) -> ClipResult<Option<User>> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).map(|user| {
            user.cover_image = cover_image.map(str::to_string);
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn health_check(&self) -> bool {
        true
    }
}
