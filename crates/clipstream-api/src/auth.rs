//! Password hashing and token minting.
//!
//! Access and refresh tokens are HS256 JWTs signed with two different secrets.
//! Keys are derived once from [`AuthConfig`] when the service is constructed.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, TimeDelta, Utc};
use clipstream_common::{
    auth::{self, AccessClaims, RefreshClaims, TokenKind},
    config::AuthConfig,
    error::{ClipError, ClipResult},
    ids,
    models::user::User,
};
use jsonwebtoken::{encode, DecodingKey, EncodingKey, Header};
use serde::Serialize;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Token pair returned on login and refresh.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: u64,
    pub token_type: String,
}

/// Hash a password using Argon2id with a random salt.
pub fn hash_password(password: &str) -> ClipResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| ClipError::internal(format!("password hashing failed: {e}")))?;
    Ok(hash.to_string())
}

/// Verify a password against an Argon2id hash.
pub fn verify_password(password: &str, hash: &str) -> ClipResult<bool> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| ClipError::internal(format!("stored password hash is malformed: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// SHA-256 hex digest of a refresh token, as persisted on the record.
pub fn digest_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Expiry timestamp `ttl_secs` after `now`, or an internal error when the
/// lifetime does not fit the calendar.
fn expires_at(now: DateTime<Utc>, ttl_secs: u64) -> ClipResult<i64> {
    i64::try_from(ttl_secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .map(|exp| exp.timestamp())
        .ok_or_else(|| {
            ClipError::internal(format!("token lifetime of {ttl_secs}s is out of range"))
        })
}

/// Signs and verifies both token kinds.
pub struct TokenService {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl_secs: u64,
    refresh_ttl_secs: u64,
}

impl TokenService {
    pub fn new(config: &AuthConfig) -> Self {
        let access = config.access_token_secret.as_bytes();
        let refresh = config.refresh_token_secret.as_bytes();
        Self {
            access_encoding: EncodingKey::from_secret(access),
            access_decoding: DecodingKey::from_secret(access),
            refresh_encoding: EncodingKey::from_secret(refresh),
            refresh_decoding: DecodingKey::from_secret(refresh),
            access_ttl_secs: config.access_token_ttl_secs,
            refresh_ttl_secs: config.refresh_token_ttl_secs,
        }
    }

    pub fn access_ttl_secs(&self) -> u64 {
        self.access_ttl_secs
    }

    pub fn refresh_ttl_secs(&self) -> u64 {
        self.refresh_ttl_secs
    }

    /// Generate a JWT access token carrying the user's public identity.
    pub fn generate_access_token(&self, user: &User) -> ClipResult<String> {
        let now = Utc::now();
        let claims = AccessClaims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            jti: ids::token_id(),
            iat: now.timestamp(),
            exp: expires_at(now, self.access_ttl_secs)?,
            token_type: TokenKind::Access,
        };

        encode(&Header::default(), &claims, &self.access_encoding)
            .map_err(|e| ClipError::Internal(e.into()))
    }

    /// Generate a JWT refresh token (longer-lived, subject only).
    pub fn generate_refresh_token(&self, user_id: Uuid) -> ClipResult<String> {
        let now = Utc::now();
        let claims = RefreshClaims {
            sub: user_id.to_string(),
            jti: ids::token_id(),
            iat: now.timestamp(),
            exp: expires_at(now, self.refresh_ttl_secs)?,
            token_type: TokenKind::Refresh,
        };

        encode(&Header::default(), &claims, &self.refresh_encoding)
            .map_err(|e| ClipError::Internal(e.into()))
    }

    /// Generate both access and refresh tokens.
    pub fn generate_token_pair(&self, user: &User) -> ClipResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.generate_access_token(user)?,
            refresh_token: self.generate_refresh_token(user.id)?,
            expires_in: self.access_ttl_secs,
            token_type: "Bearer".to_string(),
        })
    }

    pub fn verify_access(&self, token: &str) -> ClipResult<AccessClaims> {
        auth::validate_token(token, &self.access_decoding, TokenKind::Access)
    }

    pub fn verify_refresh(&self, token: &str) -> ClipResult<RefreshClaims> {
        auth::validate_token(token, &self.refresh_decoding, TokenKind::Refresh)
    }

    /// Verify a token of the given kind and resolve its subject.
    pub fn verify(&self, token: &str, kind: TokenKind) -> ClipResult<Uuid> {
        match kind {
            TokenKind::Access => auth::subject_id(&self.verify_access(token)?),
            TokenKind::Refresh => auth::subject_id(&self.verify_refresh(token)?),
        }
    }
}
