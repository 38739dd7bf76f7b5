//! Shared JWT claim types and token decoding.
//!
//! Claims and verification live here so any crate can check a token without
//! depending on the API layer. Password hashing and token minting stay in
//! clipstream-api.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ClipError;

/// Which of the two token families a JWT belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims embedded in short-lived access tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    /// Subject (user ID as string)
    pub sub: String,
    pub email: String,
    pub username: String,
    pub full_name: String,
    /// Unique token id
    pub jti: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    pub token_type: TokenKind,
}

/// Claims embedded in refresh tokens. Deliberately minimal: a refresh token
/// proves nothing beyond "this subject had a session".
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefreshClaims {
    pub sub: String,
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
    pub token_type: TokenKind,
}

/// Common view over both claim sets.
pub trait TokenClaims: DeserializeOwned {
    fn subject(&self) -> &str;
    fn kind(&self) -> TokenKind;
}

impl TokenClaims for AccessClaims {
    fn subject(&self) -> &str {
        &self.sub
    }

    fn kind(&self) -> TokenKind {
        self.token_type
    }
}

impl TokenClaims for RefreshClaims {
    fn subject(&self) -> &str {
        &self.sub
    }

    fn kind(&self) -> TokenKind {
        self.token_type
    }
}

/// Validate signature, expiry and kind of a JWT.
///
/// Expired tokens map to [`ClipError::TokenExpired`]; every other failure
/// (bad signature, malformed structure, wrong kind) maps to
/// [`ClipError::InvalidToken`].
pub fn validate_token<C: TokenClaims>(
    token: &str,
    key: &DecodingKey,
    expected: TokenKind,
) -> Result<C, ClipError> {
    let mut validation = Validation::default();
    validation.leeway = 0;

    let data = decode::<C>(token, key, &validation).map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => ClipError::TokenExpired,
        _ => ClipError::InvalidToken,
    })?;

    if data.claims.kind() != expected {
        return Err(ClipError::InvalidToken);
    }

    Ok(data.claims)
}

/// Parse the `sub` claim into a user id.
pub fn subject_id<C: TokenClaims>(claims: &C) -> Result<Uuid, ClipError> {
    claims
        .subject()
        .parse::<Uuid>()
        .map_err(|_| ClipError::InvalidToken)
}
