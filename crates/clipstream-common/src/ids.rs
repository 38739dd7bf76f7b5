//! Identifier generation.
//!
//! Records use UUID v7 (time-sortable, coordination-free). Token ids use v4 so
//! two tokens minted for the same subject in the same second never collide.

use uuid::Uuid;

/// Generate a new record ID (UUID v7).
pub fn generate_id() -> Uuid {
    Uuid::now_v7()
}

/// Generate a unique token identifier for the `jti` claim.
pub fn token_id() -> String {
    Uuid::new_v4().simple().to_string()
}
