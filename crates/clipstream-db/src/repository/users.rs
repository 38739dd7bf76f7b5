//! SQL for credential records.

use clipstream_common::models::user::{NewUser, ProfileChanges, User};
use sqlx::PgPool;
use uuid::Uuid;

/// Create a new user account.
pub async fn create_user(pool: &PgPool, user: &NewUser) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, username, email, full_name, avatar, cover_image, password_hash, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW())
        RETURNING *
        "#,
    )
    .bind(user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.full_name)
    .bind(&user.avatar)
    .bind(&user.cover_image)
    .bind(&user.password_hash)
    .fetch_one(pool)
    .await
}

/// Find a user by their unique ID.
pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Find a user whose email or username matches (case-insensitive).
pub async fn find_by_identifier(
    pool: &PgPool,
    identifier: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE LOWER(email) = LOWER($1) OR LOWER(username) = LOWER($1) LIMIT 1",
    )
    .bind(identifier)
    .fetch_optional(pool)
    .await
}

/// Find any user holding either the username or the email.
pub async fn find_by_username_or_email(
    pool: &PgPool,
    username: &str,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE LOWER(username) = LOWER($1) OR LOWER(email) = LOWER($2) LIMIT 1",
    )
    .bind(username)
    .bind(email)
    .fetch_optional(pool)
    .await
}

/// Overwrite the stored refresh token digest. Returns rows affected.
pub async fn set_refresh_token(
    pool: &PgPool,
    id: Uuid,
    token_hash: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE users SET refresh_token_hash = $2, updated_at = NOW() WHERE id = $1",
    )
    .bind(id)
    .bind(token_hash)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Compare-and-swap the refresh token digest in a single statement.
///
/// Row-level locking makes a concurrent second swap from the same `expected`
/// value re-evaluate the `WHERE` clause against the committed replacement, so
/// it matches zero rows.
pub async fn swap_refresh_token(
    pool: &PgPool,
    id: Uuid,
    expected: &str,
    replacement: &str,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE users SET
            refresh_token_hash = $3,
            updated_at = NOW()
        WHERE id = $1 AND refresh_token_hash = $2
        "#,
    )
    .bind(id)
    .bind(expected)
    .bind(replacement)
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

/// Clear the stored refresh token digest.
pub async fn clear_refresh_token(pool: &PgPool, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET refresh_token_hash = NULL, updated_at = NOW() WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Replace the password hash. Returns rows affected.
pub async fn update_password(
    pool: &PgPool,
    id: Uuid,
    password_hash: &str,
) -> Result<u64, sqlx::Error> {
    let result =
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(pool)
            .await?;
    Ok(result.rows_affected())
}

/// Update profile fields.
pub async fn update_profile(
    pool: &PgPool,
    id: Uuid,
    changes: &ProfileChanges,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users SET
            full_name = COALESCE($2, full_name),
            username = COALESCE($3, username),
            email = COALESCE($4, email),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&changes.full_name)
    .bind(&changes.username)
    .bind(&changes.email)
    .fetch_optional(pool)
    .await
}

pub async fn update_avatar(
    pool: &PgPool,
    id: Uuid,
    avatar: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET avatar = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(avatar)
    .fetch_optional(pool)
    .await
}

pub async fn update_cover_image(
    pool: &PgPool,
    id: Uuid,
    cover_image: Option<&str>,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        "UPDATE users SET cover_image = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(cover_image)
    .fetch_optional(pool)
    .await
}
