/// Session database operations
///
/// Rows are keyed by the SHA-256 of the cookie token, never the token itself.
use crate::models::User;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

/// Create a new session
pub async fn create_session(
    pool: &PgPool,
    token_hash: &str,
    user_id: i64,
    expires_at: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO sessions (token_hash, user_id, expires_at)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(token_hash)
    .bind(user_id)
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Resolve a live session to its active user
pub async fn find_user(pool: &PgPool, token_hash: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.username, u.email, u.first_name, u.last_name, u.password_hash,
               u.is_active, u.is_staff, u.is_superuser, u.last_login, u.date_joined
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token_hash = $1 AND s.expires_at > NOW() AND u.is_active
        "#,
    )
    .bind(token_hash)
    .fetch_optional(pool)
    .await
}

/// Delete a single session
pub async fn delete_session(pool: &PgPool, token_hash: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
        .bind(token_hash)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Delete every session of a user (credential change)
pub async fn delete_user_sessions(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected())
}

/// Drop sessions past their expiry
pub async fn purge_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
