/// User database operations
use crate::db::escape_like;
use crate::models::{NewUser, User, UserFlags, UserWithProfile};
use crate::validators::has_null;
use sqlx::{PgPool, Postgres, Transaction};

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, password_hash, \
     is_active, is_staff, is_superuser, last_login, date_joined";

/// Find user by exact username
///
/// A username holding NUL matches nobody; Postgres would reject the bind.
pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, sqlx::Error> {
    if has_null(username) {
        return Ok(None);
    }

    sqlx::query_as::<_, User>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
    ))
    .bind(username)
    .fetch_optional(pool)
    .await
}

pub async fn username_exists(pool: &PgPool, username: &str) -> Result<bool, sqlx::Error> {
    if has_null(username) {
        return Ok(false);
    }

    let (exists,): (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(pool)
            .await?;

    Ok(exists)
}

/// Insert a user inside the caller's transaction
pub async fn create_user(
    tx: &mut Transaction<'_, Postgres>,
    new_user: &NewUser<'_>,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (username, email, first_name, last_name, password_hash)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(new_user.username)
    .bind(new_user.email)
    .bind(new_user.first_name)
    .bind(new_user.last_name)
    .bind(new_user.password_hash)
    .fetch_one(&mut **tx)
    .await
}

/// Replace the stored password hash
pub async fn update_password(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
    password_hash: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
        .bind(password_hash)
        .bind(user_id)
        .execute(&mut **tx)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Record a successful login
pub async fn touch_last_login(pool: &PgPool, user_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

const USER_SEARCH: &str = r#"
    WHERE ($1::BOOLEAN IS NULL OR u.is_staff = $1)
      AND ($2::BOOLEAN IS NULL OR u.is_superuser = $2)
      AND ($3::BOOLEAN IS NULL OR u.is_active = $3)
      AND ($4::TEXT IS NULL
           OR u.username ILIKE '%' || $4 || '%'
           OR u.email ILIKE '%' || $4 || '%'
           OR u.first_name ILIKE '%' || $4 || '%'
           OR u.last_name ILIKE '%' || $4 || '%')
"#;

/// Count users for the staff listing
pub async fn count_moderated(
    pool: &PgPool,
    flags: UserFlags,
    query: Option<&str>,
) -> Result<i64, sqlx::Error> {
    let pattern = query.map(escape_like);

    let (count,): (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM users u {USER_SEARCH}"))
        .bind(flags.is_staff)
        .bind(flags.is_superuser)
        .bind(flags.is_active)
        .bind(pattern)
        .fetch_one(pool)
        .await?;

    Ok(count)
}

/// One page of users with their profiles, ordered by username
pub async fn list_moderated(
    pool: &PgPool,
    flags: UserFlags,
    query: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<UserWithProfile>, sqlx::Error> {
    let pattern = query.map(escape_like);

    sqlx::query_as::<_, UserWithProfile>(&format!(
        r#"
        SELECT u.id, u.username, u.email, u.first_name, u.last_name, u.password_hash,
               u.is_active, u.is_staff, u.is_superuser, u.last_login, u.date_joined,
               p.contact_number, p.profile_picture
        FROM users u
        LEFT JOIN profiles p ON p.user_id = u.id
        {USER_SEARCH}
        ORDER BY u.username
        LIMIT $5 OFFSET $6
        "#
    ))
    .bind(flags.is_staff)
    .bind(flags.is_superuser)
    .bind(flags.is_active)
    .bind(pattern)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}
