use crate::models::Profile;
use sqlx::{PgPool, Postgres, Transaction};

/// Insert the profile linked to a freshly created user
pub async fn create_profile(
    tx: &mut Transaction<'_, Postgres>,
    user_id: i64,
    contact_number: &str,
    profile_picture: Option<&str>,
) -> Result<Profile, sqlx::Error> {
    sqlx::query_as::<_, Profile>(
        r#"
        INSERT INTO profiles (user_id, contact_number, profile_picture)
        VALUES ($1, $2, $3)
        RETURNING id, user_id, contact_number, profile_picture
        "#,
    )
    .bind(user_id)
    .bind(contact_number)
    .bind(profile_picture)
    .fetch_one(&mut **tx)
    .await
}

pub async fn find_by_user(pool: &PgPool, user_id: i64) -> Result<Option<Profile>, sqlx::Error> {
    sqlx::query_as::<_, Profile>(
        "SELECT id, user_id, contact_number, profile_picture FROM profiles WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
}
