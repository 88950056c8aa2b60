use crate::db::escape_like;
use crate::models::{Comment, FeedComment, ModeratedComment};
use sqlx::PgPool;

/// Create a new comment on a blog
pub async fn create_comment(
    pool: &PgPool,
    blog_id: i64,
    author_id: i64,
    text: &str,
) -> Result<Comment, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        INSERT INTO comments (blog_id, author_id, text)
        VALUES ($1, $2, $3)
        RETURNING id, blog_id, author_id, text, created_at
        "#,
    )
    .bind(blog_id)
    .bind(author_id)
    .bind(text)
    .fetch_one(pool)
    .await
}

/// Comments for a set of blogs, oldest first
pub async fn list_for_blogs(
    pool: &PgPool,
    blog_ids: &[i64],
) -> Result<Vec<FeedComment>, sqlx::Error> {
    if blog_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, FeedComment>(
        r#"
        SELECT c.id, c.blog_id, u.username AS author_username, c.text, c.created_at
        FROM comments c
        JOIN users u ON u.id = c.author_id
        WHERE c.blog_id = ANY($1)
        ORDER BY c.created_at ASC, c.id ASC
        "#,
    )
    .bind(blog_ids)
    .fetch_all(pool)
    .await
}

pub async fn count_moderated(pool: &PgPool, query: Option<&str>) -> Result<i64, sqlx::Error> {
    let pattern = query.map(escape_like);

    let (count,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM comments c
        JOIN blogs b ON b.id = c.blog_id
        JOIN users u ON u.id = c.author_id
        WHERE ($1::TEXT IS NULL
               OR b.title ILIKE '%' || $1 || '%'
               OR u.username ILIKE '%' || $1 || '%'
               OR c.text ILIKE '%' || $1 || '%')
        "#,
    )
    .bind(pattern)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// One page of all comments, newest first, searched over blog title,
/// author username and text
pub async fn list_moderated(
    pool: &PgPool,
    query: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<ModeratedComment>, sqlx::Error> {
    let pattern = query.map(escape_like);

    sqlx::query_as::<_, ModeratedComment>(
        r#"
        SELECT c.id, c.blog_id, b.title AS blog_title,
               u.username AS author_username, c.text, c.created_at
        FROM comments c
        JOIN blogs b ON b.id = c.blog_id
        JOIN users u ON u.id = c.author_id
        WHERE ($1::TEXT IS NULL
               OR b.title ILIKE '%' || $1 || '%'
               OR u.username ILIKE '%' || $1 || '%'
               OR c.text ILIKE '%' || $1 || '%')
        ORDER BY c.created_at DESC, c.id DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(pattern)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}
