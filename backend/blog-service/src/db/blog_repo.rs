use crate::db::escape_like;
use crate::models::{AuthorChoice, Blog, FeedBlog};
use sqlx::PgPool;

/// Create a new blog owned by `author_id`
pub async fn create_blog(
    pool: &PgPool,
    author_id: i64,
    title: &str,
    content: &str,
    image: Option<&str>,
) -> Result<Blog, sqlx::Error> {
    sqlx::query_as::<_, Blog>(
        r#"
        INSERT INTO blogs (title, content, image, author_id)
        VALUES ($1, $2, $3, $4)
        RETURNING id, title, content, image, author_id, created_at
        "#,
    )
    .bind(title)
    .bind(content)
    .bind(image)
    .bind(author_id)
    .fetch_one(pool)
    .await
}

/// Get a blog by ID regardless of owner
pub async fn find_by_id(pool: &PgPool, blog_id: i64) -> Result<Option<Blog>, sqlx::Error> {
    sqlx::query_as::<_, Blog>(
        r#"
        SELECT id, title, content, image, author_id, created_at
        FROM blogs
        WHERE id = $1
        "#,
    )
    .bind(blog_id)
    .fetch_optional(pool)
    .await
}

/// Get a blog only if `author_id` owns it
pub async fn find_owned(
    pool: &PgPool,
    blog_id: i64,
    author_id: i64,
) -> Result<Option<Blog>, sqlx::Error> {
    sqlx::query_as::<_, Blog>(
        r#"
        SELECT id, title, content, image, author_id, created_at
        FROM blogs
        WHERE id = $1 AND author_id = $2
        "#,
    )
    .bind(blog_id)
    .bind(author_id)
    .fetch_optional(pool)
    .await
}

/// Overwrite title/content of an owned blog; the image is replaced only when
/// `image` is `Some`
pub async fn update_owned(
    pool: &PgPool,
    blog_id: i64,
    author_id: i64,
    title: &str,
    content: &str,
    image: Option<&str>,
) -> Result<Option<Blog>, sqlx::Error> {
    sqlx::query_as::<_, Blog>(
        r#"
        UPDATE blogs
        SET title = $1, content = $2, image = COALESCE($3, image)
        WHERE id = $4 AND author_id = $5
        RETURNING id, title, content, image, author_id, created_at
        "#,
    )
    .bind(title)
    .bind(content)
    .bind(image)
    .bind(blog_id)
    .bind(author_id)
    .fetch_optional(pool)
    .await
}

/// Delete an owned blog, returning the removed row
pub async fn delete_owned(
    pool: &PgPool,
    blog_id: i64,
    author_id: i64,
) -> Result<Option<Blog>, sqlx::Error> {
    sqlx::query_as::<_, Blog>(
        r#"
        DELETE FROM blogs
        WHERE id = $1 AND author_id = $2
        RETURNING id, title, content, image, author_id, created_at
        "#,
    )
    .bind(blog_id)
    .bind(author_id)
    .fetch_optional(pool)
    .await
}

/// Count blogs matching the optional case-insensitive title filter
pub async fn count_feed(pool: &PgPool, query: Option<&str>) -> Result<i64, sqlx::Error> {
    let pattern = query.map(escape_like);

    let (count,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM blogs
        WHERE ($1::TEXT IS NULL OR title ILIKE '%' || $1 || '%')
        "#,
    )
    .bind(pattern)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// One page of the feed, newest first
pub async fn list_feed(
    pool: &PgPool,
    query: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<FeedBlog>, sqlx::Error> {
    let pattern = query.map(escape_like);

    sqlx::query_as::<_, FeedBlog>(
        r#"
        SELECT b.id, b.title, b.content, b.image, b.author_id,
               u.username AS author_username, b.created_at
        FROM blogs b
        JOIN users u ON u.id = b.author_id
        WHERE ($1::TEXT IS NULL OR b.title ILIKE '%' || $1 || '%')
        ORDER BY b.created_at DESC, b.id DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(pattern)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Count blogs for the staff listing: optional author, then a search over
/// title and author username
pub async fn count_moderated(
    pool: &PgPool,
    author_id: Option<i64>,
    query: Option<&str>,
) -> Result<i64, sqlx::Error> {
    let pattern = query.map(escape_like);

    let (count,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM blogs b
        JOIN users u ON u.id = b.author_id
        WHERE ($1::BIGINT IS NULL OR b.author_id = $1)
          AND ($2::TEXT IS NULL
               OR b.title ILIKE '%' || $2 || '%'
               OR u.username ILIKE '%' || $2 || '%')
        "#,
    )
    .bind(author_id)
    .bind(pattern)
    .fetch_one(pool)
    .await?;

    Ok(count)
}

/// One page of the staff blog listing, newest first
pub async fn list_moderated(
    pool: &PgPool,
    author_id: Option<i64>,
    query: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<FeedBlog>, sqlx::Error> {
    let pattern = query.map(escape_like);

    sqlx::query_as::<_, FeedBlog>(
        r#"
        SELECT b.id, b.title, b.content, b.image, b.author_id,
               u.username AS author_username, b.created_at
        FROM blogs b
        JOIN users u ON u.id = b.author_id
        WHERE ($1::BIGINT IS NULL OR b.author_id = $1)
          AND ($2::TEXT IS NULL
               OR b.title ILIKE '%' || $2 || '%'
               OR u.username ILIKE '%' || $2 || '%')
        ORDER BY b.created_at DESC, b.id DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(author_id)
    .bind(pattern)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Users who have written at least one blog, by username
pub async fn list_authors(pool: &PgPool) -> Result<Vec<AuthorChoice>, sqlx::Error> {
    sqlx::query_as::<_, AuthorChoice>(
        r#"
        SELECT u.id, u.username
        FROM users u
        WHERE EXISTS (SELECT 1 FROM blogs b WHERE b.author_id = u.id)
        ORDER BY u.username
        "#,
    )
    .fetch_all(pool)
    .await
}
