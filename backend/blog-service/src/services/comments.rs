/// Comment service - attaches comments to blogs
use crate::db::{blog_repo, comment_repo};
use crate::error::{is_foreign_key_violation, Result};
use crate::metrics::blog::COMMENTS_CREATED_TOTAL;
use crate::models::Comment;
use crate::validators::has_null;
use sqlx::PgPool;
use tracing::debug;

pub struct CommentService {
    pool: PgPool,
}

impl CommentService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Add a comment to any existing blog
    ///
    /// The text is stored as given. Returns `None` when it is blank or holds
    /// NUL characters, or when the blog does not exist
    /// (including one deleted while the comment was being written).
    pub async fn add_comment(
        &self,
        blog_id: i64,
        author_id: i64,
        text: &str,
    ) -> Result<Option<Comment>> {
        if text.trim().is_empty() || has_null(text) {
            return Ok(None);
        }

        if blog_repo::find_by_id(&self.pool, blog_id).await?.is_none() {
            debug!(blog_id, "comment on missing blog ignored");
            return Ok(None);
        }

        match comment_repo::create_comment(&self.pool, blog_id, author_id, text).await {
            Ok(comment) => {
                COMMENTS_CREATED_TOTAL.inc();
                debug!(comment_id = comment.id, blog_id, author_id, "comment created");
                Ok(Some(comment))
            }
            Err(e) if is_foreign_key_violation(&e) => {
                debug!(blog_id, "blog vanished before comment insert");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
