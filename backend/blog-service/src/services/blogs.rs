/// Blog service - feed listing and author-only blog writes
use crate::db::{blog_repo, comment_repo};
use crate::error::Result;
use crate::forms::BlogForm;
use crate::metrics::blog::BLOG_WRITES_TOTAL;
use crate::models::{Blog, FeedBlog, FeedComment};
use crate::pagination::{Page, Paginator};
use crate::storage::{MediaKind, MediaStorage, ValidatedImage};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// One blog as shown in the feed
#[derive(Debug, Clone, Serialize)]
pub struct FeedItem {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub author: String,
    pub author_id: i64,
    /// Whether the viewer may edit or delete it
    pub is_owner: bool,
    pub created_at: DateTime<Utc>,
    pub comments: Vec<FeedComment>,
}

/// Blog as shown on the edit page
#[derive(Debug, Clone, Serialize)]
pub struct BlogView {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

pub struct BlogService {
    pool: PgPool,
    storage: Arc<MediaStorage>,
    page_size: i64,
}

impl BlogService {
    pub fn new(pool: PgPool, storage: Arc<MediaStorage>, page_size: i64) -> Self {
        Self {
            pool,
            storage,
            page_size,
        }
    }

    /// One page of the feed, newest first, optionally filtered by title
    pub async fn feed(
        &self,
        query: Option<&str>,
        page: Option<&str>,
        viewer_id: i64,
    ) -> Result<Page<FeedItem>> {
        let count = blog_repo::count_feed(&self.pool, query).await?;
        let paginator = Paginator::new(count, self.page_size);
        let number = paginator.resolve(page);

        let blogs = blog_repo::list_feed(
            &self.pool,
            query,
            paginator.per_page(),
            paginator.offset(number),
        )
        .await?;

        let ids: Vec<i64> = blogs.iter().map(|b| b.id).collect();
        let mut comments: HashMap<i64, Vec<FeedComment>> = HashMap::new();
        for comment in comment_repo::list_for_blogs(&self.pool, &ids).await? {
            comments.entry(comment.blog_id).or_default().push(comment);
        }

        let object_list = blogs
            .into_iter()
            .map(|blog| {
                let blog_comments = comments.remove(&blog.id).unwrap_or_default();
                self.feed_item(blog, blog_comments, viewer_id)
            })
            .collect();

        debug!(count, page = number, query = ?query, "feed page built");
        Ok(Page {
            info: paginator.page_info(number),
            object_list,
        })
    }

    fn feed_item(&self, blog: FeedBlog, comments: Vec<FeedComment>, viewer_id: i64) -> FeedItem {
        FeedItem {
            image_url: blog.image.as_deref().map(|key| self.storage.url(key)),
            is_owner: blog.author_id == viewer_id,
            id: blog.id,
            title: blog.title,
            content: blog.content,
            author: blog.author_username,
            author_id: blog.author_id,
            created_at: blog.created_at,
            comments,
        }
    }

    pub fn view(&self, blog: &Blog) -> BlogView {
        BlogView {
            id: blog.id,
            title: blog.title.clone(),
            content: blog.content.clone(),
            image_url: blog.image.as_deref().map(|key| self.storage.url(key)),
            created_at: blog.created_at,
        }
    }

    /// Create a blog authored by `author_id`; the form must be valid
    pub async fn create(
        &self,
        author_id: i64,
        form: &BlogForm,
        image: Option<&ValidatedImage>,
    ) -> Result<Blog> {
        let image_key = match image {
            Some(image) => Some(self.storage.save(MediaKind::BlogImage, image).await?),
            None => None,
        };

        let created = blog_repo::create_blog(
            &self.pool,
            author_id,
            &form.title,
            &form.content,
            image_key.as_deref(),
        )
        .await;

        let blog = match created {
            Ok(blog) => blog,
            Err(e) => {
                if let Some(key) = image_key.as_deref() {
                    self.storage.remove(key).await;
                }
                return Err(e.into());
            }
        };

        BLOG_WRITES_TOTAL.with_label_values(&["create"]).inc();
        info!(blog_id = blog.id, author_id, "blog created");
        Ok(blog)
    }

    /// The blog, only when `author_id` wrote it
    pub async fn find_owned(&self, blog_id: i64, author_id: i64) -> Result<Option<Blog>> {
        Ok(blog_repo::find_owned(&self.pool, blog_id, author_id).await?)
    }

    /// Overwrite title and content; the image changes only when one is given
    ///
    /// Returns `None` when the blog is missing or belongs to someone else.
    pub async fn update(
        &self,
        blog_id: i64,
        author_id: i64,
        form: &BlogForm,
        image: Option<&ValidatedImage>,
    ) -> Result<Option<Blog>> {
        let Some(existing) = self.find_owned(blog_id, author_id).await? else {
            return Ok(None);
        };

        let new_key = match image {
            Some(image) => Some(self.storage.save(MediaKind::BlogImage, image).await?),
            None => None,
        };

        let updated = blog_repo::update_owned(
            &self.pool,
            blog_id,
            author_id,
            &form.title,
            &form.content,
            new_key.as_deref(),
        )
        .await;

        let updated = match updated {
            Ok(updated) => updated,
            Err(e) => {
                if let Some(key) = new_key.as_deref() {
                    self.storage.remove(key).await;
                }
                return Err(e.into());
            }
        };

        match (&updated, new_key.as_deref(), existing.image.as_deref()) {
            (None, Some(new), _) => self.storage.remove(new).await,
            (Some(_), Some(new), Some(old)) if new != old => self.storage.remove(old).await,
            _ => {}
        }

        if updated.is_some() {
            BLOG_WRITES_TOTAL.with_label_values(&["edit"]).inc();
            info!(blog_id, author_id, "blog updated");
        }
        Ok(updated)
    }

    /// Delete an owned blog and its image; `false` when nothing matched
    pub async fn delete(&self, blog_id: i64, author_id: i64) -> Result<bool> {
        let Some(blog) = blog_repo::delete_owned(&self.pool, blog_id, author_id).await? else {
            debug!(blog_id, author_id, "delete matched no owned blog");
            return Ok(false);
        };

        if let Some(key) = blog.image.as_deref() {
            self.storage.remove(key).await;
        }

        BLOG_WRITES_TOTAL.with_label_values(&["delete"]).inc();
        info!(blog_id, author_id, "blog deleted");
        Ok(true)
    }
}
