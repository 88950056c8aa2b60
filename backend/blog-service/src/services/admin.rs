/// Moderation service - read-only staff listings over blogs, comments and users
use crate::db::{blog_repo, comment_repo, user_repo};
use crate::error::Result;
use crate::models::{AuthorChoice, ModeratedComment, UserFlags, UserWithProfile};
use crate::pagination::{Page, Paginator};
use crate::storage::MediaStorage;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::debug;

/// Rows per page in every staff listing
pub const LIST_PER_PAGE: i64 = 100;

/// Blog row in the staff listing
#[derive(Debug, Clone, Serialize)]
pub struct ModeratedBlog {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub author_id: i64,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub contact_number: String,
    pub profile_picture_url: Option<String>,
}

/// User row in the staff listing, profile inline
#[derive(Debug, Clone, Serialize)]
pub struct ModeratedUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub date_joined: DateTime<Utc>,
    pub profile: Option<ProfileView>,
}

pub struct ModerationService {
    pool: PgPool,
    storage: Arc<MediaStorage>,
}

impl ModerationService {
    pub fn new(pool: PgPool, storage: Arc<MediaStorage>) -> Self {
        Self { pool, storage }
    }

    /// All blogs, newest first, by author and/or title/username search
    pub async fn blogs(
        &self,
        author_id: Option<i64>,
        query: Option<&str>,
        page: Option<&str>,
    ) -> Result<Page<ModeratedBlog>> {
        let count = blog_repo::count_moderated(&self.pool, author_id, query).await?;
        let paginator = Paginator::new(count, LIST_PER_PAGE);
        let number = paginator.resolve(page);

        let object_list = blog_repo::list_moderated(
            &self.pool,
            author_id,
            query,
            paginator.per_page(),
            paginator.offset(number),
        )
        .await?
        .into_iter()
        .map(|blog| ModeratedBlog {
            image_url: blog.image.as_deref().map(|key| self.storage.url(key)),
            id: blog.id,
            title: blog.title,
            author: blog.author_username,
            author_id: blog.author_id,
            created_at: blog.created_at,
        })
        .collect();

        debug!(
            count = paginator.count(),
            page = number,
            ?author_id,
            query = ?query,
            "staff blog listing"
        );
        Ok(Page {
            info: paginator.page_info(number),
            object_list,
        })
    }

    pub async fn authors(&self) -> Result<Vec<AuthorChoice>> {
        Ok(blog_repo::list_authors(&self.pool).await?)
    }

    /// All comments, newest first, searched over blog title, author and text
    pub async fn comments(
        &self,
        query: Option<&str>,
        page: Option<&str>,
    ) -> Result<Page<ModeratedComment>> {
        let count = comment_repo::count_moderated(&self.pool, query).await?;
        let paginator = Paginator::new(count, LIST_PER_PAGE);
        let number = paginator.resolve(page);

        let object_list = comment_repo::list_moderated(
            &self.pool,
            query,
            paginator.per_page(),
            paginator.offset(number),
        )
        .await?;

        debug!(count = paginator.count(), page = number, query = ?query, "staff comments");
        Ok(Page {
            info: paginator.page_info(number),
            object_list,
        })
    }

    /// All users by username, filtered on account flags
    pub async fn users(
        &self,
        flags: UserFlags,
        query: Option<&str>,
        page: Option<&str>,
    ) -> Result<Page<ModeratedUser>> {
        let count = user_repo::count_moderated(&self.pool, flags, query).await?;
        let paginator = Paginator::new(count, LIST_PER_PAGE);
        let number = paginator.resolve(page);

        let object_list = user_repo::list_moderated(
            &self.pool,
            flags,
            query,
            paginator.per_page(),
            paginator.offset(number),
        )
        .await?
        .into_iter()
        .map(|row| self.user_row(row))
        .collect();

        debug!(count = paginator.count(), page = number, ?flags, "staff users");
        Ok(Page {
            info: paginator.page_info(number),
            object_list,
        })
    }

    fn user_row(&self, row: UserWithProfile) -> ModeratedUser {
        let profile = row.contact_number.map(|contact_number| ProfileView {
            contact_number,
            profile_picture_url: row.profile_picture.as_deref().map(|key| self.storage.url(key)),
        });
        let user = row.user;

        ModeratedUser {
            full_name: user.full_name(),
            id: user.id,
            username: user.username,
            email: user.email,
            is_active: user.is_active,
            is_staff: user.is_staff,
            is_superuser: user.is_superuser,
            last_login: user.last_login,
            date_joined: user.date_joined,
            profile,
        }
    }
}
