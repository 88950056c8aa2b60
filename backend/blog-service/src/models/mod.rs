/// Data models for blog-service
///
/// - User / Profile: identity and its 1:1 contact extension
/// - Blog: a post owned by exactly one author
/// - Comment: text attached to one blog by one author
/// - Row projections used by the feed (`FeedBlog`, `FeedComment`)
/// - Row projections used by the staff listings
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// User model - identity and credential
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub date_joined: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Fields needed to insert a user
#[derive(Debug, Clone)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub password_hash: &'a str,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Profile {
    pub id: i64,
    pub user_id: i64,
    pub contact_number: String,
    pub profile_picture: Option<String>,
}

/// Blog post row
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Blog {
    pub id: i64,
    pub title: String,
    pub content: String,
    /// Media key of the attached image, relative to the media root
    pub image: Option<String>,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Comment {
    pub id: i64,
    pub blog_id: i64,
    pub author_id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Blog joined with its author's username
#[derive(Debug, Clone, FromRow)]
pub struct FeedBlog {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub image: Option<String>,
    pub author_id: i64,
    pub author_username: String,
    pub created_at: DateTime<Utc>,
}

/// Comment joined with its author's username
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct FeedComment {
    pub id: i64,
    pub blog_id: i64,
    pub author_username: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Comment joined with its blog title and author, for moderation
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ModeratedComment {
    pub id: i64,
    pub blog_id: i64,
    pub blog_title: String,
    pub author_username: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// User with their profile columns, if a profile exists
#[derive(Debug, Clone, FromRow)]
pub struct UserWithProfile {
    #[sqlx(flatten)]
    pub user: User,
    pub contact_number: Option<String>,
    pub profile_picture: Option<String>,
}

/// Entry in the author filter of the blog listing
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct AuthorChoice {
    pub id: i64,
    pub username: String,
}

/// Flag filters for the user listing; `None` leaves a flag unconstrained
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UserFlags {
    pub is_staff: Option<bool>,
    pub is_superuser: Option<bool>,
    pub is_active: Option<bool>,
}
