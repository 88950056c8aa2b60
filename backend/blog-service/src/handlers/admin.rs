/// Staff moderation pages: read-only listings of blogs, comments and users
use crate::error::Result;
use crate::handlers::search_text;
use crate::middleware::StaffUser;
use crate::models::UserFlags;
use crate::render::Page;
use crate::services::ModerationService;
use crate::storage::MediaStorage;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;

#[derive(Debug, Deserialize)]
pub struct BlogListParams {
    pub q: Option<String>,
    /// Author id; anything unparsable lists every author
    pub author: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CommentListParams {
    pub q: Option<String>,
    pub page: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserListParams {
    pub q: Option<String>,
    pub is_staff: Option<String>,
    pub is_superuser: Option<String>,
    pub is_active: Option<String>,
    pub page: Option<String>,
}

/// `1`/`true` and `0`/`false`; anything else leaves the flag unfiltered
fn parse_flag(raw: Option<&str>) -> Option<bool> {
    match raw?.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn service(pool: &web::Data<PgPool>, storage: web::Data<MediaStorage>) -> ModerationService {
    ModerationService::new(pool.get_ref().clone(), storage.into_inner())
}

pub async fn admin_blogs(
    staff: StaffUser,
    pool: web::Data<PgPool>,
    storage: web::Data<MediaStorage>,
    params: web::Query<BlogListParams>,
) -> Result<HttpResponse> {
    let params = params.into_inner();
    let query = search_text(params.q);
    let query = query.as_deref();
    let author = params
        .author
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i64>().ok());

    let service = service(&pool, storage);
    let page = service.blogs(author, query, params.page.as_deref()).await?;
    let authors = service.authors().await?;

    Ok(Page::new("admin_blogs")
        .with("page_obj", page)
        .with("authors", authors)
        .with("author", author)
        .with("query", query)
        .with("staff", staff.username())
        .render())
}

pub async fn admin_comments(
    staff: StaffUser,
    pool: web::Data<PgPool>,
    storage: web::Data<MediaStorage>,
    params: web::Query<CommentListParams>,
) -> Result<HttpResponse> {
    let params = params.into_inner();
    let query = search_text(params.q);
    let query = query.as_deref();

    let page = service(&pool, storage)
        .comments(query, params.page.as_deref())
        .await?;

    Ok(Page::new("admin_comments")
        .with("page_obj", page)
        .with("query", query)
        .with("staff", staff.username())
        .render())
}

pub async fn admin_users(
    staff: StaffUser,
    pool: web::Data<PgPool>,
    storage: web::Data<MediaStorage>,
    params: web::Query<UserListParams>,
) -> Result<HttpResponse> {
    let params = params.into_inner();
    let query = search_text(params.q);
    let query = query.as_deref();
    let flags = UserFlags {
        is_staff: parse_flag(params.is_staff.as_deref()),
        is_superuser: parse_flag(params.is_superuser.as_deref()),
        is_active: parse_flag(params.is_active.as_deref()),
    };

    let page = service(&pool, storage)
        .users(flags, query, params.page.as_deref())
        .await?;

    Ok(Page::new("admin_users")
        .with("page_obj", page)
        .with("filters", flags)
        .with("query", query)
        .with("staff", staff.username())
        .render())
}
