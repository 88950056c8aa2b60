use crate::config::Config;
use crate::error::Result;
use crate::handlers::search_text;
use crate::middleware::CurrentUser;
use crate::render::Page;
use crate::services::BlogService;
use crate::storage::MediaStorage;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;

#[derive(Debug, Deserialize)]
pub struct FeedParams {
    pub q: Option<String>,
    /// Kept as text; anything unparsable falls back to the first page
    pub page: Option<String>,
}

/// Home feed: newest blogs first, optional title search, paged
pub async fn home(
    user: CurrentUser,
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    storage: web::Data<MediaStorage>,
    params: web::Query<FeedParams>,
) -> Result<HttpResponse> {
    let params = params.into_inner();
    let query = search_text(params.q);
    let query = query.as_deref();

    let service = BlogService::new(
        pool.get_ref().clone(),
        storage.into_inner(),
        config.feed.page_size,
    );
    let page = service
        .feed(query, params.page.as_deref(), user.id())
        .await?;

    Ok(Page::new("home")
        .with("page_obj", page)
        .with("query", query)
        .with(
            "user",
            json!({ "id": user.id(), "username": user.username() }),
        )
        .render())
}
