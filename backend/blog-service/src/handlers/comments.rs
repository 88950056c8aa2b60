use crate::error::Result;
use crate::forms::CommentForm;
use crate::middleware::CurrentUser;
use crate::render::{redirect, Target};
use crate::services::CommentService;
use actix_web::{web, HttpResponse};
use sqlx::PgPool;

/// Comment on any blog; blank text or an unknown blog is silently ignored
pub async fn add_comment(
    user: CurrentUser,
    path: web::Path<i64>,
    pool: web::Data<PgPool>,
    form: web::Form<CommentForm>,
) -> Result<HttpResponse> {
    if let Some(text) = form.text() {
        CommentService::new(pool.get_ref().clone())
            .add_comment(path.into_inner(), user.id(), text)
            .await?;
    }

    Ok(redirect(Target::Home))
}
