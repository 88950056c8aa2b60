use crate::error::{AppError, Result};
use crate::storage::{MediaKind, MediaStorage};
use actix_web::http::header::{CacheControl, CacheDirective};
use actix_web::{web, HttpResponse};

/// Serve a stored upload by `{kind}/{name}`
pub async fn serve_media(
    path: web::Path<(String, String)>,
    storage: web::Data<MediaStorage>,
) -> Result<HttpResponse> {
    let (kind, name) = path.into_inner();
    let kind = MediaKind::from_dir(&kind)
        .ok_or_else(|| AppError::NotFound(format!("media kind {}", kind)))?;

    let Some((bytes, mime)) = storage.read(kind, &name).await? else {
        return Err(AppError::NotFound(format!("media file {}", name)));
    };

    Ok(HttpResponse::Ok()
        .content_type(mime)
        .insert_header(CacheControl(vec![
            CacheDirective::Public,
            CacheDirective::MaxAge(86_400),
        ]))
        .body(bytes))
}
