/// HTTP handlers for blog-service
///
/// Every page handler answers with either a redirect or a rendered `Page`.
pub mod admin;
pub mod auth;
pub mod blogs;
pub mod comments;
pub mod feed;
pub mod health;
pub mod media;
pub mod password_reset;

pub use admin::{admin_blogs, admin_comments, admin_users};
pub use auth::{login, login_page, logout, register, register_page};
pub use blogs::{create_blog, create_blog_page, delete_blog, edit_blog, edit_blog_page};
pub use comments::add_comment;
pub use feed::home;
pub use health::{health_check, liveness_check};
pub use media::serve_media;
pub use password_reset::{reset_password, reset_password_page};

use crate::error::Result;
use crate::forms::FormErrors;
use crate::storage::{inspect_image, MediaStorage, UploadRejection, ValidatedImage};
use actix_multipart::form::tempfile::TempFile;
use actix_multipart::form::text::Text;

/// Search text from a `q` parameter; empty means no search
///
/// NUL can never match stored text and Postgres rejects it as a bind.
pub(crate) fn search_text(q: Option<String>) -> Option<String> {
    q.map(|q| q.replace('\0', "")).filter(|q| !q.is_empty())
}

/// Value of an optional multipart text part
pub(crate) fn text_part(part: Option<Text<String>>) -> String {
    part.map(Text::into_inner).unwrap_or_default()
}

/// Validate an optional file part, recording a rejection on `field`
///
/// An empty part (no file chosen in the browser) counts as no upload.
pub(crate) async fn read_image_part(
    part: Option<TempFile>,
    storage: &MediaStorage,
    field: &str,
    errors: &mut FormErrors,
) -> Result<Option<ValidatedImage>> {
    let Some(part) = part.filter(|p| p.size > 0) else {
        return Ok(None);
    };

    let max = storage.max_upload_bytes();
    if part.size > max {
        errors.add(field, UploadRejection::TooLarge { max }.to_string());
        return Ok(None);
    }

    let bytes = tokio::fs::read(part.file.path()).await?;
    match inspect_image(bytes, max).await {
        Ok(image) => Ok(Some(image)),
        Err(rejection) => {
            tracing::debug!(
                field,
                file_name = part.file_name.as_deref().unwrap_or(""),
                %rejection,
                "upload rejected"
            );
            errors.add(field, rejection.to_string());
            Ok(None)
        }
    }
}
