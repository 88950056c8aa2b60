/// Blog create, edit and delete
///
/// Edit and delete only ever see blogs written by the caller. A missing or
/// foreign blog sends the caller back to the feed without a message.
use crate::config::Config;
use crate::error::Result;
use crate::forms::{BlogForm, BoundForm, FormErrors};
use crate::handlers::{read_image_part, text_part};
use crate::middleware::CurrentUser;
use crate::models::Blog;
use crate::render::{redirect, Page, Target};
use crate::services::BlogService;
use crate::storage::MediaStorage;
use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use actix_web::{web, Either, HttpResponse};
use sqlx::PgPool;

/// Blog submitted as multipart (with an optional image)
#[derive(MultipartForm)]
pub struct BlogUpload {
    title: Option<Text<String>>,
    content: Option<Text<String>>,
    image: Option<TempFile>,
}

pub type BlogPayload = Either<MultipartForm<BlogUpload>, web::Form<BlogForm>>;

fn into_parts(payload: BlogPayload) -> (BlogForm, Option<TempFile>) {
    match payload {
        Either::Left(MultipartForm(upload)) => (
            BlogForm {
                title: text_part(upload.title),
                content: text_part(upload.content),
            },
            upload.image,
        ),
        Either::Right(form) => (form.into_inner(), None),
    }
}

fn blog_service(
    pool: &web::Data<PgPool>,
    config: &web::Data<Config>,
    storage: &web::Data<MediaStorage>,
) -> BlogService {
    BlogService::new(
        pool.get_ref().clone(),
        storage.clone().into_inner(),
        config.feed.page_size,
    )
}

fn edit_view(service: &BlogService, blog: &Blog, form: BoundForm) -> HttpResponse {
    Page::new("edit_blog")
        .with("blog", service.view(blog))
        .with("form", form)
        .render()
}

pub async fn create_blog_page(_user: CurrentUser) -> Page {
    Page::new("create_blog").with("form", BoundForm::unbound())
}

pub async fn create_blog(
    user: CurrentUser,
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    storage: web::Data<MediaStorage>,
    payload: BlogPayload,
) -> Result<HttpResponse> {
    let (form, image) = into_parts(payload);

    let mut errors = form.errors();
    let image = read_image_part(image, &storage, "image", &mut errors).await?;
    if !errors.is_empty() {
        return Ok(Page::new("create_blog")
            .with(
                "form",
                BoundForm {
                    data: form.public_data(),
                    errors,
                },
            )
            .render());
    }

    blog_service(&pool, &config, &storage)
        .create(user.id(), &form, image.as_ref())
        .await?;

    Ok(redirect(Target::Home))
}

pub async fn edit_blog_page(
    user: CurrentUser,
    path: web::Path<i64>,
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    storage: web::Data<MediaStorage>,
) -> Result<HttpResponse> {
    let blog_id = path.into_inner();
    let service = blog_service(&pool, &config, &storage);

    let Some(blog) = service.find_owned(blog_id, user.id()).await? else {
        tracing::debug!(blog_id, user_id = user.id(), "edit of missing or foreign blog");
        return Ok(redirect(Target::Home));
    };

    let form = BlogForm {
        title: blog.title.clone(),
        content: blog.content.clone(),
    };
    Ok(edit_view(
        &service,
        &blog,
        BoundForm {
            data: form.public_data(),
            errors: FormErrors::new(),
        },
    ))
}

pub async fn edit_blog(
    user: CurrentUser,
    path: web::Path<i64>,
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    storage: web::Data<MediaStorage>,
    payload: BlogPayload,
) -> Result<HttpResponse> {
    let blog_id = path.into_inner();
    let service = blog_service(&pool, &config, &storage);

    let Some(blog) = service.find_owned(blog_id, user.id()).await? else {
        tracing::debug!(blog_id, user_id = user.id(), "edit of missing or foreign blog");
        return Ok(redirect(Target::Home));
    };

    let (form, image) = into_parts(payload);
    let mut errors = form.errors();
    let image = read_image_part(image, &storage, "image", &mut errors).await?;
    if !errors.is_empty() {
        return Ok(edit_view(
            &service,
            &blog,
            BoundForm {
                data: form.public_data(),
                errors,
            },
        ));
    }

    service
        .update(blog_id, user.id(), &form, image.as_ref())
        .await?;

    Ok(redirect(Target::Home))
}

pub async fn delete_blog(
    user: CurrentUser,
    path: web::Path<i64>,
    pool: web::Data<PgPool>,
    config: web::Data<Config>,
    storage: web::Data<MediaStorage>,
) -> Result<HttpResponse> {
    let blog_id = path.into_inner();
    blog_service(&pool, &config, &storage)
        .delete(blog_id, user.id())
        .await?;

    Ok(redirect(Target::Home))
}
