/// Blog Service Library
///
/// A small multi-user blogging site: registration and login with server-side
/// sessions, blogs with optional images, comments, a searchable paged feed
/// and read-only staff listings. Pages are returned as a template name plus a
/// JSON context.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers (pages, redirects, media, health)
/// - `services`: Business logic layer
/// - `db`: Database access layer and repositories
/// - `forms`: Submitted form objects and their validation
/// - `middleware`: Session resolution and request metrics
/// - `storage`: Uploaded image storage
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod db;
pub mod error;
pub mod forms;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod render;
pub mod security;
pub mod services;
pub mod storage;
pub mod validators;

pub use config::Config;
pub use error::{AppError, Result};

use actix_multipart::form::MultipartFormConfig;
use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{web, App};
use sqlx::PgPool;
use storage::MediaStorage;

/// Limit for url-encoded bodies (blog content can be long)
const FORM_LIMIT_BYTES: usize = 1024 * 1024;

/// Room for text parts alongside an upload
const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Build the application with all routes, shared state and middleware
///
/// The binary adds access logging on top; tests use it as is.
pub fn build_app(
    pool: PgPool,
    config: Config,
    storage: MediaStorage,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let upload_limit = config.media.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;
    let media_route = format!("{}/{{kind}}/{{name}}", config.media.url_prefix);
    let serve_media_locally = config.media.url_prefix.starts_with('/');
    let session = middleware::SessionMiddleware::new(pool.clone(), config.session.cookie_name.clone());

    let app = App::new()
        .app_data(web::Data::new(pool))
        .app_data(web::Data::new(config))
        .app_data(web::Data::new(storage))
        .app_data(
            MultipartFormConfig::default()
                .total_limit(upload_limit)
                .memory_limit(MULTIPART_OVERHEAD_BYTES),
        )
        .app_data(web::PayloadConfig::new(upload_limit))
        .app_data(web::FormConfig::default().limit(FORM_LIMIT_BYTES))
        .wrap(session)
        .wrap(middleware::MetricsMiddleware)
        .route("/metrics", web::get().to(metrics::serve_metrics))
        .route("/health", web::get().to(handlers::health_check))
        .route("/health/live", web::get().to(handlers::liveness_check))
        .route("/", web::get().to(handlers::home))
        .service(
            web::resource("/register")
                .route(web::get().to(handlers::register_page))
                .route(web::post().to(handlers::register)),
        )
        .service(
            web::resource("/login")
                .route(web::get().to(handlers::login_page))
                .route(web::post().to(handlers::login)),
        )
        .route("/logout", web::post().to(handlers::logout))
        .service(
            web::resource("/password-reset")
                .route(web::get().to(handlers::reset_password_page))
                .route(web::post().to(handlers::reset_password)),
        )
        .service(
            web::scope("/blog")
                .service(
                    web::resource("/create")
                        .route(web::get().to(handlers::create_blog_page))
                        .route(web::post().to(handlers::create_blog)),
                )
                .service(
                    web::resource("/{id}/edit")
                        .route(web::get().to(handlers::edit_blog_page))
                        .route(web::post().to(handlers::edit_blog)),
                )
                .route("/{id}/delete", web::post().to(handlers::delete_blog))
                .route("/{id}/comment", web::post().to(handlers::add_comment)),
        )
        .service(
            web::scope("/admin")
                .route("/blogs", web::get().to(handlers::admin_blogs))
                .route("/comments", web::get().to(handlers::admin_comments))
                .route("/users", web::get().to(handlers::admin_users)),
        );

    if serve_media_locally {
        app.route(&media_route, web::get().to(handlers::serve_media))
    } else {
        app
    }
}
