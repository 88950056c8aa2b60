use actix_web::{middleware::Logger, HttpServer};
use anyhow::Context;
use blog_service::config::Config;
use blog_service::db::{self, session_repo, DbConfig};
use blog_service::storage::MediaStorage;
use sqlx::PgPool;
use std::io;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Expired sessions are swept this often
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler; waiting for Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Periodically delete sessions past their expiry
async fn sweep_sessions(pool: PgPool) {
    let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
    loop {
        ticker.tick().await;
        match session_repo::purge_expired(&pool).await {
            Ok(0) => {}
            Ok(purged) => tracing::info!(purged, "expired sessions removed"),
            Err(e) => tracing::warn!(error = %e, "session sweep failed"),
        }
    }
}

/// Blog Service
///
/// Serves the blog site: feed, accounts, blogs, comments and uploaded media.
///
/// # Routes
///
/// - `/` - Paged, searchable feed (signed-in users)
/// - `/register`, `/login`, `/logout`, `/password-reset` - Accounts
/// - `/blog/*` - Create, edit, delete and comment on blogs
/// - `/media/*` - Uploaded images
/// - `/health`, `/health/live`, `/metrics` - Operations
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let config = Config::from_env()
        .map_err(anyhow::Error::msg)
        .context("Failed to load configuration")?;

    tracing::info!(
        env = %config.app.env,
        production = config.is_production(),
        host = %config.app.host,
        port = config.app.port,
        "Starting blog-service"
    );

    let db_config = DbConfig::from_config("blog-service", &config.database);
    db_config.log_config();
    let pool = db::create_pool(db_config)
        .await
        .context("Failed to create database pool")?;

    db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;
    tracing::info!("Database migrations applied");

    let storage = MediaStorage::new(&config.media);
    storage
        .ensure_dirs()
        .await
        .context("Failed to prepare media directories")?;

    let bind_address = (config.app.host.clone(), config.app.port);
    let workers = config.app.workers;

    let server_pool = pool.clone();
    let server = HttpServer::new(move || {
        blog_service::build_app(server_pool.clone(), config.clone(), storage.clone())
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
    })
    .bind(bind_address)
    .context("Failed to bind HTTP listener")?
    .workers(workers)
    .disable_signals()
    .run();

    let server_handle = server.handle();

    let mut tasks: JoinSet<io::Result<()>> = JoinSet::new();

    tasks.spawn(async move {
        tracing::info!("HTTP server is running");
        server.await
    });

    let sweep_pool = pool.clone();
    tasks.spawn(async move {
        sweep_sessions(sweep_pool).await;
        Ok(())
    });

    let mut first_error: Option<io::Error> = None;

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = tasks.join_next() => {
                match result {
                    Some(Ok(Ok(()))) => {
                        tracing::info!("Background task completed");
                    }
                    Some(Ok(Err(e))) => {
                        tracing::error!(error = %e, "Task returned error");
                        first_error.get_or_insert(e);
                        server_handle.stop(true).await;
                        tasks.shutdown().await;
                        break;
                    }
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "Task join error");
                        first_error.get_or_insert(io::Error::new(io::ErrorKind::Other, e.to_string()));
                        server_handle.stop(true).await;
                        tasks.shutdown().await;
                        break;
                    }
                    None => break,
                }
            }
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received");
                server_handle.stop(true).await;
                tasks.shutdown().await;
                break;
            }
        }
    }

    pool.close().await;
    tracing::info!("blog-service stopped");

    match first_error {
        Some(e) => Err(e).context("blog-service task failed"),
        None => Ok(()),
    }
}
