use actix_web::{web, HttpResponse, Responder};
use serde::Serialize;
use sqlx::PgPool;
use std::time::Instant;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    database: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    latency_ms: Option<u64>,
}

/// Basic health check (database connectivity only)
pub async fn health_check(pool: web::Data<PgPool>) -> impl Responder {
    let start = Instant::now();
    let healthy = sqlx::query("SELECT 1")
        .fetch_one(pool.get_ref())
        .await
        .map_err(|e| tracing::warn!(error = %e, "health check database probe failed"))
        .is_ok();

    let body = HealthResponse {
        status: if healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        database: if healthy { "healthy" } else { "unhealthy" },
        latency_ms: healthy.then(|| start.elapsed().as_millis() as u64),
    };

    if healthy {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}

/// Liveness probe; never touches dependencies
pub async fn liveness_check() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({ "status": "alive" }))
}
