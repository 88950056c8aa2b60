//! Prometheus metrics for blog-service.
//!
//! Collectors live in the default registry and are exposed by the `/metrics`
//! handler below.

use actix_web::HttpResponse;
use prometheus::{Encoder, TextEncoder};

pub mod blog;

/// Actix handler that renders Prometheus metrics in text format.
pub async fn serve_metrics() -> HttpResponse {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        return HttpResponse::InternalServerError().body(err.to_string());
    }

    HttpResponse::Ok()
        .content_type(encoder.format_type())
        .body(buffer)
}
