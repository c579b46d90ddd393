/// Health endpoints
use crate::AppState;
use actix_web::{web, HttpResponse};
use std::time::{Duration, Instant};

const DB_CHECK_TIMEOUT: Duration = Duration::from_secs(2);

/// Liveness: the process is up
pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "playtube-service",
    }))
}

/// Summary: PostgreSQL answers `SELECT 1`
pub async fn health_summary(state: web::Data<AppState>) -> HttpResponse {
    let start = Instant::now();
    let check = tokio::time::timeout(
        DB_CHECK_TIMEOUT,
        sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(&state.db),
    )
    .await;

    match check {
        Ok(Ok(_)) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "service": "playtube-service",
            "version": env!("CARGO_PKG_VERSION"),
            "database_latency_ms": start.elapsed().as_millis() as u64,
        })),
        Ok(Err(e)) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": format!("PostgreSQL connection failed: {}", e),
            "service": "playtube-service"
        })),
        Err(_) => HttpResponse::ServiceUnavailable().json(serde_json::json!({
            "status": "unhealthy",
            "error": "PostgreSQL health check timed out",
            "service": "playtube-service"
        })),
    }
}
