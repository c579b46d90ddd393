//! Prometheus metrics for playtube-service.
//!
//! Exposes upload/AI/interaction collectors and an HTTP handler for the
//! `/metrics` endpoint.

use actix_web::HttpResponse;
use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

lazy_static! {
    /// Uploads to the media host by resource kind and outcome (ok/error).
    pub static ref MEDIA_UPLOADS: IntCounterVec = register_int_counter_vec!(
        "playtube_media_uploads_total",
        "Uploads to the hosted media service segmented by kind and outcome",
        &["kind", "outcome"]
    )
    .expect("failed to register playtube_media_uploads_total");

    pub static ref MEDIA_UPLOAD_DURATION: HistogramVec = register_histogram_vec!(
        "playtube_media_upload_duration_seconds",
        "Upload round-trip time to the hosted media service",
        &["kind"],
        vec![0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]
    )
    .expect("failed to register playtube_media_upload_duration_seconds");

    /// Generative-AI requests by outcome.
    pub static ref AI_REQUESTS: IntCounterVec = register_int_counter_vec!(
        "playtube_ai_requests_total",
        "Generative AI requests segmented by outcome",
        &["outcome"]
    )
    .expect("failed to register playtube_ai_requests_total");

    /// Times search fell back to local behaviour (search/category).
    pub static ref AI_FALLBACKS: IntCounterVec = register_int_counter_vec!(
        "playtube_ai_fallbacks_total",
        "AI-assisted operations that used the local fallback",
        &["operation"]
    )
    .expect("failed to register playtube_ai_fallbacks_total");

    /// Reaction and subscription toggles by target and resulting state.
    pub static ref TOGGLES: IntCounterVec = register_int_counter_vec!(
        "playtube_toggles_total",
        "Like/dislike/save/subscribe toggles segmented by target and state",
        &["target", "state"]
    )
    .expect("failed to register playtube_toggles_total");

    pub static ref AUTH_EVENTS: IntCounterVec = register_int_counter_vec!(
        "playtube_auth_events_total",
        "Authentication events segmented by event and outcome",
        &["event", "outcome"]
    )
    .expect("failed to register playtube_auth_events_total");
}

/// Count a toggle; `active` is the state after the call
pub fn record_toggle(target: &str, active: bool) {
    TOGGLES
        .with_label_values(&[target, if active { "on" } else { "off" }])
        .inc();
}

pub fn record_auth(event: &str, success: bool) {
    AUTH_EVENTS
        .with_label_values(&[event, if success { "ok" } else { "rejected" }])
        .inc();
}

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
