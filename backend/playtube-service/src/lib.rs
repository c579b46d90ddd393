/// PlayTube Service Library
///
/// REST backend for a video / short / playlist / community-post sharing
/// site: accounts, channels, uploads proxied to a hosted media service,
/// reactions, comments, subscriptions, watch history, recommendations and
/// AI-assisted search.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and route table
/// - `models`: Rows and response payloads
/// - `services`: Business logic (auth, email, media, ai, recommendation, search)
/// - `db`: Repositories over PostgreSQL
/// - `middleware`: Session-token authentication
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `metrics`: Prometheus collectors
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};

use services::auth::OtpLimiter;
use services::{EmailService, LanguageModel, MediaStorage};
use sqlx::PgPool;
use std::sync::Arc;

/// Shared state handed to every handler through `web::Data`
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub email: EmailService,
    pub media: Arc<dyn MediaStorage>,
    pub ai: Arc<dyn LanguageModel>,
    pub otp_limiter: OtpLimiter,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        config: Config,
        email: EmailService,
        media: Arc<dyn MediaStorage>,
        ai: Arc<dyn LanguageModel>,
    ) -> Self {
        Self {
            otp_limiter: OtpLimiter::per_minute(config.auth.otp_per_minute),
            db,
            email,
            media,
            ai,
            config: Arc::new(config),
        }
    }

    pub fn cookie_secure(&self) -> bool {
        self.config.auth.cookie_secure
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.config.media.max_upload_bytes
    }
}
