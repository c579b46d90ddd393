use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use crypto_core::jwt;
use db_pool::{create_pool, DbConfig};
use playtube_service::handlers;
use playtube_service::services::{ai, media::CloudinaryStorage, EmailService};
use playtube_service::{AppState, Config};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const OTP_LIMITER_PRUNE_INTERVAL: Duration = Duration::from_secs(60);

fn io_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    io::Error::new(io::ErrorKind::Other, format!("{context}: {err}"))
}

fn init_tracing() {
    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .init();
}

fn build_cors(allowed_origins: &str) -> Cors {
    let mut cors = Cors::default();
    for origin in allowed_origins.split(',') {
        let origin = origin.trim();
        if origin.is_empty() {
            continue;
        }
        if origin == "*" {
            cors = cors.allow_any_origin();
        } else {
            cors = cors.allowed_origin(origin);
        }
    }
    cors.allow_any_method()
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}

async fn healthcheck(port: u16) -> io::Result<()> {
    let url = format!("http://127.0.0.1:{}/api/health/live", port);
    match reqwest::Client::new().get(&url).send().await {
        Ok(resp) if resp.status().is_success() => Ok(()),
        Ok(resp) => {
            eprintln!("healthcheck HTTP status: {}", resp.status());
            Err(io_error("healthcheck failed", resp.status()))
        }
        Err(e) => {
            eprintln!("healthcheck HTTP error: {}", e);
            Err(io_error("healthcheck error", e))
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenvy::dotenv().ok();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Container healthcheck: `playtube-service healthcheck`
    if std::env::args().nth(1).as_deref() == Some("healthcheck") {
        return healthcheck(config.app.port).await;
    }

    init_tracing();
    tracing::info!("Starting playtube-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    match (
        config.auth.jwt_private_key_pem.as_deref(),
        config.auth.jwt_public_key_pem.as_deref(),
    ) {
        (Some(private_pem), Some(public_pem)) => {
            jwt::initialize_keys(private_pem, public_pem)
                .map_err(|e| io_error("Failed to initialize JWT keys", e))?;
        }
        _ if config.app.is_production() => {
            return Err(io_error(
                "JWT keys missing",
                "JWT_PRIVATE_KEY_PEM and JWT_PUBLIC_KEY_PEM must be set in production",
            ));
        }
        _ => {
            tracing::warn!(
                "JWT keys not configured; sign-in will fail and authenticated routes will reject requests"
            );
        }
    }

    let db_cfg = DbConfig::from_env("playtube-service", &config.database.url);
    db_cfg.log_config();
    let db_pool = match create_pool(db_cfg).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database pool creation failed: {:#}", e);
            eprintln!("ERROR: Failed to create database pool: {}", e);
            std::process::exit(1);
        }
    };

    if config.database.run_migrations {
        sqlx::migrate!("../migrations")
            .run(&db_pool)
            .await
            .map_err(|e| io_error("Failed to run migrations", e))?;
        tracing::info!("Database migrations applied");
    }

    let email = EmailService::new(&config.email).map_err(|e| io_error("Email setup failed", e))?;
    let media = CloudinaryStorage::new(config.media.clone())
        .map_err(|e| io_error("Media client setup failed", e))?;
    let ai = ai::from_config(&config.ai).map_err(|e| io_error("AI client setup failed", e))?;

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    let workers = config.app.workers.max(1);
    let allowed_origins = config.cors.allowed_origins.clone();

    let state = web::Data::new(AppState::new(db_pool, config, email, Arc::new(media), ai));

    let otp_limiter = state.otp_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(OTP_LIMITER_PRUNE_INTERVAL);
        loop {
            interval.tick().await;
            let tracked = otp_limiter.prune();
            tracing::debug!(tracked, "Pruned OTP limiter");
        }
    });

    tracing::info!("Starting HTTP server at {}", bind_address);
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(build_cors(&allowed_origins))
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(handlers::configure_routes)
    })
    .workers(workers)
    .bind(&bind_address)?
    .shutdown_timeout(30)
    .run();

    let handle = server.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received, stopping HTTP server");
            handle.stop(true).await;
        }
    });

    server.await
}
