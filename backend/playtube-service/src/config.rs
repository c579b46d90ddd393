/// Configuration management for PlayTube
///
/// All settings come from environment variables (a `.env` file is loaded by
/// `main` through dotenvy before this runs).
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub cors: CorsConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub email: EmailConfig,
    pub media: MediaConfig,
    pub ai: AiConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub port: u16,
    /// Actix worker threads
    pub workers: usize,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub run_migrations: bool,
}

/// Session cookie and signing keys
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(skip_serializing)]
    pub jwt_private_key_pem: Option<String>,
    pub jwt_public_key_pem: Option<String>,
    /// Mark the `token` cookie `Secure` (HTTPS only)
    pub cookie_secure: bool,
    /// Max OTP emails per address per minute
    pub otp_per_minute: u32,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_private_key_pem", &self.jwt_private_key_pem.as_ref().map(|_| "[REDACTED]"))
            .field("jwt_public_key_pem", &self.jwt_public_key_pem.is_some())
            .field("cookie_secure", &self.cookie_secure)
            .field("otp_per_minute", &self.otp_per_minute)
            .finish()
    }
}

/// SMTP settings; an empty host switches the mailer to no-op mode
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    #[serde(skip_serializing)]
    pub smtp_password: Option<String>,
    pub smtp_from: String,
    pub use_starttls: bool,
}

/// Hosted media service (Cloudinary-compatible upload API)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub cloud_name: String,
    pub api_key: String,
    #[serde(skip_serializing)]
    pub api_secret: String,
    pub upload_base_url: String,
    pub max_upload_bytes: usize,
    pub request_timeout_secs: u64,
}

/// Generative AI settings; no key means local fallbacks only
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let app_env = get("APP_ENV").unwrap_or_else(|| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        let allowed_origins = match get("CORS_ALLOWED_ORIGINS") {
            Some(value) => value,
            None if production => {
                return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
            }
            None => "http://localhost:5173".to_string(),
        };
        if production && allowed_origins == "*" {
            return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
        }

        let email = EmailConfig {
            smtp_host: get("SMTP_HOST").unwrap_or_default(),
            smtp_port: parse_or("SMTP_PORT", get("SMTP_PORT"), 587)?,
            smtp_username: get("SMTP_USERNAME"),
            smtp_password: get("SMTP_PASSWORD"),
            smtp_from: get("SMTP_FROM").unwrap_or_else(|| "PlayTube <no-reply@playtube.dev>".to_string()),
            use_starttls: parse_or("SMTP_STARTTLS", get("SMTP_STARTTLS"), true)?,
        };
        if !email.smtp_host.is_empty()
            && production
            && (email.smtp_username.is_none() || email.smtp_password.is_none())
        {
            return Err("SMTP_USERNAME and SMTP_PASSWORD are required when SMTP_HOST is set in production".to_string());
        }

        let media = MediaConfig {
            cloud_name: get("CLOUDINARY_CLOUD_NAME").unwrap_or_default(),
            api_key: get("CLOUDINARY_API_KEY").unwrap_or_default(),
            api_secret: get("CLOUDINARY_API_SECRET").unwrap_or_default(),
            upload_base_url: get("MEDIA_UPLOAD_BASE_URL")
                .unwrap_or_else(|| "https://api.cloudinary.com/v1_1".to_string()),
            max_upload_bytes: parse_or(
                "MEDIA_MAX_UPLOAD_BYTES",
                get("MEDIA_MAX_UPLOAD_BYTES"),
                200 * 1024 * 1024,
            )?,
            request_timeout_secs: parse_or(
                "MEDIA_REQUEST_TIMEOUT_SECS",
                get("MEDIA_REQUEST_TIMEOUT_SECS"),
                120,
            )?,
        };
        if production && (media.cloud_name.is_empty() || media.api_secret.is_empty()) {
            return Err("CLOUDINARY_CLOUD_NAME and CLOUDINARY_API_SECRET must be set in production".to_string());
        }

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: get("PLAYTUBE_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or("PLAYTUBE_PORT", get("PLAYTUBE_PORT"), 8000)?,
                workers: parse_or("PLAYTUBE_WORKERS", get("PLAYTUBE_WORKERS"), 4)?,
            },
            cors: CorsConfig { allowed_origins },
            database: DatabaseConfig {
                url: get("DATABASE_URL")
                    .unwrap_or_else(|| "postgresql://localhost/playtube".to_string()),
                run_migrations: parse_or("RUN_MIGRATIONS", get("RUN_MIGRATIONS"), true)?,
            },
            auth: AuthConfig {
                jwt_private_key_pem: get("JWT_PRIVATE_KEY_PEM"),
                jwt_public_key_pem: get("JWT_PUBLIC_KEY_PEM"),
                cookie_secure: parse_or("COOKIE_SECURE", get("COOKIE_SECURE"), production)?,
                otp_per_minute: parse_or("OTP_PER_MINUTE", get("OTP_PER_MINUTE"), 3)?,
            },
            email,
            media,
            ai: AiConfig {
                api_key: get("GEMINI_API_KEY"),
                model: get("GEMINI_MODEL").unwrap_or_else(|| "gemini-1.5-flash".to_string()),
                base_url: get("GEMINI_BASE_URL").unwrap_or_else(|| {
                    "https://generativelanguage.googleapis.com/v1beta".to_string()
                }),
                request_timeout_secs: parse_or(
                    "GEMINI_TIMEOUT_SECS",
                    get("GEMINI_TIMEOUT_SECS"),
                    15,
                )?,
            },
        })
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T, String>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(val) => val
            .parse()
            .map_err(|e| format!("Failed to parse {}='{}': {}", key, val, e)),
        None => Ok(default),
    }
}
