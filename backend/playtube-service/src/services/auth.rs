/// Passwords, session cookies and one-time passwords
use crate::error::{AppError, Result};
use crate::models::User;
use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{DateTime, Duration, Utc};
use crypto_core::{hash, jwt};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "token";
pub const MIN_PASSWORD_LEN: usize = 8;
pub const OTP_DIGITS: u32 = 4;
pub const OTP_TTL_MINUTES: i64 = 5;
/// Wrong guesses before a pending OTP is thrown away
pub const MAX_OTP_ATTEMPTS: i32 = 5;
/// How long a verified OTP keeps the password reset open
pub const RESET_WINDOW_MINUTES: i64 = 10;

/// Hash a password using Argon2id
pub fn hash_password(password: &str) -> Result<String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::ValidationError(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its PHC hash
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash format: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::Internal(format!("Password verification failed: {}", e))),
    }
}

/// Sign a session token and wrap it in the HTTP-only `token` cookie
pub fn session_cookie(user_id: Uuid, secure: bool) -> Result<Cookie<'static>> {
    let token = jwt::issue_session_token(user_id)?;
    Ok(Cookie::build(SESSION_COOKIE, token)
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(if secure { SameSite::None } else { SameSite::Lax })
        .max_age(CookieDuration::days(jwt::SESSION_TTL_DAYS))
        .finish())
}

/// Expired `token` cookie that makes the browser drop the session
pub fn clear_session_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build(SESSION_COOKIE, "")
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(if secure { SameSite::None } else { SameSite::Lax })
        .finish();
    cookie.make_removal();
    cookie
}

/// A freshly generated OTP: the plain code goes to the mailbox, the digest
/// to the database
#[derive(Debug, Clone)]
pub struct IssuedOtp {
    pub code: String,
    pub digest: String,
    pub expires_at: DateTime<Utc>,
}

pub fn issue_otp(now: DateTime<Utc>) -> IssuedOtp {
    let code = hash::generate_otp(OTP_DIGITS);
    IssuedOtp {
        digest: hash::sha256_hex(&code),
        code,
        expires_at: now + Duration::minutes(OTP_TTL_MINUTES),
    }
}

/// Check a submitted OTP against the stored digest and expiry
pub fn check_otp(user: &User, submitted: &str, now: DateTime<Utc>) -> Result<()> {
    let (Some(digest), Some(expires_at)) = (&user.reset_otp_hash, user.otp_expires_at) else {
        return Err(AppError::BadRequest("no OTP requested for this account".to_string()));
    };

    if user.otp_attempts >= MAX_OTP_ATTEMPTS {
        return Err(AppError::RateLimited(
            "too many wrong OTP attempts, request a new code".to_string(),
        ));
    }

    if now > expires_at {
        return Err(AppError::BadRequest("OTP expired".to_string()));
    }

    if !hash::digest_eq(digest, &hash::sha256_hex(submitted.trim())) {
        return Err(AppError::BadRequest("invalid OTP".to_string()));
    }

    Ok(())
}

/// A password reset is open for a short while after the OTP was verified
pub fn check_reset_allowed(user: &User, now: DateTime<Utc>) -> Result<()> {
    match user.otp_verified_at {
        Some(verified_at) if user.is_otp_verified => {
            if now > verified_at + Duration::minutes(RESET_WINDOW_MINUTES) {
                Err(AppError::BadRequest(
                    "OTP verification expired, request a new code".to_string(),
                ))
            } else {
                Ok(())
            }
        }
        _ => Err(AppError::BadRequest(
            "verify the OTP before resetting the password".to_string(),
        )),
    }
}

/// Per-email OTP send limiter
///
/// Wraps governor's keyed limiter behind closures so its generic types stay
/// out of `AppState`. Keys stay in memory until `prune` runs.
#[derive(Clone)]
pub struct OtpLimiter {
    check: Arc<dyn Fn(&str) -> bool + Send + Sync>,
    prune: Arc<dyn Fn() -> usize + Send + Sync>,
}

impl OtpLimiter {
    pub fn per_minute(limit: u32) -> Self {
        Self::new(Quota::per_minute(
            NonZeroU32::new(limit.max(1)).unwrap_or(NonZeroU32::MIN),
        ))
    }

    pub fn new(quota: Quota) -> Self {
        let limiter: Arc<DefaultKeyedRateLimiter<String>> = Arc::new(RateLimiter::keyed(quota));
        let checker = Arc::clone(&limiter);
        Self {
            check: Arc::new(move |key: &str| checker.check_key(&key.to_ascii_lowercase()).is_ok()),
            prune: Arc::new(move || {
                limiter.retain_recent();
                limiter.shrink_to_fit();
                limiter.len()
            }),
        }
    }

    /// `true` when another OTP may be sent to `email` right now
    pub fn allow(&self, email: &str) -> bool {
        (self.check)(email)
    }

    /// Forget emails whose quota has fully refilled; returns how many are
    /// still tracked
    pub fn prune(&self) -> usize {
        (self.prune)()
    }
}
