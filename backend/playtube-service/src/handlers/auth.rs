/// Account handlers: sign-up/in/out, Google sign-in, OTP password reset
use crate::db::user_repo;
use crate::error::{AppError, Result};
use crate::handlers::form::MultipartForm;
use crate::metrics;
use crate::models::User;
use crate::services::auth;
use crate::services::ResourceKind;
use crate::AppState;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 100, message = "user name is required"))]
    pub user_name: String,
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SigninRequest {
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct GoogleAuthRequest {
    #[validate(length(min = 1, max = 100, message = "user name is required"))]
    pub user_name: String,
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(url(message = "invalid photo URL"))]
    pub photo_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EmailRequest {
    #[validate(email(message = "invalid email address"))]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct VerifyOtpRequest {
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "otp is required"))]
    pub otp: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn signed_in(state: &AppState, status: HttpResponse, user: &User) -> Result<HttpResponse> {
    let cookie = auth::session_cookie(user.id, state.cookie_secure())?;
    let mut response = status;
    response
        .add_cookie(&cookie)
        .map_err(|e| AppError::Internal(format!("failed to set session cookie: {}", e)))?;
    Ok(response)
}

async fn find_user(state: &AppState, email: &str) -> Result<User> {
    user_repo::find_by_email(&state.db, email)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))
}

/// Create an account (multipart: user_name, email, password, photo?)
pub async fn signup(state: web::Data<AppState>, payload: Multipart) -> Result<HttpResponse> {
    let mut form = MultipartForm::collect(payload, state.max_upload_bytes(), &["photo"]).await?;

    let req = SignupRequest {
        user_name: form.text("user_name").unwrap_or_default().to_string(),
        email: normalize_email(form.text("email").unwrap_or_default()),
        password: form.raw("password").unwrap_or_default().to_string(),
    };
    req.validate()?;

    if user_repo::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(AppError::Conflict("email already registered".to_string()));
    }

    let photo_url = match form.take_file("photo") {
        Some(file) => Some(state.media.upload(file, ResourceKind::Image).await?.url),
        None => None,
    };

    let password_hash = auth::hash_password(&req.password)?;
    let user = user_repo::create_user(
        &state.db,
        &req.user_name,
        &req.email,
        Some(password_hash.as_str()),
        photo_url.as_deref(),
    )
    .await?;

    info!(user_id = %user.id, "user signed up");
    metrics::record_auth("signup", true);
    let body = HttpResponse::Created().json(&user);
    signed_in(&state, body, &user)
}

pub async fn signin(
    state: web::Data<AppState>,
    req: web::Json<SigninRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let user = find_user(&state, &normalize_email(&req.email)).await?;

    let Some(password_hash) = user.password_hash.as_deref() else {
        metrics::record_auth("signin", false);
        return Err(AppError::BadRequest(
            "this account uses Google sign-in".to_string(),
        ));
    };

    if !auth::verify_password(&req.password, password_hash)? {
        metrics::record_auth("signin", false);
        return Err(AppError::BadRequest("incorrect password".to_string()));
    }

    metrics::record_auth("signin", true);
    let body = HttpResponse::Ok().json(&user);
    signed_in(&state, body, &user)
}

pub async fn signout(state: web::Data<AppState>) -> Result<HttpResponse> {
    let mut response = HttpResponse::Ok().json(serde_json::json!({ "message": "signed out" }));
    response
        .add_removal_cookie(&auth::clear_session_cookie(state.cookie_secure()))
        .map_err(|e| AppError::Internal(format!("failed to clear session cookie: {}", e)))?;
    Ok(response)
}

/// Sign in with a Google profile verified by the client; creates the
/// account on first use. Password accounts are never taken over.
pub async fn google_auth(
    state: web::Data<AppState>,
    req: web::Json<GoogleAuthRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let email = normalize_email(&req.email);

    let (user, created) = match user_repo::find_by_email(&state.db, &email).await? {
        Some(user) if user.password_hash.is_some() => {
            metrics::record_auth("google", false);
            return Err(AppError::Conflict(
                "this email is registered with a password; sign in with it".to_string(),
            ));
        }
        Some(user) => (user, false),
        None => {
            let user = user_repo::create_user(
                &state.db,
                req.user_name.trim(),
                &email,
                None,
                req.photo_url.as_deref(),
            )
            .await?;
            (user, true)
        }
    };

    info!(user_id = %user.id, created, "google sign-in");
    metrics::record_auth("google", true);
    let body = if created {
        HttpResponse::Created().json(&user)
    } else {
        HttpResponse::Ok().json(&user)
    };
    signed_in(&state, body, &user)
}

/// Mail a 4-digit reset code
pub async fn send_otp(
    state: web::Data<AppState>,
    req: web::Json<EmailRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let email = normalize_email(&req.email);

    if !state.otp_limiter.allow(&email) {
        metrics::record_auth("send_otp", false);
        return Err(AppError::RateLimited(
            "too many OTP requests, try again in a minute".to_string(),
        ));
    }

    let user = find_user(&state, &email).await?;
    let otp = auth::issue_otp(Utc::now());
    user_repo::store_otp(&state.db, user.id, &otp.digest, otp.expires_at).await?;
    state
        .email
        .send_otp_email(&user.email, &user.user_name, &otp.code)
        .await?;

    metrics::record_auth("send_otp", true);
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "OTP sent" })))
}

pub async fn verify_otp(
    state: web::Data<AppState>,
    req: web::Json<VerifyOtpRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let user = find_user(&state, &normalize_email(&req.email)).await?;

    if let Err(e) = auth::check_otp(&user, &req.otp, Utc::now()) {
        metrics::record_auth("verify_otp", false);
        if user.reset_otp_hash.is_some() {
            let attempts =
                user_repo::record_failed_otp(&state.db, user.id, auth::MAX_OTP_ATTEMPTS).await?;
            if attempts >= auth::MAX_OTP_ATTEMPTS {
                warn!(user_id = %user.id, attempts, "OTP discarded after repeated wrong guesses");
            }
        }
        return Err(e);
    }
    user_repo::mark_otp_verified(&state.db, user.id).await?;

    metrics::record_auth("verify_otp", true);
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "OTP verified" })))
}

pub async fn reset_password(
    state: web::Data<AppState>,
    req: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let user = find_user(&state, &normalize_email(&req.email)).await?;

    auth::check_reset_allowed(&user, Utc::now())?;

    let password_hash = auth::hash_password(&req.password)?;
    user_repo::update_password(&state.db, user.id, &password_hash).await?;

    info!(user_id = %user.id, "password reset");
    metrics::record_auth("reset_password", true);
    Ok(HttpResponse::Ok().json(serde_json::json!({ "message": "password updated" })))
}
