/// User database operations
use crate::error::Result;
use crate::models::User;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, user_name, email, password_hash, photo_url, reset_otp_hash, \
                            otp_expires_at, otp_attempts, is_otp_verified, otp_verified_at, \
                            created_at";

/// Insert a new user. `password_hash` is `None` for Google-only accounts.
pub async fn create_user(
    pool: &PgPool,
    user_name: &str,
    email: &str,
    password_hash: Option<&str>,
    photo_url: Option<&str>,
) -> Result<User> {
    let sql = format!(
        r#"
        INSERT INTO users (id, user_name, email, password_hash, photo_url)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {USER_COLUMNS}
        "#
    );
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(Uuid::new_v4())
        .bind(user_name)
        .bind(email)
        .bind(password_hash)
        .bind(photo_url)
        .fetch_one(pool)
        .await?;

    Ok(user)
}

/// Find user by email, case-insensitive
pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(email)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>> {
    let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
    let user = sqlx::query_as::<_, User>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    Ok(user)
}

/// Store a fresh OTP digest; any earlier verification is revoked
pub async fn store_otp(
    pool: &PgPool,
    user_id: Uuid,
    otp_hash: &str,
    expires_at: DateTime<Utc>,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE users
        SET reset_otp_hash = $2, otp_expires_at = $3, otp_attempts = 0,
            is_otp_verified = FALSE, otp_verified_at = NULL, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .bind(otp_hash)
    .bind(expires_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Count a wrong OTP guess. The pending code is dropped once the count
/// reaches `max_attempts`. Returns the new count.
pub async fn record_failed_otp(pool: &PgPool, user_id: Uuid, max_attempts: i32) -> Result<i32> {
    let attempts: i32 = sqlx::query_scalar(
        r#"
        UPDATE users
        SET otp_attempts = otp_attempts + 1,
            reset_otp_hash = CASE WHEN otp_attempts + 1 >= $2 THEN NULL ELSE reset_otp_hash END,
            otp_expires_at = CASE WHEN otp_attempts + 1 >= $2 THEN NULL ELSE otp_expires_at END,
            updated_at = NOW()
        WHERE id = $1
        RETURNING otp_attempts
        "#,
    )
    .bind(user_id)
    .bind(max_attempts)
    .fetch_one(pool)
    .await?;

    Ok(attempts)
}

/// Consume the OTP and allow one password reset
pub async fn mark_otp_verified(pool: &PgPool, user_id: Uuid) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE users
        SET reset_otp_hash = NULL, otp_expires_at = NULL, otp_attempts = 0,
            is_otp_verified = TRUE, otp_verified_at = NOW(), updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Replace the password hash and spend the OTP verification
pub async fn update_password(pool: &PgPool, user_id: Uuid, password_hash: &str) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE users
        SET password_hash = $2, is_otp_verified = FALSE, otp_verified_at = NULL, updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(user_id)
    .bind(password_hash)
    .execute(pool)
    .await?;

    Ok(())
}
