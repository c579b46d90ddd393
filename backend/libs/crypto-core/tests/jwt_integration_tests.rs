/// Integration tests for session tokens through the public crate API
use crypto_core::hash::{generate_otp, sha256_hex};
use crypto_core::jwt::{issue_session_token, test_keys, validate_session_token, SESSION_TTL_DAYS};
use uuid::Uuid;

#[test]
fn session_token_survives_cookie_transport() {
    test_keys::install();

    let user_id = Uuid::new_v4();
    let token = issue_session_token(user_id).expect("issue");

    // Cookie values must not need escaping
    assert!(token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'));

    let claims = validate_session_token(&token).expect("validate");
    assert_eq!(claims.sub, user_id.to_string());
    assert!(claims.exp > chrono::Utc::now().timestamp() + (SESSION_TTL_DAYS - 1) * 86_400);
}

#[test]
fn distinct_users_get_distinct_tokens() {
    test_keys::install();

    let a = issue_session_token(Uuid::new_v4()).unwrap();
    let b = issue_session_token(Uuid::new_v4()).unwrap();
    assert_ne!(a, b);
}

#[test]
fn otp_digest_is_stable() {
    let otp = generate_otp(4);
    assert_eq!(sha256_hex(&otp), sha256_hex(&otp));
    assert_eq!(sha256_hex(&otp).len(), 64);
}
