//! HTTP-level tests for requests that are answered before PostgreSQL is
//! touched: validation, authentication, rate limiting and routing.

mod common;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use playtube_service::handlers::configure_routes;
use serde_json::Value;
use uuid::Uuid;

/// Status of a request, including errors raised by scope middleware
macro_rules! status_of {
    ($app:expr, $req:expr) => {
        match test::try_call_service(&$app, $req).await {
            Ok(resp) => resp.status(),
            Err(e) => e.as_response_error().status_code(),
        }
    };
}

macro_rules! app {
    () => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(common::offline_state()))
                .configure(configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn liveness_does_not_need_database() {
    let app = app!();
    let resp = test::call_service(&app, test::TestRequest::get().uri("/api/health/live").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "ok");
}

#[actix_web::test]
async fn metrics_are_exposed() {
    let app = app!();
    let resp = test::call_service(&app, test::TestRequest::get().uri("/metrics").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn current_user_requires_session() {
    let app = app!();
    let req = test::TestRequest::get().uri("/api/user/current").to_request();
    assert_eq!(status_of!(app, req), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn forged_session_is_rejected() {
    let app = app!();
    let req = test::TestRequest::get()
        .uri("/api/user/history")
        .insert_header(("Authorization", "Bearer not.a.token"))
        .to_request();
    assert_eq!(status_of!(app, req), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn signup_with_invalid_email_returns_400() {
    let app = app!();
    let boundary = "playtube-boundary";
    let body = common::multipart_body(
        boundary,
        &[("user_name", "alice"), ("email", "not-an-email"), ("password", "hunter2hunter2")],
        &[],
    );
    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .insert_header((
            "Content-Type",
            format!("multipart/form-data; boundary={}", boundary),
        ))
        .set_payload(body)
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn signup_with_short_password_returns_400() {
    let app = app!();
    let boundary = "playtube-boundary";
    let body = common::multipart_body(
        boundary,
        &[("user_name", "alice"), ("email", "alice@example.com"), ("password", "short")],
        &[],
    );
    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .insert_header((
            "Content-Type",
            format!("multipart/form-data; boundary={}", boundary),
        ))
        .set_payload(body)
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn signin_rejects_malformed_email() {
    let app = app!();
    let req = test::TestRequest::post()
        .uri("/api/auth/signin")
        .set_json(serde_json::json!({ "email": "bad", "password": "whatever" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn signout_clears_session_cookie() {
    let app = app!();
    let resp = test::call_service(&app, test::TestRequest::post().uri("/api/auth/signout").to_request()).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let cookie = resp
        .response()
        .cookies()
        .find(|c| c.name() == "token")
        .expect("removal cookie");
    assert_eq!(cookie.value(), "");
    assert_eq!(cookie.max_age(), Some(actix_web::cookie::time::Duration::ZERO));
}

#[actix_web::test]
async fn send_otp_is_rate_limited_per_email() {
    let app = app!();
    let send = |email: &'static str| {
        test::TestRequest::post()
            .uri("/api/auth/send-otp")
            .set_json(serde_json::json!({ "email": email }))
            .to_request()
    };

    for _ in 0..3 {
        let resp = test::call_service(&app, send("limit@example.com")).await;
        assert_ne!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    }
    let resp = test::call_service(&app, send("LIMIT@example.com")).await;
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);

    let resp = test::call_service(&app, send("other@example.com")).await;
    assert_ne!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[actix_web::test]
async fn empty_search_is_rejected() {
    let app = app!();
    let req = test::TestRequest::post()
        .uri("/api/search/ai")
        .set_json(serde_json::json!({ "input": "   " }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn unmatched_category_returns_empty_result() {
    let app = app!();
    let req = test::TestRequest::post()
        .uri("/api/search/category")
        .set_json(serde_json::json!({ "input": "qwerty" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: Value = test::read_body_json(resp).await;
    assert!(body["category"].is_null());
    assert_eq!(body["videos"], serde_json::json!([]));
    assert_eq!(body["shorts"], serde_json::json!([]));
    assert_eq!(body["channels"], serde_json::json!([]));
}

#[actix_web::test]
async fn dislike_on_post_is_rejected() {
    let app = app!();
    let req = test::TestRequest::post()
        .uri(&format!("/api/content/post/{}/dislike", Uuid::new_v4()))
        .cookie(common::session_cookie_for(Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn reaction_requires_session() {
    let app = app!();
    let req = test::TestRequest::post()
        .uri(&format!("/api/content/video/{}/like", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn history_only_accepts_watchable_content() {
    let app = app!();
    let req = test::TestRequest::post()
        .uri("/api/user/history")
        .cookie(common::session_cookie_for(Uuid::new_v4()))
        .set_json(serde_json::json!({ "content_kind": "post", "content_id": Uuid::new_v4() }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn unknown_content_kind_is_not_routed() {
    let app = app!();
    let req = test::TestRequest::get()
        .uri(&format!("/api/content/widget/{}", Uuid::new_v4()))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 404);
    assert!(body["error"].as_str().unwrap().contains("widget"));
}

#[actix_web::test]
async fn malformed_uuid_answers_with_error_body() {
    let app = app!();
    let req = test::TestRequest::get()
        .uri("/api/content/video/not-a-uuid")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 404);
}

#[actix_web::test]
async fn malformed_json_answers_with_error_body() {
    let app = app!();
    let req = test::TestRequest::post()
        .uri("/api/auth/signin")
        .insert_header(("Content-Type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 400);
    assert!(body["error"].as_str().unwrap().contains("invalid JSON body"));
}

#[actix_web::test]
async fn malformed_paging_answers_with_error_body() {
    let app = app!();
    let req = test::TestRequest::get()
        .uri("/api/channel/all?limit=lots")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], 400);
    assert!(body["error"].as_str().unwrap().contains("invalid query string"));
}

/// Error body and status of a multipart signup
async fn signup_with(fields: &[(&str, &str)], files: &[(&str, &str, &str, &[u8])]) -> (StatusCode, Value) {
    let app = app!();
    let boundary = "playtube-boundary";
    let body = common::multipart_body(boundary, fields, files);
    let req = test::TestRequest::post()
        .uri("/api/auth/signup")
        .insert_header((
            "Content-Type",
            format!("multipart/form-data; boundary={}", boundary),
        ))
        .set_payload(body)
        .to_request();
    let resp = test::call_service(&app, req).await;
    let status = resp.status();
    (status, test::read_body_json(resp).await)
}

#[actix_web::test]
async fn signup_rejects_unexpected_file_field() {
    let (status, body) = signup_with(
        &[("user_name", "alice"), ("email", "alice@example.com"), ("password", "correct horse")],
        &[("resume", "cv.pdf", "application/pdf", b"%PDF")],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("unexpected file field 'resume'"));
}

#[actix_web::test]
async fn signup_rejects_repeated_file_field() {
    let (status, body) = signup_with(
        &[("user_name", "alice"), ("email", "alice@example.com"), ("password", "correct horse")],
        &[
            ("photo", "a.png", "image/png", b"\x89PNG one"),
            ("photo", "b.png", "image/png", b"\x89PNG two"),
        ],
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("sent more than once"));
}

#[actix_web::test]
async fn signup_rejects_too_many_parts() {
    let names: Vec<String> = (0..20).map(|i| format!("extra{}", i)).collect();
    let fields: Vec<(&str, &str)> = names.iter().map(|n| (n.as_str(), "x")).collect();
    let (status, body) = signup_with(&fields, &[]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("too many form parts"));
}

#[actix_web::test]
async fn oversized_photo_is_rejected() {
    let photo = vec![0u8; 1024 * 1024 + 1];
    let (status, _) = signup_with(
        &[("user_name", "alice"), ("email", "alice@example.com"), ("password", "correct horse")],
        &[("photo", "big.png", "image/png", &photo)],
    )
    .await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
}
