//! Repository and end-to-end tests against a throwaway PostgreSQL.
//!
//! Run with: cargo test -p playtube-service --test repository_tests -- --ignored

mod common;

use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use playtube_service::db::{
    channel_repo, comment_repo, history_repo, media_repo, playlist_repo, post_repo, reaction_repo,
    user_repo,
};
use playtube_service::handlers::configure_routes;
use playtube_service::models::{ContentKind, Reaction};
use playtube_service::services::{recommendation, search};
use serde_json::Value;
use serial_test::serial;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

async fn seed_channel(pool: &PgPool, name: &str, category: &str) -> (Uuid, Uuid) {
    let owner = user_repo::create_user(pool, name, &format!("{}@example.com", name.to_lowercase()), None, None)
        .await
        .expect("create user");
    let channel = channel_repo::create_channel(
        pool,
        owner.id,
        channel_repo::NewChannel {
            name,
            description: "test channel",
            category,
            avatar_url: None,
            banner_url: None,
        },
    )
    .await
    .expect("create channel");
    (owner.id, channel.id)
}

async fn seed_media(pool: &PgPool, kind: ContentKind, channel_id: Uuid, title: &str, tags: &[&str]) -> Uuid {
    media_repo::create_media(
        pool,
        kind,
        media_repo::NewMedia {
            channel_id,
            title: title.to_string(),
            description: format!("all about {}", title),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            media_url: format!("https://media.test/{}", title),
            thumbnail_url: None,
            duration_secs: Some(30.0),
        },
    )
    .await
    .expect("create media")
    .id
}

#[tokio::test]
#[serial]
#[ignore = "Requires Docker"]
async fn subscription_toggles_and_counts() {
    let (_pg, url) = common::start_postgres().await;
    let pool = common::migrated_pool(&url).await;

    let (_, channel_id) = seed_channel(&pool, "Gadgets", "Science & Tech").await;
    let fan = user_repo::create_user(&pool, "fan", "fan@example.com", None, None)
        .await
        .unwrap();

    let state = channel_repo::toggle_subscription(&pool, channel_id, fan.id).await.unwrap();
    assert!(state.subscribed);
    assert_eq!(state.subscriber_count, 1);
    assert!(channel_repo::is_subscribed(&pool, channel_id, fan.id).await.unwrap());

    let state = channel_repo::toggle_subscription(&pool, channel_id, fan.id).await.unwrap();
    assert!(!state.subscribed);
    assert_eq!(state.subscriber_count, 0);
}

#[tokio::test]
#[serial]
#[ignore = "Requires Docker"]
async fn like_and_dislike_are_exclusive() {
    let (_pg, url) = common::start_postgres().await;
    let pool = common::migrated_pool(&url).await;

    let (viewer, channel_id) = seed_channel(&pool, "Kitchen", "Cooking").await;
    let video = seed_media(&pool, ContentKind::Video, channel_id, "pasta", &["italian"]).await;

    let liked = reaction_repo::toggle_reaction(&pool, ContentKind::Video, video, viewer, Reaction::Like)
        .await
        .unwrap();
    assert!(liked.active);
    assert_eq!((liked.likes, liked.dislikes), (1, 0));

    let disliked =
        reaction_repo::toggle_reaction(&pool, ContentKind::Video, video, viewer, Reaction::Dislike)
            .await
            .unwrap();
    assert!(disliked.active);
    assert_eq!((disliked.likes, disliked.dislikes), (0, 1));

    let cleared =
        reaction_repo::toggle_reaction(&pool, ContentKind::Video, video, viewer, Reaction::Dislike)
            .await
            .unwrap();
    assert!(!cleared.active);
    assert_eq!((cleared.likes, cleared.dislikes), (0, 0));

    let saved = reaction_repo::toggle_reaction(&pool, ContentKind::Video, video, viewer, Reaction::Save)
        .await
        .unwrap();
    assert_eq!(saved.saves, 1);
    let ids = reaction_repo::content_ids_for_user(&pool, viewer, ContentKind::Video, Reaction::Save)
        .await
        .unwrap();
    assert_eq!(ids, vec![video]);
}

#[tokio::test]
#[serial]
#[ignore = "Requires Docker"]
async fn playlist_keeps_submitted_order() {
    let (_pg, url) = common::start_postgres().await;
    let pool = common::migrated_pool(&url).await;

    let (_, channel_id) = seed_channel(&pool, "Lectures", "Education").await;
    let first = seed_media(&pool, ContentKind::Video, channel_id, "one", &[]).await;
    let second = seed_media(&pool, ContentKind::Video, channel_id, "two", &[]).await;
    let third = seed_media(&pool, ContentKind::Video, channel_id, "three", &[]).await;

    let order = [third, first, second];
    assert_eq!(
        media_repo::count_owned(&pool, ContentKind::Video, channel_id, &order).await.unwrap(),
        3
    );

    let playlist = playlist_repo::create_playlist(&pool, channel_id, "course", "", &order)
        .await
        .unwrap();
    assert_eq!(playlist.video_count, 3);

    let videos = media_repo::list_for_playlist(&pool, playlist.id).await.unwrap();
    let ids: Vec<Uuid> = videos.iter().map(|v| v.id).collect();
    assert_eq!(ids, order);
}

#[tokio::test]
#[serial]
#[ignore = "Requires Docker"]
async fn comments_carry_their_replies() {
    let (_pg, url) = common::start_postgres().await;
    let pool = common::migrated_pool(&url).await;

    let (author, channel_id) = seed_channel(&pool, "Thoughts", "Vlogs").await;
    let post = post_repo::create_post(&pool, channel_id, "hello world", None).await.unwrap();

    let comment = comment_repo::create_comment(&pool, ContentKind::Post, post.id, author, "first")
        .await
        .unwrap();
    comment_repo::create_reply(&pool, comment.id, author, "reply").await.unwrap();

    let comments = comment_repo::list_comments(&pool, ContentKind::Post, post.id, 50, 0).await.unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0].replies.len(), 1);
    assert_eq!(comments[0].replies[0].message, "reply");

    comment_repo::create_comment(&pool, ContentKind::Post, post.id, author, "second")
        .await
        .unwrap();
    let page = comment_repo::list_comments(&pool, ContentKind::Post, post.id, 1, 1).await.unwrap();
    assert_eq!(page.len(), 1);

    let missing = comment_repo::find_comment(&pool, ContentKind::Video, post.id, comment.id)
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
#[serial]
#[ignore = "Requires Docker"]
async fn rewatching_moves_entry_to_front() {
    let (_pg, url) = common::start_postgres().await;
    let pool = common::migrated_pool(&url).await;

    let (viewer, channel_id) = seed_channel(&pool, "Clips", "Comedy").await;
    let a = seed_media(&pool, ContentKind::Short, channel_id, "a-clip", &[]).await;
    let b = seed_media(&pool, ContentKind::Short, channel_id, "b-clip", &[]).await;

    history_repo::record_watch(&pool, viewer, ContentKind::Short, a).await.unwrap();
    history_repo::record_watch(&pool, viewer, ContentKind::Short, b).await.unwrap();
    history_repo::record_watch(&pool, viewer, ContentKind::Short, a).await.unwrap();

    let history = history_repo::list_history(&pool, viewer).await.unwrap();
    let ids: Vec<Uuid> = history.iter().map(|h| h.content_id).collect();
    assert_eq!(ids, vec![a, b]);

    assert_eq!(
        media_repo::increment_views(&pool, ContentKind::Short, a).await.unwrap(),
        Some(1)
    );
    assert_eq!(
        media_repo::increment_views(&pool, ContentKind::Short, Uuid::new_v4()).await.unwrap(),
        None
    );
}

#[tokio::test]
#[serial]
#[ignore = "Requires Docker"]
async fn recommendations_follow_watched_topics() {
    let (_pg, url) = common::start_postgres().await;
    let pool = common::migrated_pool(&url).await;

    let (viewer, channel_id) = seed_channel(&pool, "Mixed", "Entertainment").await;
    let watched = seed_media(&pool, ContentKind::Video, channel_id, "guitar lesson", &["guitar"]).await;
    let related = seed_media(&pool, ContentKind::Video, channel_id, "guitar solos", &["guitar"]).await;
    let unrelated = seed_media(&pool, ContentKind::Video, channel_id, "baking bread", &["kitchen"]).await;

    history_repo::record_watch(&pool, viewer, ContentKind::Video, watched).await.unwrap();

    let recs = recommendation::recommend_for(&pool, viewer).await.unwrap();
    assert!(recs.keywords.contains(&"guitar".to_string()));

    let recommended: Vec<Uuid> = recs.recommended_videos.iter().map(|v| v.id).collect();
    assert_eq!(recommended, vec![related]);

    let remaining: Vec<Uuid> = recs.remaining_videos.iter().map(|v| v.id).collect();
    assert_eq!(remaining, vec![unrelated]);
}

#[tokio::test]
#[serial]
#[ignore = "Requires Docker"]
async fn liked_and_saved_items_drive_recommendations() {
    let (_pg, url) = common::start_postgres().await;
    let pool = common::migrated_pool(&url).await;

    let (viewer, channel_id) = seed_channel(&pool, "Studio", "Music").await;
    let liked = seed_media(&pool, ContentKind::Video, channel_id, "jazz piano", &["jazz"]).await;
    let related = seed_media(&pool, ContentKind::Video, channel_id, "jazz drums", &["jazz"]).await;
    let unrelated = seed_media(&pool, ContentKind::Video, channel_id, "oil painting", &["art"]).await;
    let saved = seed_media(&pool, ContentKind::Short, channel_id, "violin tricks", &["violin"]).await;
    let related_short = seed_media(&pool, ContentKind::Short, channel_id, "violin tuning", &["violin"]).await;

    reaction_repo::toggle_reaction(&pool, ContentKind::Video, liked, viewer, Reaction::Like)
        .await
        .unwrap();
    reaction_repo::toggle_reaction(&pool, ContentKind::Short, saved, viewer, Reaction::Save)
        .await
        .unwrap();

    let recs = recommendation::recommend_for(&pool, viewer).await.unwrap();
    assert!(recs.keywords.contains(&"jazz".to_string()));
    assert!(recs.keywords.contains(&"violin".to_string()));

    let recommended: Vec<Uuid> = recs.recommended_videos.iter().map(|v| v.id).collect();
    assert_eq!(recommended, vec![related]);
    let recommended_shorts: Vec<Uuid> = recs.recommended_shorts.iter().map(|v| v.id).collect();
    assert_eq!(recommended_shorts, vec![related_short]);

    // Liked but never watched still shows among the rest
    let mut remaining: Vec<Uuid> = recs.remaining_videos.iter().map(|v| v.id).collect();
    remaining.sort();
    let mut expected = vec![liked, unrelated];
    expected.sort();
    assert_eq!(remaining, expected);
}

#[tokio::test]
#[serial]
#[ignore = "Requires Docker"]
async fn recommendations_without_signals_list_everything_unwatched() {
    let (_pg, url) = common::start_postgres().await;
    let pool = common::migrated_pool(&url).await;

    let (viewer, channel_id) = seed_channel(&pool, "Fresh", "Travel").await;
    let a = seed_media(&pool, ContentKind::Video, channel_id, "lisbon trams", &["portugal"]).await;
    let b = seed_media(&pool, ContentKind::Video, channel_id, "alpine lakes", &["hiking"]).await;
    let clip = seed_media(&pool, ContentKind::Short, channel_id, "sunset timelapse", &[]).await;

    let recs = recommendation::recommend_for(&pool, viewer).await.unwrap();
    assert!(recs.keywords.is_empty());
    assert!(recs.recommended_videos.is_empty());
    assert!(recs.recommended_shorts.is_empty());

    let mut videos: Vec<Uuid> = recs.remaining_videos.iter().map(|v| v.id).collect();
    videos.sort();
    let mut expected = vec![a, b];
    expected.sort();
    assert_eq!(videos, expected);
    let shorts: Vec<Uuid> = recs.remaining_shorts.iter().map(|v| v.id).collect();
    assert_eq!(shorts, vec![clip]);
}

#[tokio::test]
#[serial]
#[ignore = "Requires Docker"]
async fn keyword_search_spans_content_types() {
    let (_pg, url) = common::start_postgres().await;
    let pool = common::migrated_pool(&url).await;

    let (_, channel_id) = seed_channel(&pool, "Rustaceans", "Science & Tech").await;
    seed_media(&pool, ContentKind::Video, channel_id, "rust ownership", &["rust"]).await;
    seed_media(&pool, ContentKind::Short, channel_id, "borrow checker in 60s", &["rust"]).await;
    seed_media(&pool, ContentKind::Video, channel_id, "gardening", &["plants"]).await;

    let results = search::search_all(&pool, "rust").await.unwrap();
    assert_eq!(results.channels.len(), 1);
    assert_eq!(results.videos.len(), 1);
    assert_eq!(results.shorts.len(), 1);

    let tech = search::category_content(&pool, "Science & Tech").await.unwrap();
    assert_eq!(tech.channels.len(), 1);
    assert_eq!(tech.videos.len(), 2);
}

#[actix_web::test]
#[serial]
#[ignore = "Requires Docker"]
async fn signup_then_current_user() {
    let (_pg, url) = common::start_postgres().await;
    let pool = common::migrated_pool(&url).await;
    let state = common::state_with(
        pool,
        common::test_config(&url),
        Arc::new(common::FakeStorage::default()),
    );

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(state))
            .configure(configure_routes),
    )
    .await;

    let boundary = "playtube-boundary";
    let body = common::multipart_body(
        boundary,
        &[("user_name", "alice"), ("email", "Alice@Example.com"), ("password", "correct horse")],
        &[("photo", "me.png", "image/png", b"\x89PNG fake")],
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
    assert_eq!(resp.status(), StatusCode::CREATED);

    let session = resp
        .response()
        .cookies()
        .find(|c| c.name() == "token")
        .expect("session cookie")
        .into_owned();
    let created: Value = test::read_body_json(resp).await;
    assert_eq!(created["email"], "alice@example.com");
    assert!(created.get("password_hash").is_none());
    assert!(created["photo_url"].as_str().unwrap().starts_with("https://media.test/image/"));

    let req = test::TestRequest::get()
        .uri("/api/user/current")
        .cookie(session)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let current: Value = test::read_body_json(resp).await;
    assert_eq!(current["user_name"], "alice");
    assert!(current["channel_id"].is_null());

    let req = test::TestRequest::post()
        .uri("/api/auth/signin")
        .set_json(serde_json::json!({ "email": "alice@example.com", "password": "wrong password" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
