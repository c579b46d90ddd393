/// HTTP handlers for PlayTube
///
/// - `auth`: sign-up/in/out, Google sign-in, OTP password reset
/// - `users`: current user, history, liked/saved/subscribed, recommendations
/// - `channels`: channel management and subscriptions
/// - `content`: videos, shorts, playlists, posts, reactions, comments
/// - `search`: AI-assisted search and category filter
/// - `health`: liveness and database health
pub mod auth;
pub mod channels;
pub mod content;
pub mod form;
pub mod health;
pub mod search;
pub mod users;

use crate::error::{json_config, path_config, query_config};
use crate::metrics;
use crate::middleware::JwtAuthMiddleware;
use actix_web::web;

/// Route table shared by `main` and the HTTP tests
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(path_config())
        .app_data(query_config())
        .route("/metrics", web::get().to(metrics::serve_metrics))
        .route("/api/health", web::get().to(health::health_summary))
        .route("/api/health/live", web::get().to(health::liveness))
        .service(
            web::scope("/api/auth")
                .route("/signup", web::post().to(auth::signup))
                .route("/signin", web::post().to(auth::signin))
                .route("/signout", web::get().to(auth::signout))
                .route("/signout", web::post().to(auth::signout))
                .route("/google-auth", web::post().to(auth::google_auth))
                .route("/send-otp", web::post().to(auth::send_otp))
                .route("/verify-otp", web::post().to(auth::verify_otp))
                .route("/reset-password", web::post().to(auth::reset_password)),
        )
        .service(
            web::scope("/api/user")
                .wrap(JwtAuthMiddleware::required())
                .route("/current", web::get().to(users::current_user))
                .route("/history", web::get().to(users::get_history))
                .route("/history", web::post().to(users::add_history))
                .route("/recommendations", web::get().to(users::get_recommended_content))
                .route("/liked", web::get().to(users::liked_content))
                .route("/saved", web::get().to(users::saved_content))
                .route("/subscribed", web::get().to(users::subscribed_content)),
        )
        .service(
            web::scope("/api/channel")
                .wrap(JwtAuthMiddleware::optional())
                .route("/create", web::post().to(channels::create_channel))
                .route("/update", web::post().to(channels::update_channel))
                .route("/mine", web::get().to(channels::get_my_channel))
                .route("/all", web::get().to(channels::list_channels))
                .route("/{id}", web::get().to(channels::get_channel))
                .route("/{id}/subscribe", web::post().to(channels::toggle_subscribe)),
        )
        .service(
            web::scope("/api/content")
                .wrap(JwtAuthMiddleware::optional())
                .route("/videos", web::get().to(content::list_videos))
                .route("/videos", web::post().to(content::create_video))
                .route("/shorts", web::get().to(content::list_shorts))
                .route("/shorts", web::post().to(content::create_short))
                .route("/posts", web::get().to(content::list_posts))
                .route("/posts", web::post().to(content::create_post))
                .route("/playlists", web::get().to(content::list_playlists))
                .route("/playlists", web::post().to(content::create_playlist))
                .route("/{kind}/{id}", web::get().to(content::get_content))
                .route("/{kind}/{id}/view", web::post().to(content::add_view))
                .route("/{kind}/{id}/comments", web::get().to(content::list_comments))
                .route("/{kind}/{id}/comments", web::post().to(content::add_comment))
                .route(
                    "/{kind}/{id}/comments/{comment_id}/replies",
                    web::post().to(content::add_reply),
                )
                .route("/{kind}/{id}/{reaction}", web::post().to(content::toggle_reaction)),
        )
        .service(
            web::scope("/api/search")
                .route("/ai", web::post().to(search::search_with_ai))
                .route("/category", web::post().to(search::filter_by_category)),
        );
}
