/// Content handlers: videos, shorts, playlists, posts, reactions, comments
use crate::db::media_repo::{self, NewMedia};
use crate::db::{channel_repo, comment_repo, playlist_repo, post_repo, reaction_repo};
use crate::error::{AppError, Result};
use crate::handlers::form::MultipartForm;
use crate::metrics;
use crate::middleware::UserId;
use crate::models::{ContentKind, PlaylistDetail, Reaction};
use crate::services::ResourceKind;
use crate::AppState;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

pub const MAX_SHORT_SECS: f64 = 60.0;
const MAX_TITLE_CHARS: usize = 200;
const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl PageQuery {
    pub fn bounds(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePlaylistRequest {
    #[validate(length(min = 1, max = 200, message = "title is required"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub video_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(length(min = 1, max = 5000, message = "message must be 1-5000 characters"))]
    pub message: String,
}

async fn require_channel(state: &AppState, user_id: Uuid) -> Result<Uuid> {
    channel_repo::channel_id_for_owner(&state.db, user_id)
        .await?
        .ok_or_else(|| AppError::Forbidden("create a channel before publishing".to_string()))
}

async fn require_content(state: &AppState, kind: ContentKind, id: Uuid) -> Result<()> {
    if reaction_repo::content_exists(&state.db, kind, id).await? {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("{} not found", kind)))
    }
}

fn check_title(title: &str) -> Result<()> {
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(AppError::ValidationError(format!(
            "title must be at most {} characters",
            MAX_TITLE_CHARS
        )));
    }
    Ok(())
}

/// Reject shorts the media host measured above the cap
pub fn check_short_duration(duration_secs: Option<f64>) -> Result<()> {
    match duration_secs {
        Some(secs) if secs > MAX_SHORT_SECS => Err(AppError::BadRequest(format!(
            "shorts can be at most {} seconds, this one is {:.1}",
            MAX_SHORT_SECS, secs
        ))),
        _ => Ok(()),
    }
}

/// Upload a video (multipart: title, description, tags, video, thumbnail)
pub async fn create_video(
    state: web::Data<AppState>,
    user_id: UserId,
    payload: Multipart,
) -> Result<HttpResponse> {
    let mut form =
        MultipartForm::collect(payload, state.max_upload_bytes(), &["video", "thumbnail"]).await?;
    let title = form.require_text("title")?.to_string();
    check_title(&title)?;
    let video_file = form.require_file("video")?;
    let thumbnail_file = form.require_file("thumbnail")?;

    let channel_id = require_channel(&state, user_id.0).await?;

    let video = state.media.upload(video_file, ResourceKind::Video).await?;
    let thumbnail = state.media.upload(thumbnail_file, ResourceKind::Image).await?;

    let item = media_repo::create_media(
        &state.db,
        ContentKind::Video,
        NewMedia {
            channel_id,
            title,
            description: form.text("description").unwrap_or_default().to_string(),
            tags: form.tags("tags"),
            media_url: video.url,
            thumbnail_url: Some(thumbnail.url),
            duration_secs: video.duration_secs,
        },
    )
    .await?;

    info!(video_id = %item.id, %channel_id, "video published");
    Ok(HttpResponse::Created().json(item))
}

/// Upload a short (multipart: title, description, tags, short)
pub async fn create_short(
    state: web::Data<AppState>,
    user_id: UserId,
    payload: Multipart,
) -> Result<HttpResponse> {
    let mut form = MultipartForm::collect(payload, state.max_upload_bytes(), &["short"]).await?;
    let title = form.require_text("title")?.to_string();
    check_title(&title)?;
    let short_file = form.require_file("short")?;

    let channel_id = require_channel(&state, user_id.0).await?;

    let short = state.media.upload(short_file, ResourceKind::Video).await?;
    check_short_duration(short.duration_secs)?;

    let item = media_repo::create_media(
        &state.db,
        ContentKind::Short,
        NewMedia {
            channel_id,
            title,
            description: form.text("description").unwrap_or_default().to_string(),
            tags: form.tags("tags"),
            media_url: short.url,
            thumbnail_url: None,
            duration_secs: short.duration_secs,
        },
    )
    .await?;

    info!(short_id = %item.id, %channel_id, "short published");
    Ok(HttpResponse::Created().json(item))
}

pub async fn create_playlist(
    state: web::Data<AppState>,
    user_id: UserId,
    req: web::Json<CreatePlaylistRequest>,
) -> Result<HttpResponse> {
    req.validate()?;
    let channel_id = require_channel(&state, user_id.0).await?;

    let mut seen = HashSet::new();
    let video_ids: Vec<Uuid> = req
        .video_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect();

    if !video_ids.is_empty() {
        let owned =
            media_repo::count_owned(&state.db, ContentKind::Video, channel_id, &video_ids).await?;
        if owned != video_ids.len() as i64 {
            return Err(AppError::BadRequest(
                "playlists can only contain your own videos".to_string(),
            ));
        }
    }

    let playlist = playlist_repo::create_playlist(
        &state.db,
        channel_id,
        req.title.trim(),
        req.description.trim(),
        &video_ids,
    )
    .await?;

    Ok(HttpResponse::Created().json(playlist))
}

/// Publish a community post (multipart: content, image?)
pub async fn create_post(
    state: web::Data<AppState>,
    user_id: UserId,
    payload: Multipart,
) -> Result<HttpResponse> {
    let mut form = MultipartForm::collect(payload, state.max_upload_bytes(), &["image"]).await?;
    let content = form.require_text("content")?.to_string();
    let image = form.take_file("image");

    let channel_id = require_channel(&state, user_id.0).await?;

    let image_url = match image {
        Some(file) => Some(state.media.upload(file, ResourceKind::Image).await?.url),
        None => None,
    };

    let post = post_repo::create_post(&state.db, channel_id, &content, image_url.as_deref()).await?;
    Ok(HttpResponse::Created().json(post))
}

pub async fn list_videos(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let (limit, offset) = query.bounds();
    let items = media_repo::list_media(&state.db, ContentKind::Video, limit, offset).await?;
    Ok(HttpResponse::Ok().json(items))
}

pub async fn list_shorts(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let (limit, offset) = query.bounds();
    let items = media_repo::list_media(&state.db, ContentKind::Short, limit, offset).await?;
    Ok(HttpResponse::Ok().json(items))
}

pub async fn list_posts(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let (limit, offset) = query.bounds();
    let posts = post_repo::list_posts(&state.db, limit, offset).await?;
    Ok(HttpResponse::Ok().json(posts))
}

pub async fn list_playlists(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let (limit, offset) = query.bounds();
    let playlists = playlist_repo::list_playlists(&state.db, limit, offset).await?;
    Ok(HttpResponse::Ok().json(playlists))
}

/// `GET /content/{kind}/{id}`
pub async fn get_content(
    state: web::Data<AppState>,
    path: web::Path<(ContentKind, Uuid)>,
) -> Result<HttpResponse> {
    let (kind, id) = path.into_inner();
    let not_found = || AppError::NotFound(format!("{} not found", kind));

    match kind {
        ContentKind::Video | ContentKind::Short => {
            let item = media_repo::find_by_id(&state.db, kind, id)
                .await?
                .ok_or_else(not_found)?;
            Ok(HttpResponse::Ok().json(item))
        }
        ContentKind::Post => {
            let post = post_repo::find_by_id(&state.db, id)
                .await?
                .ok_or_else(not_found)?;
            Ok(HttpResponse::Ok().json(post))
        }
        ContentKind::Playlist => {
            let playlist = playlist_repo::find_by_id(&state.db, id)
                .await?
                .ok_or_else(not_found)?;
            let videos = media_repo::list_for_playlist(&state.db, id).await?;
            Ok(HttpResponse::Ok().json(PlaylistDetail { playlist, videos }))
        }
    }
}

/// `POST /content/{kind}/{id}/view`
pub async fn add_view(
    state: web::Data<AppState>,
    path: web::Path<(ContentKind, Uuid)>,
) -> Result<HttpResponse> {
    let (kind, id) = path.into_inner();
    if !kind.is_watchable() {
        return Err(AppError::BadRequest(format!("{} has no view counter", kind)));
    }

    let views = media_repo::increment_views(&state.db, kind, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} not found", kind)))?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "views": views })))
}

/// `POST /content/{kind}/{id}/{like|dislike|save}`
pub async fn toggle_reaction(
    state: web::Data<AppState>,
    user_id: UserId,
    path: web::Path<(ContentKind, Uuid, Reaction)>,
) -> Result<HttpResponse> {
    let (kind, id, reaction) = path.into_inner();
    if !kind.allows(reaction) {
        return Err(AppError::BadRequest(format!(
            "{} cannot be applied to a {}",
            reaction.as_str(),
            kind
        )));
    }
    require_content(&state, kind, id).await?;

    let summary = reaction_repo::toggle_reaction(&state.db, kind, id, user_id.0, reaction).await?;
    metrics::record_toggle(reaction.as_str(), summary.active);
    Ok(HttpResponse::Ok().json(summary))
}

fn ensure_commentable(kind: ContentKind) -> Result<()> {
    if kind.allows_comments() {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("{}s do not take comments", kind)))
    }
}

pub async fn add_comment(
    state: web::Data<AppState>,
    user_id: UserId,
    path: web::Path<(ContentKind, Uuid)>,
    req: web::Json<CommentRequest>,
) -> Result<HttpResponse> {
    let (kind, id) = path.into_inner();
    ensure_commentable(kind)?;
    req.validate()?;
    require_content(&state, kind, id).await?;

    let comment = comment_repo::create_comment(&state.db, kind, id, user_id.0, req.message.trim()).await?;
    Ok(HttpResponse::Created().json(comment))
}

pub async fn add_reply(
    state: web::Data<AppState>,
    user_id: UserId,
    path: web::Path<(ContentKind, Uuid, Uuid)>,
    req: web::Json<CommentRequest>,
) -> Result<HttpResponse> {
    let (kind, id, comment_id) = path.into_inner();
    ensure_commentable(kind)?;
    req.validate()?;

    let comment = comment_repo::find_comment(&state.db, kind, id, comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("comment not found".to_string()))?;

    let reply = comment_repo::create_reply(&state.db, comment.id, user_id.0, req.message.trim()).await?;
    Ok(HttpResponse::Created().json(reply))
}

pub async fn list_comments(
    state: web::Data<AppState>,
    path: web::Path<(ContentKind, Uuid)>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let (kind, id) = path.into_inner();
    ensure_commentable(kind)?;
    require_content(&state, kind, id).await?;

    let (limit, offset) = query.bounds();
    let comments = comment_repo::list_comments(&state.db, kind, id, limit, offset).await?;
    Ok(HttpResponse::Ok().json(comments))
}
