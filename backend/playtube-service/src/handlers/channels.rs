/// Channel handlers: create/update, channel pages, subscriptions
use crate::db::channel_repo::{self, ChannelChanges, NewChannel};
use crate::db::{media_repo, playlist_repo, post_repo};
use crate::error::{AppError, Result};
use crate::handlers::content::PageQuery;
use crate::handlers::form::MultipartForm;
use crate::metrics;
use crate::middleware::{MaybeUser, UserId};
use crate::models::{Channel, ChannelDetail, ContentKind};
use crate::services::search::CATEGORIES;
use crate::services::{ResourceKind, UploadedFile};
use crate::AppState;
use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use tracing::info;
use uuid::Uuid;

const MAX_CHANNEL_NAME: usize = 100;
const CHANNEL_IMAGES: &[&str] = &["avatar", "banner"];

/// Canonical spelling of a category, or a validation error
pub fn canonical_category(input: &str) -> Result<&'static str> {
    CATEGORIES
        .iter()
        .copied()
        .find(|c| c.eq_ignore_ascii_case(input.trim()))
        .ok_or_else(|| {
            AppError::ValidationError(format!(
                "unknown category '{}'; expected one of: {}",
                input,
                CATEGORIES.join(", ")
            ))
        })
}

fn check_name(name: &str) -> Result<()> {
    if name.chars().count() > MAX_CHANNEL_NAME {
        return Err(AppError::ValidationError(format!(
            "channel name must be at most {} characters",
            MAX_CHANNEL_NAME
        )));
    }
    Ok(())
}

async fn upload_image(state: &AppState, file: Option<UploadedFile>) -> Result<Option<String>> {
    match file {
        Some(file) => Ok(Some(state.media.upload(file, ResourceKind::Image).await?.url)),
        None => Ok(None),
    }
}

async fn detail(state: &AppState, channel: Channel, viewer: Option<Uuid>) -> Result<ChannelDetail> {
    let ids = [channel.id];
    let is_subscribed = match viewer {
        Some(user_id) => channel_repo::is_subscribed(&state.db, channel.id, user_id).await?,
        None => false,
    };

    Ok(ChannelDetail {
        is_subscribed,
        videos: media_repo::list_by_channels(&state.db, ContentKind::Video, &ids).await?,
        shorts: media_repo::list_by_channels(&state.db, ContentKind::Short, &ids).await?,
        playlists: playlist_repo::list_by_channels(&state.db, &ids).await?,
        posts: post_repo::list_by_channels(&state.db, &ids).await?,
        channel,
    })
}

/// Create the caller's channel (multipart: name, description, category,
/// avatar?, banner?)
pub async fn create_channel(
    state: web::Data<AppState>,
    user_id: UserId,
    payload: Multipart,
) -> Result<HttpResponse> {
    let mut form = MultipartForm::collect(payload, state.max_upload_bytes(), CHANNEL_IMAGES).await?;

    let name = form.require_text("name")?.to_string();
    check_name(&name)?;
    let category = canonical_category(form.require_text("category")?)?;
    let description = form.text("description").unwrap_or_default().to_string();

    if channel_repo::channel_id_for_owner(&state.db, user_id.0)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict("you already have a channel".to_string()));
    }
    if channel_repo::name_taken(&state.db, &name, None).await? {
        return Err(AppError::Conflict("channel name is taken".to_string()));
    }

    let avatar_url = upload_image(&state, form.take_file("avatar")).await?;
    let banner_url = upload_image(&state, form.take_file("banner")).await?;

    let channel = channel_repo::create_channel(
        &state.db,
        user_id.0,
        NewChannel {
            name: &name,
            description: &description,
            category,
            avatar_url: avatar_url.as_deref(),
            banner_url: banner_url.as_deref(),
        },
    )
    .await?;

    info!(channel_id = %channel.id, owner = %user_id.0, "channel created");
    Ok(HttpResponse::Created().json(channel))
}

/// Partial update of the caller's channel; only sent fields change
pub async fn update_channel(
    state: web::Data<AppState>,
    user_id: UserId,
    payload: Multipart,
) -> Result<HttpResponse> {
    let mut form = MultipartForm::collect(payload, state.max_upload_bytes(), CHANNEL_IMAGES).await?;

    let channel = channel_repo::find_by_owner(&state.db, user_id.0)
        .await?
        .ok_or_else(|| AppError::NotFound("you do not have a channel".to_string()))?;

    let mut changes = ChannelChanges::default();
    if let Some(name) = form.text("name") {
        check_name(name)?;
        if channel_repo::name_taken(&state.db, name, Some(channel.id)).await? {
            return Err(AppError::Conflict("channel name is taken".to_string()));
        }
        changes.name = Some(name.to_string());
    }
    if let Some(category) = form.text("category") {
        changes.category = Some(canonical_category(category)?.to_string());
    }
    // An empty description is a legitimate edit
    if let Some(description) = form.raw("description") {
        changes.description = Some(description.trim().to_string());
    }
    changes.avatar_url = upload_image(&state, form.take_file("avatar")).await?;
    changes.banner_url = upload_image(&state, form.take_file("banner")).await?;

    let updated = channel_repo::update_channel(&state.db, channel.id, changes).await?;
    Ok(HttpResponse::Ok().json(updated))
}

pub async fn get_my_channel(state: web::Data<AppState>, user_id: UserId) -> Result<HttpResponse> {
    let channel = channel_repo::find_by_owner(&state.db, user_id.0)
        .await?
        .ok_or_else(|| AppError::NotFound("you do not have a channel".to_string()))?;
    let page = detail(&state, channel, Some(user_id.0)).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn get_channel(
    state: web::Data<AppState>,
    viewer: MaybeUser,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let channel = channel_repo::find_by_id(&state.db, path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("channel not found".to_string()))?;
    let page = detail(&state, channel, viewer.0).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn list_channels(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse> {
    let (limit, offset) = query.bounds();
    let channels = channel_repo::list_channels(&state.db, limit, offset).await?;
    Ok(HttpResponse::Ok().json(channels))
}

pub async fn toggle_subscribe(
    state: web::Data<AppState>,
    user_id: UserId,
    path: web::Path<Uuid>,
) -> Result<HttpResponse> {
    let channel = channel_repo::find_by_id(&state.db, path.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("channel not found".to_string()))?;

    if channel.owner_id == user_id.0 {
        return Err(AppError::BadRequest(
            "you cannot subscribe to your own channel".to_string(),
        ));
    }

    let state_after = channel_repo::toggle_subscription(&state.db, channel.id, user_id.0).await?;
    metrics::record_toggle("subscribe", state_after.subscribed);
    Ok(HttpResponse::Ok().json(state_after))
}
