/// Per-user handlers: profile, history, library pages, recommendations
use crate::db::{channel_repo, history_repo, media_repo, playlist_repo, post_repo, reaction_repo, user_repo};
use crate::error::{AppError, Result};
use crate::middleware::UserId;
use crate::models::{
    ContentCollection, ContentKind, CurrentUser, MediaItem, Reaction, SubscribedContent,
    WatchedItem,
};
use crate::services::recommendation;
use crate::AppState;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct AddHistoryRequest {
    pub content_kind: ContentKind,
    pub content_id: Uuid,
}

/// Reorder `items` to follow `ids`; ids without a row are skipped
pub fn in_id_order<T, F>(ids: &[Uuid], items: Vec<T>, id_of: F) -> Vec<T>
where
    F: Fn(&T) -> Uuid,
{
    let mut by_id: HashMap<Uuid, T> = items.into_iter().map(|i| (id_of(&i), i)).collect();
    ids.iter().filter_map(|id| by_id.remove(id)).collect()
}

async fn media_for(
    state: &AppState,
    user_id: Uuid,
    kind: ContentKind,
    reaction: Reaction,
) -> Result<Vec<MediaItem>> {
    let ids = reaction_repo::content_ids_for_user(&state.db, user_id, kind, reaction).await?;
    let items = media_repo::find_by_ids(&state.db, kind, &ids).await?;
    Ok(in_id_order(&ids, items, |m| m.id))
}

pub async fn current_user(state: web::Data<AppState>, user_id: UserId) -> Result<HttpResponse> {
    let user = user_repo::find_by_id(&state.db, user_id.0)
        .await?
        .ok_or_else(|| AppError::NotFound("user not found".to_string()))?;
    let channel_id = channel_repo::channel_id_for_owner(&state.db, user.id).await?;

    Ok(HttpResponse::Ok().json(CurrentUser { user, channel_id }))
}

pub async fn add_history(
    state: web::Data<AppState>,
    user_id: UserId,
    req: web::Json<AddHistoryRequest>,
) -> Result<HttpResponse> {
    if !req.content_kind.is_watchable() {
        return Err(AppError::BadRequest(
            "only videos and shorts are kept in history".to_string(),
        ));
    }
    if media_repo::find_by_id(&state.db, req.content_kind, req.content_id)
        .await?
        .is_none()
    {
        return Err(AppError::NotFound(format!("{} not found", req.content_kind)));
    }

    let entry =
        history_repo::record_watch(&state.db, user_id.0, req.content_kind, req.content_id).await?;
    Ok(HttpResponse::Ok().json(entry))
}

/// Watched videos and shorts, most recent first
pub async fn get_history(state: web::Data<AppState>, user_id: UserId) -> Result<HttpResponse> {
    let entries = history_repo::list_history(&state.db, user_id.0).await?;

    let mut resolved: HashMap<(ContentKind, Uuid), MediaItem> = HashMap::new();
    for kind in [ContentKind::Video, ContentKind::Short] {
        let ids: Vec<Uuid> = entries
            .iter()
            .filter(|e| e.content_kind == kind)
            .map(|e| e.content_id)
            .collect();
        for item in media_repo::find_by_ids(&state.db, kind, &ids).await? {
            resolved.insert((kind, item.id), item);
        }
    }

    let history: Vec<WatchedItem> = entries
        .into_iter()
        .filter_map(|e| {
            resolved
                .remove(&(e.content_kind, e.content_id))
                .map(|item| WatchedItem {
                    watched_at: e.watched_at,
                    item,
                })
        })
        .collect();

    Ok(HttpResponse::Ok().json(history))
}

pub async fn liked_content(state: web::Data<AppState>, user_id: UserId) -> Result<HttpResponse> {
    let collection = ContentCollection {
        videos: media_for(&state, user_id.0, ContentKind::Video, Reaction::Like).await?,
        shorts: media_for(&state, user_id.0, ContentKind::Short, Reaction::Like).await?,
        playlists: Vec::new(),
    };
    Ok(HttpResponse::Ok().json(collection))
}

pub async fn saved_content(state: web::Data<AppState>, user_id: UserId) -> Result<HttpResponse> {
    let playlist_ids =
        reaction_repo::content_ids_for_user(&state.db, user_id.0, ContentKind::Playlist, Reaction::Save)
            .await?;
    let playlists = playlist_repo::find_by_ids(&state.db, &playlist_ids).await?;

    let collection = ContentCollection {
        videos: media_for(&state, user_id.0, ContentKind::Video, Reaction::Save).await?,
        shorts: media_for(&state, user_id.0, ContentKind::Short, Reaction::Save).await?,
        playlists: in_id_order(&playlist_ids, playlists, |p| p.id),
    };
    Ok(HttpResponse::Ok().json(collection))
}

/// Channels the user follows plus everything they published
pub async fn subscribed_content(
    state: web::Data<AppState>,
    user_id: UserId,
) -> Result<HttpResponse> {
    let channels = channel_repo::subscribed_channels(&state.db, user_id.0).await?;
    let ids: Vec<Uuid> = channels.iter().map(|c| c.id).collect();

    let content = SubscribedContent {
        videos: media_repo::list_by_channels(&state.db, ContentKind::Video, &ids).await?,
        shorts: media_repo::list_by_channels(&state.db, ContentKind::Short, &ids).await?,
        playlists: playlist_repo::list_by_channels(&state.db, &ids).await?,
        posts: post_repo::list_by_channels(&state.db, &ids).await?,
        channels,
    };
    Ok(HttpResponse::Ok().json(content))
}

pub async fn get_recommended_content(
    state: web::Data<AppState>,
    user_id: UserId,
) -> Result<HttpResponse> {
    let feed = recommendation::recommend_for(&state.db, user_id.0).await?;
    Ok(HttpResponse::Ok().json(feed))
}
