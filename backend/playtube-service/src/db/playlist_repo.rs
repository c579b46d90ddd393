/// Playlist database operations
use crate::error::Result;
use crate::models::Playlist;
use sqlx::PgPool;
use uuid::Uuid;

const PLAYLIST_SELECT: &str = r#"
    SELECT p.id, p.channel_id, p.title, p.description,
           (SELECT COUNT(*) FROM playlist_videos pv WHERE pv.playlist_id = p.id) AS video_count,
           (SELECT COUNT(*) FROM content_reactions r
             WHERE r.content_kind = 'playlist' AND r.content_id = p.id AND r.reaction = 'save') AS save_count,
           p.created_at
    FROM playlists p
"#;

/// Insert the playlist and its ordered video ids in one transaction
pub async fn create_playlist(
    pool: &PgPool,
    channel_id: Uuid,
    title: &str,
    description: &str,
    video_ids: &[Uuid],
) -> Result<Playlist> {
    let id = Uuid::new_v4();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        INSERT INTO playlists (id, channel_id, title, description)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(id)
    .bind(channel_id)
    .bind(title)
    .bind(description)
    .execute(&mut *tx)
    .await?;

    for (position, video_id) in video_ids.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO playlist_videos (playlist_id, video_id, position)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(id)
        .bind(video_id)
        .bind(position as i32)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    let sql = format!("{PLAYLIST_SELECT} WHERE p.id = $1");
    let playlist = sqlx::query_as::<_, Playlist>(&sql)
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(playlist)
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Playlist>> {
    let sql = format!("{PLAYLIST_SELECT} WHERE p.id = $1");
    let playlist = sqlx::query_as::<_, Playlist>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(playlist)
}

pub async fn find_by_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Playlist>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!("{PLAYLIST_SELECT} WHERE p.id = ANY($1) ORDER BY p.created_at DESC");
    let rows = sqlx::query_as::<_, Playlist>(&sql)
        .bind(ids)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn list_playlists(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Playlist>> {
    let sql = format!("{PLAYLIST_SELECT} ORDER BY p.created_at DESC LIMIT $1 OFFSET $2");
    let rows = sqlx::query_as::<_, Playlist>(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn list_by_channels(pool: &PgPool, channel_ids: &[Uuid]) -> Result<Vec<Playlist>> {
    if channel_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!("{PLAYLIST_SELECT} WHERE p.channel_id = ANY($1) ORDER BY p.created_at DESC");
    let rows = sqlx::query_as::<_, Playlist>(&sql)
        .bind(channel_ids)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Playlists whose title matches any of the ILIKE patterns
pub async fn search_by_title(pool: &PgPool, patterns: &[String]) -> Result<Vec<Playlist>> {
    if patterns.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!("{PLAYLIST_SELECT} WHERE p.title ILIKE ANY($1) ORDER BY p.created_at DESC");
    let rows = sqlx::query_as::<_, Playlist>(&sql)
        .bind(patterns)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}
