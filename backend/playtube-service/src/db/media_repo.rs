/// Video and short database operations
///
/// Videos and shorts share one row shape; every function takes the
/// `ContentKind` and picks the table from it.
use crate::error::{AppError, Result};
use crate::models::{ContentKind, MediaItem};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct NewMedia {
    pub channel_id: Uuid,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub media_url: String,
    pub thumbnail_url: Option<String>,
    pub duration_secs: Option<f64>,
}

fn media_table(kind: ContentKind) -> Result<&'static str> {
    if kind.is_watchable() {
        Ok(kind.table())
    } else {
        Err(AppError::BadRequest(format!("{} is not a video or short", kind)))
    }
}

/// SELECT over `m` (videos or shorts) joined to its channel, with reaction counts
fn media_select(kind: ContentKind) -> Result<String> {
    let table = media_table(kind)?;
    let kind = kind.as_str();
    Ok(format!(
        r#"
        SELECT m.id, '{kind}' AS kind, m.channel_id, c.name AS channel_name,
               c.avatar_url AS channel_avatar_url, m.title, m.description, m.tags,
               m.media_url, m.thumbnail_url, m.duration_secs, m.views,
               (SELECT COUNT(*) FROM content_reactions r
                 WHERE r.content_kind = '{kind}' AND r.content_id = m.id AND r.reaction = 'like') AS like_count,
               (SELECT COUNT(*) FROM content_reactions r
                 WHERE r.content_kind = '{kind}' AND r.content_id = m.id AND r.reaction = 'dislike') AS dislike_count,
               (SELECT COUNT(*) FROM content_reactions r
                 WHERE r.content_kind = '{kind}' AND r.content_id = m.id AND r.reaction = 'save') AS save_count,
               m.created_at
        FROM {table} m
        JOIN channels c ON c.id = m.channel_id
        "#
    ))
}

/// Matches any pattern against title, description or one of the tags
const KEYWORD_FILTER: &str = r#"(
        m.title ILIKE ANY($PAT)
        OR m.description ILIKE ANY($PAT)
        OR EXISTS (SELECT 1 FROM unnest(m.tags) AS t(tag) WHERE t.tag ILIKE ANY($PAT))
    )"#;

fn keyword_filter(param: usize) -> String {
    KEYWORD_FILTER.replace("$PAT", &format!("${}", param))
}

pub async fn create_media(pool: &PgPool, kind: ContentKind, new: NewMedia) -> Result<MediaItem> {
    let table = media_table(kind)?;
    let id = Uuid::new_v4();
    let sql = format!(
        r#"
        INSERT INTO {table} (id, channel_id, title, description, tags, media_url, thumbnail_url, duration_secs)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#
    );
    sqlx::query(&sql)
        .bind(id)
        .bind(new.channel_id)
        .bind(&new.title)
        .bind(&new.description)
        .bind(&new.tags)
        .bind(&new.media_url)
        .bind(&new.thumbnail_url)
        .bind(new.duration_secs)
        .execute(pool)
        .await?;

    find_by_id(pool, kind, id)
        .await?
        .ok_or_else(|| AppError::Internal(format!("{} {} vanished after insert", kind, id)))
}

pub async fn find_by_id(pool: &PgPool, kind: ContentKind, id: Uuid) -> Result<Option<MediaItem>> {
    let sql = format!("{} WHERE m.id = $1", media_select(kind)?);
    let item = sqlx::query_as::<_, MediaItem>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(item)
}

/// Rows with the given ids, newest first
pub async fn find_by_ids(pool: &PgPool, kind: ContentKind, ids: &[Uuid]) -> Result<Vec<MediaItem>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "{} WHERE m.id = ANY($1) ORDER BY m.created_at DESC",
        media_select(kind)?
    );
    let rows = sqlx::query_as::<_, MediaItem>(&sql)
        .bind(ids)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn list_media(
    pool: &PgPool,
    kind: ContentKind,
    limit: i64,
    offset: i64,
) -> Result<Vec<MediaItem>> {
    let sql = format!(
        "{} ORDER BY m.created_at DESC LIMIT $1 OFFSET $2",
        media_select(kind)?
    );
    let rows = sqlx::query_as::<_, MediaItem>(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Rows published by any of the channels, newest first
pub async fn list_by_channels(
    pool: &PgPool,
    kind: ContentKind,
    channel_ids: &[Uuid],
) -> Result<Vec<MediaItem>> {
    if channel_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "{} WHERE m.channel_id = ANY($1) ORDER BY m.created_at DESC",
        media_select(kind)?
    );
    let rows = sqlx::query_as::<_, MediaItem>(&sql)
        .bind(channel_ids)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Count how many of `ids` are videos owned by `channel_id`
pub async fn count_owned(
    pool: &PgPool,
    kind: ContentKind,
    channel_id: Uuid,
    ids: &[Uuid],
) -> Result<i64> {
    let table = media_table(kind)?;
    let sql = format!("SELECT COUNT(*) FROM {table} WHERE channel_id = $1 AND id = ANY($2)");
    let count = sqlx::query_scalar::<_, i64>(&sql)
        .bind(channel_id)
        .bind(ids)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Increment the view counter; `None` when the row does not exist
pub async fn increment_views(pool: &PgPool, kind: ContentKind, id: Uuid) -> Result<Option<i64>> {
    let table = media_table(kind)?;
    let sql = format!("UPDATE {table} SET views = views + 1 WHERE id = $1 RETURNING views");
    let views = sqlx::query_scalar::<_, i64>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(views)
}

/// Keyword search over title, description and tags
pub async fn search(pool: &PgPool, kind: ContentKind, patterns: &[String]) -> Result<Vec<MediaItem>> {
    if patterns.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "{} WHERE {} ORDER BY m.views DESC, m.created_at DESC",
        media_select(kind)?,
        keyword_filter(1)
    );
    let rows = sqlx::query_as::<_, MediaItem>(&sql)
        .bind(patterns)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Rows outside `exclude` matching any keyword pattern
pub async fn recommendation_candidates(
    pool: &PgPool,
    kind: ContentKind,
    exclude: &[Uuid],
    patterns: &[String],
) -> Result<Vec<MediaItem>> {
    if patterns.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!(
        "{} WHERE m.id <> ALL($1) AND {} ORDER BY m.created_at DESC",
        media_select(kind)?,
        keyword_filter(2)
    );
    let rows = sqlx::query_as::<_, MediaItem>(&sql)
        .bind(exclude)
        .bind(patterns)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Every row outside `exclude`, newest first
pub async fn list_excluding(
    pool: &PgPool,
    kind: ContentKind,
    exclude: &[Uuid],
) -> Result<Vec<MediaItem>> {
    let sql = format!(
        "{} WHERE m.id <> ALL($1) ORDER BY m.created_at DESC",
        media_select(kind)?
    );
    let rows = sqlx::query_as::<_, MediaItem>(&sql)
        .bind(exclude)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Rows whose channel is in `category`, or whose title or tags mention it
pub async fn list_for_category(
    pool: &PgPool,
    kind: ContentKind,
    category: &str,
) -> Result<Vec<MediaItem>> {
    let pattern = format!("%{}%", super::escape_like(category));
    let sql = format!(
        r#"{} WHERE LOWER(c.category) = LOWER($1)
              OR m.title ILIKE $2
              OR EXISTS (SELECT 1 FROM unnest(m.tags) AS t(tag) WHERE t.tag ILIKE $2)
           ORDER BY m.views DESC, m.created_at DESC"#,
        media_select(kind)?
    );
    let rows = sqlx::query_as::<_, MediaItem>(&sql)
        .bind(category)
        .bind(pattern)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Videos of a playlist in playlist order
pub async fn list_for_playlist(pool: &PgPool, playlist_id: Uuid) -> Result<Vec<MediaItem>> {
    let sql = format!(
        r#"{} JOIN playlist_videos pv ON pv.video_id = m.id
           WHERE pv.playlist_id = $1
           ORDER BY pv.position ASC"#,
        media_select(ContentKind::Video)?
    );
    let rows = sqlx::query_as::<_, MediaItem>(&sql)
        .bind(playlist_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}
