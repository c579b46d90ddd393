/// Watch history database operations
use crate::error::Result;
use crate::models::{ContentKind, HistoryEntry};
use sqlx::PgPool;
use uuid::Uuid;

/// Record a watch; re-watching moves the entry to the top
pub async fn record_watch(
    pool: &PgPool,
    user_id: Uuid,
    kind: ContentKind,
    content_id: Uuid,
) -> Result<HistoryEntry> {
    let entry = sqlx::query_as::<_, HistoryEntry>(
        r#"
        INSERT INTO watch_history (user_id, content_kind, content_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, content_kind, content_id)
        DO UPDATE SET watched_at = NOW()
        RETURNING content_kind, content_id, watched_at
        "#,
    )
    .bind(user_id)
    .bind(kind.as_str())
    .bind(content_id)
    .fetch_one(pool)
    .await?;
    Ok(entry)
}

/// Newest first
pub async fn list_history(pool: &PgPool, user_id: Uuid) -> Result<Vec<HistoryEntry>> {
    let rows = sqlx::query_as::<_, HistoryEntry>(
        r#"
        SELECT content_kind, content_id, watched_at
        FROM watch_history
        WHERE user_id = $1
        ORDER BY watched_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

pub async fn watched_ids(pool: &PgPool, user_id: Uuid, kind: ContentKind) -> Result<Vec<Uuid>> {
    let ids = sqlx::query_scalar::<_, Uuid>(
        "SELECT content_id FROM watch_history WHERE user_id = $1 AND content_kind = $2",
    )
    .bind(user_id)
    .bind(kind.as_str())
    .fetch_all(pool)
    .await?;
    Ok(ids)
}
