/// Community post database operations
use crate::error::Result;
use crate::models::Post;
use sqlx::PgPool;
use uuid::Uuid;

const POST_SELECT: &str = r#"
    SELECT p.id, p.channel_id, c.name AS channel_name, c.avatar_url AS channel_avatar_url,
           p.content, p.image_url,
           (SELECT COUNT(*) FROM content_reactions r
             WHERE r.content_kind = 'post' AND r.content_id = p.id AND r.reaction = 'like') AS like_count,
           (SELECT COUNT(*) FROM comments cm
             WHERE cm.content_kind = 'post' AND cm.content_id = p.id) AS comment_count,
           p.created_at
    FROM posts p
    JOIN channels c ON c.id = p.channel_id
"#;

pub async fn create_post(
    pool: &PgPool,
    channel_id: Uuid,
    content: &str,
    image_url: Option<&str>,
) -> Result<Post> {
    let id = Uuid::new_v4();
    sqlx::query("INSERT INTO posts (id, channel_id, content, image_url) VALUES ($1, $2, $3, $4)")
        .bind(id)
        .bind(channel_id)
        .bind(content)
        .bind(image_url)
        .execute(pool)
        .await?;

    let sql = format!("{POST_SELECT} WHERE p.id = $1");
    let post = sqlx::query_as::<_, Post>(&sql)
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(post)
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Post>> {
    let sql = format!("{POST_SELECT} WHERE p.id = $1");
    let post = sqlx::query_as::<_, Post>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(post)
}

pub async fn list_posts(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Post>> {
    let sql = format!("{POST_SELECT} ORDER BY p.created_at DESC LIMIT $1 OFFSET $2");
    let rows = sqlx::query_as::<_, Post>(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn list_by_channels(pool: &PgPool, channel_ids: &[Uuid]) -> Result<Vec<Post>> {
    if channel_ids.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!("{POST_SELECT} WHERE p.channel_id = ANY($1) ORDER BY p.created_at DESC");
    let rows = sqlx::query_as::<_, Post>(&sql)
        .bind(channel_ids)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}
