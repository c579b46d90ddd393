/// Comment and reply database operations
use crate::error::Result;
use crate::models::{Comment, ContentKind, Reply};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

const COMMENT_SELECT: &str = r#"
    SELECT cm.id, cm.content_kind, cm.content_id, cm.author_id,
           u.user_name AS author_name, u.photo_url AS author_photo_url,
           cm.message, cm.created_at
    FROM comments cm
    JOIN users u ON u.id = cm.author_id
"#;

const REPLY_SELECT: &str = r#"
    SELECT r.id, r.comment_id, r.author_id,
           u.user_name AS author_name, u.photo_url AS author_photo_url,
           r.message, r.created_at
    FROM comment_replies r
    JOIN users u ON u.id = r.author_id
"#;

pub async fn create_comment(
    pool: &PgPool,
    kind: ContentKind,
    content_id: Uuid,
    author_id: Uuid,
    message: &str,
) -> Result<Comment> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO comments (id, content_kind, content_id, author_id, message)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(kind.as_str())
    .bind(content_id)
    .bind(author_id)
    .bind(message)
    .execute(pool)
    .await?;

    let sql = format!("{COMMENT_SELECT} WHERE cm.id = $1");
    let comment = sqlx::query_as::<_, Comment>(&sql)
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(comment)
}

/// Find a comment that belongs to the given content
pub async fn find_comment(
    pool: &PgPool,
    kind: ContentKind,
    content_id: Uuid,
    comment_id: Uuid,
) -> Result<Option<Comment>> {
    let sql = format!(
        "{COMMENT_SELECT} WHERE cm.id = $1 AND cm.content_kind = $2 AND cm.content_id = $3"
    );
    let comment = sqlx::query_as::<_, Comment>(&sql)
        .bind(comment_id)
        .bind(kind.as_str())
        .bind(content_id)
        .fetch_optional(pool)
        .await?;
    Ok(comment)
}

pub async fn create_reply(
    pool: &PgPool,
    comment_id: Uuid,
    author_id: Uuid,
    message: &str,
) -> Result<Reply> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO comment_replies (id, comment_id, author_id, message)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(id)
    .bind(comment_id)
    .bind(author_id)
    .bind(message)
    .execute(pool)
    .await?;

    let sql = format!("{REPLY_SELECT} WHERE r.id = $1");
    let reply = sqlx::query_as::<_, Reply>(&sql)
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(reply)
}

/// A page of comments on a piece of content, newest first, each with all
/// of its replies oldest first
pub async fn list_comments(
    pool: &PgPool,
    kind: ContentKind,
    content_id: Uuid,
    limit: i64,
    offset: i64,
) -> Result<Vec<Comment>> {
    let sql = format!(
        r#"{COMMENT_SELECT} WHERE cm.content_kind = $1 AND cm.content_id = $2
           ORDER BY cm.created_at DESC LIMIT $3 OFFSET $4"#
    );
    let mut comments = sqlx::query_as::<_, Comment>(&sql)
        .bind(kind.as_str())
        .bind(content_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    if comments.is_empty() {
        return Ok(comments);
    }

    let ids: Vec<Uuid> = comments.iter().map(|c| c.id).collect();
    let sql = format!("{REPLY_SELECT} WHERE r.comment_id = ANY($1) ORDER BY r.created_at ASC");
    let replies = sqlx::query_as::<_, Reply>(&sql)
        .bind(&ids)
        .fetch_all(pool)
        .await?;

    let mut by_comment: HashMap<Uuid, Vec<Reply>> = HashMap::new();
    for reply in replies {
        by_comment.entry(reply.comment_id).or_default().push(reply);
    }
    for comment in &mut comments {
        comment.replies = by_comment.remove(&comment.id).unwrap_or_default();
    }

    Ok(comments)
}
