/// Like / dislike / save toggles over `content_reactions`
use crate::error::Result;
use crate::models::{ContentKind, Reaction, ReactionSummary};
use sqlx::{PgPool, Postgres, Row, Transaction};
use uuid::Uuid;

/// Whether a row of `kind` with `id` exists
pub async fn content_exists(pool: &PgPool, kind: ContentKind, id: Uuid) -> Result<bool> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)", kind.table());
    let exists = sqlx::query_scalar::<_, bool>(&sql)
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

/// Toggle `reaction` for the user. Adding a like drops a dislike and vice
/// versa, all inside one transaction.
pub async fn toggle_reaction(
    pool: &PgPool,
    kind: ContentKind,
    content_id: Uuid,
    user_id: Uuid,
    reaction: Reaction,
) -> Result<ReactionSummary> {
    let mut tx = pool.begin().await?;

    let removed = sqlx::query(
        r#"
        DELETE FROM content_reactions
        WHERE content_kind = $1 AND content_id = $2 AND user_id = $3 AND reaction = $4
        "#,
    )
    .bind(kind.as_str())
    .bind(content_id)
    .bind(user_id)
    .bind(reaction.as_str())
    .execute(&mut *tx)
    .await?
    .rows_affected();

    let active = removed == 0;
    if active {
        if let Some(opposite) = reaction.opposite() {
            sqlx::query(
                r#"
                DELETE FROM content_reactions
                WHERE content_kind = $1 AND content_id = $2 AND user_id = $3 AND reaction = $4
                "#,
            )
            .bind(kind.as_str())
            .bind(content_id)
            .bind(user_id)
            .bind(opposite.as_str())
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query(
            r#"
            INSERT INTO content_reactions (content_kind, content_id, user_id, reaction)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(kind.as_str())
        .bind(content_id)
        .bind(user_id)
        .bind(reaction.as_str())
        .execute(&mut *tx)
        .await?;
    }

    let summary = counts(&mut tx, kind, content_id, active).await?;
    tx.commit().await?;

    Ok(summary)
}

async fn counts(
    tx: &mut Transaction<'_, Postgres>,
    kind: ContentKind,
    content_id: Uuid,
    active: bool,
) -> Result<ReactionSummary> {
    let row = sqlx::query(
        r#"
        SELECT
            COUNT(*) FILTER (WHERE reaction = 'like') AS likes,
            COUNT(*) FILTER (WHERE reaction = 'dislike') AS dislikes,
            COUNT(*) FILTER (WHERE reaction = 'save') AS saves
        FROM content_reactions
        WHERE content_kind = $1 AND content_id = $2
        "#,
    )
    .bind(kind.as_str())
    .bind(content_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(ReactionSummary {
        active,
        likes: row.try_get("likes")?,
        dislikes: row.try_get("dislikes")?,
        saves: row.try_get("saves")?,
    })
}

/// Ids of `kind` the user holds `reaction` on, most recent first
pub async fn content_ids_for_user(
    pool: &PgPool,
    user_id: Uuid,
    kind: ContentKind,
    reaction: Reaction,
) -> Result<Vec<Uuid>> {
    let ids = sqlx::query_scalar::<_, Uuid>(
        r#"
        SELECT content_id FROM content_reactions
        WHERE user_id = $1 AND content_kind = $2 AND reaction = $3
        ORDER BY created_at DESC
        "#,
    )
    .bind(user_id)
    .bind(kind.as_str())
    .bind(reaction.as_str())
    .fetch_all(pool)
    .await?;
    Ok(ids)
}
