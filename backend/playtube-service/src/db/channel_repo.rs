/// Channel and subscription database operations
use crate::error::Result;
use crate::models::{Channel, SubscriptionState};
use sqlx::PgPool;
use uuid::Uuid;

const CHANNEL_SELECT: &str = r#"
    SELECT c.id, c.owner_id, c.name, c.description, c.category, c.avatar_url, c.banner_url,
           (SELECT COUNT(*) FROM channel_subscribers s WHERE s.channel_id = c.id) AS subscriber_count,
           c.created_at, c.updated_at
    FROM channels c
"#;

#[derive(Debug, Clone)]
pub struct NewChannel<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub category: &'a str,
    pub avatar_url: Option<&'a str>,
    pub banner_url: Option<&'a str>,
}

/// Partial update; `None` keeps the stored value
#[derive(Debug, Clone, Default)]
pub struct ChannelChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub avatar_url: Option<String>,
    pub banner_url: Option<String>,
}

pub async fn create_channel(pool: &PgPool, owner_id: Uuid, new: NewChannel<'_>) -> Result<Channel> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO channels (id, owner_id, name, description, category, avatar_url, banner_url)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .bind(new.name)
    .bind(new.description)
    .bind(new.category)
    .bind(new.avatar_url)
    .bind(new.banner_url)
    .execute(pool)
    .await?;

    fetch_one_by(pool, "c.id", id).await
}

pub async fn update_channel(pool: &PgPool, id: Uuid, changes: ChannelChanges) -> Result<Channel> {
    sqlx::query(
        r#"
        UPDATE channels
        SET name = COALESCE($2, name),
            description = COALESCE($3, description),
            category = COALESCE($4, category),
            avatar_url = COALESCE($5, avatar_url),
            banner_url = COALESCE($6, banner_url),
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(changes.name)
    .bind(changes.description)
    .bind(changes.category)
    .bind(changes.avatar_url)
    .bind(changes.banner_url)
    .execute(pool)
    .await?;

    fetch_one_by(pool, "c.id", id).await
}

async fn fetch_one_by(pool: &PgPool, column: &str, value: Uuid) -> Result<Channel> {
    let sql = format!("{CHANNEL_SELECT} WHERE {column} = $1");
    let channel = sqlx::query_as::<_, Channel>(&sql)
        .bind(value)
        .fetch_one(pool)
        .await?;
    Ok(channel)
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Channel>> {
    let sql = format!("{CHANNEL_SELECT} WHERE c.id = $1");
    let channel = sqlx::query_as::<_, Channel>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(channel)
}

pub async fn find_by_owner(pool: &PgPool, owner_id: Uuid) -> Result<Option<Channel>> {
    let sql = format!("{CHANNEL_SELECT} WHERE c.owner_id = $1");
    let channel = sqlx::query_as::<_, Channel>(&sql)
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;
    Ok(channel)
}

/// Id of the caller's channel, if they own one
pub async fn channel_id_for_owner(pool: &PgPool, owner_id: Uuid) -> Result<Option<Uuid>> {
    let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM channels WHERE owner_id = $1")
        .bind(owner_id)
        .fetch_optional(pool)
        .await?;
    Ok(id)
}

pub async fn name_taken(pool: &PgPool, name: &str, except: Option<Uuid>) -> Result<bool> {
    let taken = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM channels WHERE LOWER(name) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2))",
    )
    .bind(name)
    .bind(except)
    .fetch_one(pool)
    .await?;
    Ok(taken)
}

/// A page of channels, most subscribed first
pub async fn list_channels(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Channel>> {
    let sql = format!(
        "{CHANNEL_SELECT} ORDER BY subscriber_count DESC, c.created_at DESC LIMIT $1 OFFSET $2"
    );
    let rows = sqlx::query_as::<_, Channel>(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn list_by_category(pool: &PgPool, category: &str) -> Result<Vec<Channel>> {
    let sql = format!(
        "{CHANNEL_SELECT} WHERE LOWER(c.category) = LOWER($1) ORDER BY subscriber_count DESC, c.created_at DESC"
    );
    let rows = sqlx::query_as::<_, Channel>(&sql)
        .bind(category)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Channels whose name matches any of the ILIKE patterns
pub async fn search_by_name(pool: &PgPool, patterns: &[String]) -> Result<Vec<Channel>> {
    if patterns.is_empty() {
        return Ok(Vec::new());
    }
    let sql = format!("{CHANNEL_SELECT} WHERE c.name ILIKE ANY($1) ORDER BY subscriber_count DESC");
    let rows = sqlx::query_as::<_, Channel>(&sql)
        .bind(patterns)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

/// Channels the user subscribes to, most recent subscription first
pub async fn subscribed_channels(pool: &PgPool, user_id: Uuid) -> Result<Vec<Channel>> {
    let sql = format!(
        r#"{CHANNEL_SELECT}
        JOIN channel_subscribers me ON me.channel_id = c.id AND me.user_id = $1
        ORDER BY me.created_at DESC"#
    );
    let rows = sqlx::query_as::<_, Channel>(&sql)
        .bind(user_id)
        .fetch_all(pool)
        .await?;
    Ok(rows)
}

pub async fn is_subscribed(pool: &PgPool, channel_id: Uuid, user_id: Uuid) -> Result<bool> {
    let subscribed = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM channel_subscribers WHERE channel_id = $1 AND user_id = $2)",
    )
    .bind(channel_id)
    .bind(user_id)
    .fetch_one(pool)
    .await?;
    Ok(subscribed)
}

/// Flip the user's subscription and return the resulting state
pub async fn toggle_subscription(
    pool: &PgPool,
    channel_id: Uuid,
    user_id: Uuid,
) -> Result<SubscriptionState> {
    let mut tx = pool.begin().await?;

    let removed = sqlx::query("DELETE FROM channel_subscribers WHERE channel_id = $1 AND user_id = $2")
        .bind(channel_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if removed == 0 {
        sqlx::query(
            r#"
            INSERT INTO channel_subscribers (channel_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(channel_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    }

    let subscriber_count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM channel_subscribers WHERE channel_id = $1")
            .bind(channel_id)
            .fetch_one(&mut *tx)
            .await?;

    tx.commit().await?;

    Ok(SubscriptionState {
        subscribed: removed == 0,
        subscriber_count,
    })
}
