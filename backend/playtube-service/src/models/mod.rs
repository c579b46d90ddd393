/// Data models for PlayTube
///
/// Rows map 1:1 onto the tables in `backend/migrations`. Counts such as
/// `like_count` are computed by the repositories at read time.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::error::BoxDynError;
use sqlx::postgres::{PgTypeInfo, PgValueRef};
use sqlx::{Decode, FromRow, Postgres, Type};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// =====================================================================
// Content kinds and reactions
// =====================================================================

/// Kind of content a reaction, comment or history entry points at.
///
/// Path segments accept both the singular and plural spelling
/// (`/content/videos/{id}` and `/content/video/{id}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    #[serde(alias = "videos")]
    Video,
    #[serde(alias = "shorts")]
    Short,
    #[serde(alias = "posts")]
    Post,
    #[serde(alias = "playlists")]
    Playlist,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Video => "video",
            ContentKind::Short => "short",
            ContentKind::Post => "post",
            ContentKind::Playlist => "playlist",
        }
    }

    /// Table holding rows of this kind
    pub fn table(&self) -> &'static str {
        match self {
            ContentKind::Video => "videos",
            ContentKind::Short => "shorts",
            ContentKind::Post => "posts",
            ContentKind::Playlist => "playlists",
        }
    }

    /// Reactions a user may toggle on this kind
    pub fn allowed_reactions(&self) -> &'static [Reaction] {
        match self {
            ContentKind::Video | ContentKind::Short => {
                &[Reaction::Like, Reaction::Dislike, Reaction::Save]
            }
            ContentKind::Post => &[Reaction::Like],
            ContentKind::Playlist => &[Reaction::Save],
        }
    }

    pub fn allows(&self, reaction: Reaction) -> bool {
        self.allowed_reactions().contains(&reaction)
    }

    pub fn allows_comments(&self) -> bool {
        !matches!(self, ContentKind::Playlist)
    }

    /// Videos and shorts have views and appear in watch history
    pub fn is_watchable(&self) -> bool {
        matches!(self, ContentKind::Video | ContentKind::Short)
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown content kind: {0}")]
pub struct UnknownContentKind(pub String);

impl FromStr for ContentKind {
    type Err = UnknownContentKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "video" | "videos" => Ok(ContentKind::Video),
            "short" | "shorts" => Ok(ContentKind::Short),
            "post" | "posts" => Ok(ContentKind::Post),
            "playlist" | "playlists" => Ok(ContentKind::Playlist),
            other => Err(UnknownContentKind(other.to_string())),
        }
    }
}

// Stored as VARCHAR; decode through the string representation.
impl Type<Postgres> for ContentKind {
    fn type_info() -> PgTypeInfo {
        <str as Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <str as Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for ContentKind {
    fn decode(value: PgValueRef<'r>) -> Result<Self, BoxDynError> {
        let raw = <&str as Decode<Postgres>>::decode(value)?;
        Ok(raw.parse()?)
    }
}

/// Toggleable membership of a user on a piece of content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Reaction {
    Like,
    Dislike,
    Save,
}

impl Reaction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reaction::Like => "like",
            Reaction::Dislike => "dislike",
            Reaction::Save => "save",
        }
    }

    /// Reaction removed when this one is added
    pub fn opposite(&self) -> Option<Reaction> {
        match self {
            Reaction::Like => Some(Reaction::Dislike),
            Reaction::Dislike => Some(Reaction::Like),
            Reaction::Save => None,
        }
    }
}

/// Result of a reaction toggle
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ReactionSummary {
    /// Whether the caller holds the toggled reaction after the call
    pub active: bool,
    pub likes: i64,
    pub dislikes: i64,
    pub saves: i64,
}

// =====================================================================
// Users and channels
// =====================================================================

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub user_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub photo_url: Option<String>,
    #[serde(skip_serializing)]
    pub reset_otp_hash: Option<String>,
    #[serde(skip_serializing)]
    pub otp_expires_at: Option<DateTime<Utc>>,
    /// Wrong guesses against the pending OTP
    #[serde(skip_serializing)]
    pub otp_attempts: i32,
    #[serde(skip_serializing)]
    pub is_otp_verified: bool,
    #[serde(skip_serializing)]
    pub otp_verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// `GET /api/user/current` payload
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    #[serde(flatten)]
    pub user: User,
    pub channel_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Channel {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub name: String,
    pub description: String,
    pub category: String,
    pub avatar_url: Option<String>,
    pub banner_url: Option<String>,
    pub subscriber_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Channel page: the channel plus its content
#[derive(Debug, Clone, Serialize)]
pub struct ChannelDetail {
    #[serde(flatten)]
    pub channel: Channel,
    pub is_subscribed: bool,
    pub videos: Vec<MediaItem>,
    pub shorts: Vec<MediaItem>,
    pub playlists: Vec<Playlist>,
    pub posts: Vec<Post>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SubscriptionState {
    pub subscribed: bool,
    pub subscriber_count: i64,
}

// =====================================================================
// Content
// =====================================================================

/// A video or a short; `kind` tells them apart
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct MediaItem {
    pub id: Uuid,
    pub kind: ContentKind,
    pub channel_id: Uuid,
    pub channel_name: String,
    pub channel_avatar_url: Option<String>,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub media_url: String,
    pub thumbnail_url: Option<String>,
    pub duration_secs: Option<f64>,
    pub views: i64,
    pub like_count: i64,
    pub dislike_count: i64,
    pub save_count: i64,
    pub created_at: DateTime<Utc>,
}

pub type Video = MediaItem;
pub type Short = MediaItem;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Playlist {
    pub id: Uuid,
    pub channel_id: Uuid,
    pub title: String,
    pub description: String,
    pub video_count: i64,
    pub save_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaylistDetail {
    #[serde(flatten)]
    pub playlist: Playlist,
    pub videos: Vec<MediaItem>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub channel_id: Uuid,
    pub channel_name: String,
    pub channel_avatar_url: Option<String>,
    pub content: String,
    pub image_url: Option<String>,
    pub like_count: i64,
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub content_kind: ContentKind,
    pub content_id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub author_photo_url: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[sqlx(skip)]
    pub replies: Vec<Reply>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Reply {
    pub id: Uuid,
    pub comment_id: Uuid,
    pub author_id: Uuid,
    pub author_name: String,
    pub author_photo_url: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct HistoryEntry {
    pub content_kind: ContentKind,
    pub content_id: Uuid,
    pub watched_at: DateTime<Utc>,
}

/// History resolved to the watched items, newest first
#[derive(Debug, Clone, Serialize)]
pub struct WatchedItem {
    pub watched_at: DateTime<Utc>,
    #[serde(flatten)]
    pub item: MediaItem,
}

/// Videos/shorts/playlists grouped for the library pages
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContentCollection {
    pub videos: Vec<MediaItem>,
    pub shorts: Vec<MediaItem>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub playlists: Vec<Playlist>,
}

/// Feed for `GET /api/user/subscribed`
#[derive(Debug, Clone, Default, Serialize)]
pub struct SubscribedContent {
    pub channels: Vec<Channel>,
    pub videos: Vec<MediaItem>,
    pub shorts: Vec<MediaItem>,
    pub playlists: Vec<Playlist>,
    pub posts: Vec<Post>,
}
