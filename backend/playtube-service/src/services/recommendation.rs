/// Keyword-based recommendations
///
/// Keywords are mined from everything the user watched, liked or saved.
/// Unseen videos and shorts matching those keywords are ranked first
/// (`recommended`); everything else the user has not watched follows,
/// newest first (`remaining`).
use crate::db::{self, history_repo, media_repo, reaction_repo};
use crate::error::Result;
use crate::models::{ContentKind, MediaItem, Reaction};
use serde::Serialize;
use sqlx::PgPool;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};
use uuid::Uuid;

pub const MAX_KEYWORDS: usize = 20;
const MIN_TOKEN_LEN: usize = 3;

const TAG_WEIGHT: u32 = 2;
const TITLE_WEIGHT: u32 = 2;
const DESCRIPTION_WEIGHT: u32 = 1;

const TITLE_HIT: u32 = 3;
const TAG_HIT: u32 = 2;
const DESCRIPTION_HIT: u32 = 1;

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "your", "all", "any", "can", "had", "her",
    "was", "one", "our", "out", "has", "have", "him", "his", "how", "its", "may", "new", "now",
    "old", "see", "two", "who", "did", "get", "got", "let", "say", "she", "too", "use", "this",
    "that", "with", "from", "they", "them", "then", "than", "there", "their", "what", "when",
    "where", "which", "while", "will", "would", "could", "should", "about", "into", "just",
    "like", "more", "most", "some", "such", "only", "over", "very", "also", "been", "being",
    "were", "here", "each", "other", "these", "those", "video", "videos", "short", "shorts",
    "watch", "channel", "subscribe",
];

#[derive(Debug, Clone, Default, Serialize)]
pub struct Recommendations {
    pub keywords: Vec<String>,
    pub recommended_videos: Vec<MediaItem>,
    pub recommended_shorts: Vec<MediaItem>,
    pub remaining_videos: Vec<MediaItem>,
    pub remaining_shorts: Vec<MediaItem>,
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= MIN_TOKEN_LEN)
        .map(|t| t.to_lowercase())
        .filter(|t| !t.chars().all(|c| c.is_numeric()))
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
}

/// Top keywords by weighted frequency; ties resolve alphabetically
pub fn extract_keywords<'a>(items: impl IntoIterator<Item = &'a MediaItem>) -> Vec<String> {
    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for item in items {
        for tag in &item.tags {
            for token in tokens(tag) {
                *counts.entry(token).or_default() += TAG_WEIGHT;
            }
        }
        for token in tokens(&item.title) {
            *counts.entry(token).or_default() += TITLE_WEIGHT;
        }
        for token in tokens(&item.description) {
            *counts.entry(token).or_default() += DESCRIPTION_WEIGHT;
        }
    }

    let mut ranked: Vec<(String, u32)> = counts.into_iter().collect();
    // BTreeMap order is alphabetical and sort_by is stable
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
        .into_iter()
        .take(MAX_KEYWORDS)
        .map(|(keyword, _)| keyword)
        .collect()
}

/// Relevance of `item` to the keywords
pub fn score(item: &MediaItem, keywords: &[String]) -> u32 {
    let title = item.title.to_lowercase();
    let description = item.description.to_lowercase();
    let tags: Vec<String> = item.tags.iter().map(|t| t.to_lowercase()).collect();

    keywords
        .iter()
        .map(|kw| {
            let mut points = 0;
            if title.contains(kw.as_str()) {
                points += TITLE_HIT;
            }
            if tags.iter().any(|t| t.contains(kw.as_str())) {
                points += TAG_HIT;
            }
            if description.contains(kw.as_str()) {
                points += DESCRIPTION_HIT;
            }
            points
        })
        .sum()
}

/// Drop non-matching candidates and order by score, then newest
pub fn rank(candidates: Vec<MediaItem>, keywords: &[String]) -> Vec<MediaItem> {
    let mut scored: Vec<(u32, MediaItem)> = candidates
        .into_iter()
        .map(|item| (score(&item, keywords), item))
        .filter(|(s, _)| *s > 0)
        .collect();
    scored.sort_by_key(|(s, item)| (Reverse(*s), Reverse(item.created_at)));
    scored.into_iter().map(|(_, item)| item).collect()
}

/// Ids the user has interacted with, per media kind
struct Signals {
    watched: Vec<Uuid>,
    excluded: Vec<Uuid>,
    documents: Vec<MediaItem>,
}

async fn load_signals(pool: &PgPool, user_id: Uuid, kind: ContentKind) -> Result<Signals> {
    let watched = history_repo::watched_ids(pool, user_id, kind).await?;
    let liked = reaction_repo::content_ids_for_user(pool, user_id, kind, Reaction::Like).await?;
    let saved = reaction_repo::content_ids_for_user(pool, user_id, kind, Reaction::Save).await?;

    let mut seen = HashSet::new();
    let excluded: Vec<Uuid> = watched
        .iter()
        .chain(liked.iter())
        .chain(saved.iter())
        .copied()
        .filter(|id| seen.insert(*id))
        .collect();

    let documents = media_repo::find_by_ids(pool, kind, &excluded).await?;
    Ok(Signals {
        watched,
        excluded,
        documents,
    })
}

async fn split_kind(
    pool: &PgPool,
    kind: ContentKind,
    signals: &Signals,
    keywords: &[String],
) -> Result<(Vec<MediaItem>, Vec<MediaItem>)> {
    let patterns = db::contains_patterns(keywords);
    let candidates =
        media_repo::recommendation_candidates(pool, kind, &signals.excluded, &patterns).await?;
    let recommended = rank(candidates, keywords);

    let mut hidden: Vec<Uuid> = recommended.iter().map(|item| item.id).collect();
    hidden.extend(signals.watched.iter().copied());
    let remaining = media_repo::list_excluding(pool, kind, &hidden).await?;

    Ok((recommended, remaining))
}

/// Build the recommendation feed for a user
pub async fn recommend_for(pool: &PgPool, user_id: Uuid) -> Result<Recommendations> {
    let videos = load_signals(pool, user_id, ContentKind::Video).await?;
    let shorts = load_signals(pool, user_id, ContentKind::Short).await?;

    let keywords = extract_keywords(videos.documents.iter().chain(shorts.documents.iter()));
    tracing::debug!(%user_id, keywords = keywords.len(), "computing recommendations");

    let (recommended_videos, remaining_videos) =
        split_kind(pool, ContentKind::Video, &videos, &keywords).await?;
    let (recommended_shorts, remaining_shorts) =
        split_kind(pool, ContentKind::Short, &shorts, &keywords).await?;

    Ok(Recommendations {
        keywords,
        recommended_videos,
        recommended_shorts,
        remaining_videos,
        remaining_shorts,
    })
}
