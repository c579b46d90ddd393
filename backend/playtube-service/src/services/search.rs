/// AI-assisted search and category filtering
///
/// The model only rewrites the user's input (spelling fix or category
/// pick); the actual lookup is always a pattern query over the database,
/// so search keeps working when the model is down or unconfigured.
use crate::db::{self, channel_repo, media_repo, playlist_repo};
use crate::error::Result;
use crate::metrics;
use crate::models::{Channel, ContentKind, MediaItem, Playlist};
use crate::services::ai::LanguageModel;
use serde::Serialize;
use sqlx::PgPool;
use tracing::warn;

pub const CATEGORIES: &[&str] = &[
    "Music",
    "Gaming",
    "Movies",
    "TV Shows",
    "News",
    "Trending",
    "Entertainment",
    "Education",
    "Science & Tech",
    "Travel",
    "Fashion",
    "Cooking",
    "Sports",
    "Pets",
    "Art",
    "Comedy",
    "Vlogs",
];

const MAX_QUERY_CHARS: usize = 200;

#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
    pub keyword: String,
    pub channels: Vec<Channel>,
    pub videos: Vec<MediaItem>,
    pub shorts: Vec<MediaItem>,
    pub playlists: Vec<Playlist>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryResults {
    pub category: String,
    pub channels: Vec<Channel>,
    pub videos: Vec<MediaItem>,
    pub shorts: Vec<MediaItem>,
}

pub fn search_prompt(input: &str) -> String {
    format!(
        "You are the search assistant of a video sharing site. The user typed: \"{input}\".\n\
         Fix any spelling mistakes and reply with the single best search keyword or short \
         phrase. Reply with the keyword only, no quotes and no explanation."
    )
}

pub fn category_prompt(input: &str) -> String {
    format!(
        "Classify the following text into exactly one of these categories: {}.\n\
         Text: \"{input}\"\n\
         Reply with the category name only.",
        CATEGORIES.join(", ")
    )
}

/// First line of a model reply, without quotes or trailing punctuation
pub fn clean_reply(reply: &str) -> String {
    reply
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("")
        .trim_matches(|c: char| matches!(c, '"' | '\'' | '`' | '*' | '.' | ':') || c.is_whitespace())
        .to_string()
}

/// Map free text onto one of `CATEGORIES`, case-insensitively
pub fn match_category(text: &str) -> Option<&'static str> {
    let needle = text.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    if let Some(exact) = CATEGORIES.iter().copied().find(|c| c.to_lowercase() == needle) {
        return Some(exact);
    }

    // "best gaming setups" -> Gaming: first category named in the text wins
    if let Some(named) = CATEGORIES.iter().copied().find(|c| {
        c.to_lowercase()
            .split(|ch: char| !ch.is_alphanumeric())
            .filter(|w| w.len() >= 3)
            .any(|w| contains_word(&needle, w))
    }) {
        return Some(named);
    }

    let aliases: &[(&str, &str)] = &[
        ("song", "Music"),
        ("game", "Gaming"),
        ("film", "Movies"),
        ("movie", "Movies"),
        ("series", "TV Shows"),
        ("tv", "TV Shows"),
        ("science", "Science & Tech"),
        ("tech", "Science & Tech"),
        ("coding", "Science & Tech"),
        ("programming", "Science & Tech"),
        ("recipe", "Cooking"),
        ("food", "Cooking"),
        ("football", "Sports"),
        ("cat", "Pets"),
        ("dog", "Pets"),
        ("funny", "Comedy"),
        ("tutorial", "Education"),
        ("vlog", "Vlogs"),
        ("trip", "Travel"),
        ("style", "Fashion"),
    ];
    aliases
        .iter()
        .find(|(alias, _)| contains_word(&needle, alias) || contains_word(&needle, &format!("{alias}s")))
        .map(|(_, category)| *category)
}

fn contains_word(haystack: &str, word: &str) -> bool {
    haystack
        .split(|ch: char| !ch.is_alphanumeric())
        .any(|w| w == word)
}

fn truncate_query(input: &str) -> String {
    input.trim().chars().take(MAX_QUERY_CHARS).collect()
}

/// Ask the model for a corrected keyword; fall back to the trimmed input
pub async fn resolve_keyword(model: &dyn LanguageModel, input: &str) -> String {
    let input = truncate_query(input);
    if !model.is_enabled() {
        return input;
    }

    match model.generate(&search_prompt(&input)).await {
        Ok(reply) => {
            let keyword = clean_reply(&reply);
            if keyword.is_empty() {
                input
            } else {
                keyword
            }
        }
        Err(e) => {
            warn!(error = %e, "AI keyword correction failed; using raw input");
            metrics::AI_FALLBACKS.with_label_values(&["search"]).inc();
            input
        }
    }
}

/// Ask the model to classify the input; fall back to local matching
pub async fn resolve_category(model: &dyn LanguageModel, input: &str) -> Option<&'static str> {
    let input = truncate_query(input);
    if model.is_enabled() {
        match model.generate(&category_prompt(&input)).await {
            Ok(reply) => {
                if let Some(category) = match_category(&clean_reply(&reply)) {
                    return Some(category);
                }
                warn!(reply = %reply, "AI returned an unknown category");
            }
            Err(e) => warn!(error = %e, "AI classification failed; matching locally"),
        }
        metrics::AI_FALLBACKS.with_label_values(&["category"]).inc();
    }
    match_category(&input)
}

/// Pattern search for the keyword and each of its words
pub fn keyword_patterns(keyword: &str) -> Vec<String> {
    let mut terms = vec![keyword.trim().to_string()];
    terms.extend(
        keyword
            .split_whitespace()
            .filter(|w| w.chars().count() >= 3)
            .map(|w| w.to_string()),
    );
    terms.sort();
    terms.dedup();
    db::contains_patterns(&terms)
}

pub async fn search_all(pool: &PgPool, keyword: &str) -> Result<SearchResults> {
    let patterns = keyword_patterns(keyword);
    Ok(SearchResults {
        keyword: keyword.to_string(),
        channels: channel_repo::search_by_name(pool, &patterns).await?,
        videos: media_repo::search(pool, ContentKind::Video, &patterns).await?,
        shorts: media_repo::search(pool, ContentKind::Short, &patterns).await?,
        playlists: playlist_repo::search_by_title(pool, &patterns).await?,
    })
}

pub async fn category_content(pool: &PgPool, category: &str) -> Result<CategoryResults> {
    Ok(CategoryResults {
        category: category.to_string(),
        channels: channel_repo::list_by_category(pool, category).await?,
        videos: media_repo::list_for_category(pool, ContentKind::Video, category).await?,
        shorts: media_repo::list_for_category(pool, ContentKind::Short, category).await?,
    })
}
