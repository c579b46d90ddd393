/// Database access layer
///
/// Repositories are plain async functions over a `PgPool`, one module per
/// aggregate. Counters (likes, subscribers, ...) are computed in SQL at read
/// time from the link tables.
pub mod channel_repo;
pub mod comment_repo;
pub mod history_repo;
pub mod media_repo;
pub mod playlist_repo;
pub mod post_repo;
pub mod reaction_repo;
pub mod user_repo;

/// Escape `%`, `_` and `\` so user input matches literally inside ILIKE
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// `%keyword%` patterns for `ILIKE ANY($n)`
pub fn contains_patterns<S: AsRef<str>>(keywords: &[S]) -> Vec<String> {
    keywords
        .iter()
        .map(|kw| kw.as_ref().trim())
        .filter(|kw| !kw.is_empty())
        .map(|kw| format!("%{}%", escape_like(kw)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_like_metacharacters() {
        assert_eq!(escape_like("100%_off\\"), "100\\%\\_off\\\\");
        assert_eq!(escape_like("rust"), "rust");
    }

    #[test]
    fn patterns_skip_blank_keywords() {
        let patterns = contains_patterns(&["rust", "  ", "50%"]);
        assert_eq!(patterns, vec!["%rust%".to_string(), "%50\\%%".to_string()]);
    }
}
