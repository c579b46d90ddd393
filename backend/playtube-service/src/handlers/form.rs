/// Multipart form collection for upload endpoints
use crate::error::{AppError, Result};
use crate::services::media::{ensure_within_limit, UploadedFile};
use actix_multipart::Multipart;
use futures_util::stream::StreamExt;
use std::collections::HashMap;
use tracing::error;

/// Text fields larger than this are rejected
const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;
/// Parts per request, text and file together
const MAX_PARTS: usize = 16;

/// Buffered multipart form: text fields plus file parts by field name
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

/// Whole-request budget: every accepted file at its cap plus every part as
/// a maximal text field
fn total_budget(max_file_bytes: usize, file_fields: &[&str]) -> usize {
    max_file_bytes
        .saturating_mul(file_fields.len())
        .saturating_add(MAX_TEXT_FIELD_BYTES.saturating_mul(MAX_PARTS))
}

impl MultipartForm {
    /// Drain the payload. Only the named `file_fields` may carry a file,
    /// each at most once and at most `max_file_bytes` long.
    pub async fn collect(
        mut payload: Multipart,
        max_file_bytes: usize,
        file_fields: &[&str],
    ) -> Result<Self> {
        let mut form = MultipartForm::default();
        let budget = total_budget(max_file_bytes, file_fields);
        let mut total = 0usize;
        let mut parts = 0usize;

        while let Some(item) = payload.next().await {
            let mut field = item
                .map_err(|e| AppError::BadRequest(format!("malformed multipart body: {}", e)))?;

            parts += 1;
            if parts > MAX_PARTS {
                return Err(AppError::BadRequest(format!(
                    "too many form parts (at most {})",
                    MAX_PARTS
                )));
            }

            let name = field.name().unwrap_or_default().to_string();
            let file_name = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(str::to_string);
            let content_type = field.content_type().map(|m| m.to_string());

            let limit = if file_name.is_some() {
                if !file_fields.contains(&name.as_str()) {
                    return Err(AppError::BadRequest(format!(
                        "unexpected file field '{}'",
                        name
                    )));
                }
                if form.files.contains_key(&name) {
                    return Err(AppError::BadRequest(format!(
                        "file field '{}' sent more than once",
                        name
                    )));
                }
                max_file_bytes
            } else {
                MAX_TEXT_FIELD_BYTES
            };

            let mut bytes = Vec::new();
            while let Some(chunk) = field.next().await {
                let chunk = chunk.map_err(|e| {
                    error!("Error reading upload field: {}", e);
                    AppError::BadRequest(format!("failed to read field '{}'", name))
                })?;
                ensure_within_limit(bytes.len() + chunk.len(), limit)?;
                total += chunk.len();
                ensure_within_limit(total, budget)?;
                bytes.extend_from_slice(&chunk);
            }

            if name.is_empty() {
                continue;
            }

            match file_name {
                Some(file_name) if !bytes.is_empty() => {
                    form.files.insert(
                        name,
                        UploadedFile {
                            file_name,
                            content_type,
                            bytes,
                        },
                    );
                }
                // Browsers send an empty part for untouched file inputs
                Some(_) => {}
                None => {
                    let value = String::from_utf8(bytes).map_err(|_| {
                        AppError::BadRequest(format!("field '{}' is not valid UTF-8", name))
                    })?;
                    form.fields.insert(name, value);
                }
            }
        }

        Ok(form)
    }

    /// Trimmed, non-empty text field
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Text field exactly as sent
    pub fn raw(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn require_text(&self, name: &str) -> Result<&str> {
        self.text(name)
            .ok_or_else(|| AppError::ValidationError(format!("{} is required", name)))
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }

    pub fn require_file(&mut self, name: &str) -> Result<UploadedFile> {
        self.take_file(name)
            .ok_or_else(|| AppError::ValidationError(format!("{} file is required", name)))
    }

    /// Tags as a JSON array (`["a","b"]`) or a comma-separated list
    pub fn tags(&self, name: &str) -> Vec<String> {
        self.text(name).map(parse_tags).unwrap_or_default()
    }

    #[cfg(test)]
    pub(crate) fn from_parts(fields: &[(&str, &str)], files: Vec<(&str, UploadedFile)>) -> Self {
        Self {
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            files: files
                .into_iter()
                .map(|(k, f)| (k.to_string(), f))
                .collect(),
        }
    }
}

pub fn parse_tags(raw: &str) -> Vec<String> {
    let items: Vec<String> = match serde_json::from_str::<Vec<String>>(raw) {
        Ok(list) => list,
        Err(_) => raw.split(',').map(str::to_string).collect(),
    };

    let mut tags: Vec<String> = Vec::new();
    for tag in items {
        let tag = tag.trim().trim_start_matches('#').trim().to_string();
        if !tag.is_empty() && !tags.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
            tags.push(tag);
        }
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_covers_every_allowed_file() {
        let one = total_budget(1000, &["photo"]);
        let two = total_budget(1000, &["video", "thumbnail"]);
        assert_eq!(two - one, 1000);
        assert_eq!(total_budget(usize::MAX, &["a", "b"]), usize::MAX);
    }

    #[test]
    fn tags_accept_json_or_csv() {
        assert_eq!(parse_tags(r#"["rust", "async"]"#), vec!["rust", "async"]);
        assert_eq!(parse_tags("rust, #async ,, Rust"), vec!["rust", "async"]);
        assert!(parse_tags("  ").is_empty());
    }

    #[test]
    fn text_fields_are_trimmed() {
        let form = MultipartForm::from_parts(&[("title", "  hello "), ("blank", "   ")], vec![]);
        assert_eq!(form.text("title"), Some("hello"));
        assert_eq!(form.text("blank"), None);
        assert!(form.require_text("missing").is_err());
    }

    #[test]
    fn files_are_taken_once() {
        let file = UploadedFile {
            file_name: "a.mp4".into(),
            content_type: Some("video/mp4".into()),
            bytes: vec![1, 2, 3],
        };
        let mut form = MultipartForm::from_parts(&[], vec![("video", file)]);
        assert!(form.require_file("video").is_ok());
        assert!(form.take_file("video").is_none());
    }
}
