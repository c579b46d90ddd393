/// Generative-AI client (Gemini `generateContent`)
use crate::config::AiConfig;
use crate::error::{AppError, Result};
use crate::metrics;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Whether calls can succeed at all; callers skip straight to their
    /// local fallback when this is `false`
    fn is_enabled(&self) -> bool {
        true
    }

    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Used when no API key is configured
pub struct DisabledModel;

#[async_trait]
impl LanguageModel for DisabledModel {
    fn is_enabled(&self) -> bool {
        false
    }

    async fn generate(&self, _prompt: &str) -> Result<String> {
        Err(AppError::Upstream("AI model is not configured".to_string()))
    }
}

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

impl GeminiClient {
    pub fn new(api_key: String, config: &AiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build AI client: {}", e)))?;
        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl LanguageModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "contents": [{
                "parts": [{"text": prompt}]
            }],
            "generationConfig": {
                "temperature": 0.2,
                "maxOutputTokens": 64
            }
        });

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                metrics::AI_REQUESTS.with_label_values(&["error"]).inc();
                AppError::Upstream(format!("Gemini request failed: {}", e))
            })?;

        if !response.status().is_success() {
            metrics::AI_REQUESTS.with_label_values(&["error"]).inc();
            return Err(AppError::Upstream(format!(
                "Gemini API error: {}",
                response.status()
            )));
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse Gemini response: {}", e)))?;

        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::Upstream("Empty Gemini response".to_string()))?;

        metrics::AI_REQUESTS.with_label_values(&["ok"]).inc();
        Ok(text)
    }
}

/// Pick the client for the configured key
pub fn from_config(config: &AiConfig) -> Result<std::sync::Arc<dyn LanguageModel>> {
    match &config.api_key {
        Some(key) => Ok(std::sync::Arc::new(GeminiClient::new(key.clone(), config)?)),
        None => {
            tracing::warn!("GEMINI_API_KEY not set; AI search will use local fallbacks");
            Ok(std::sync::Arc::new(DisabledModel))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_key: Option<&str>) -> AiConfig {
        AiConfig {
            api_key: api_key.map(str::to_string),
            model: "gemini-1.5-flash".into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta/".into(),
            request_timeout_secs: 5,
        }
    }

    #[test]
    fn endpoint_includes_model() {
        let client = GeminiClient::new("k".into(), &config(Some("k"))).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn missing_key_selects_disabled_model() {
        let model = from_config(&config(None)).unwrap();
        assert!(!model.is_enabled());
        let model = from_config(&config(Some("k"))).unwrap();
        assert!(model.is_enabled());
    }

    #[test]
    fn response_text_is_extracted() {
        let parsed: GeminiResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":" lofi beats \n"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.candidates[0].content.parts[0].text.trim(), "lofi beats");
    }
}
