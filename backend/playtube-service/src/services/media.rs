/// Uploads proxied to the hosted media service
///
/// The service speaks the Cloudinary upload API: a multipart POST to
/// `{base}/{cloud}/{image|video}/upload` signed with
/// `sha1("timestamp=<unix>" + api_secret)`.
use crate::config::MediaConfig;
use crate::error::{AppError, Result};
use crate::metrics;
use async_trait::async_trait;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::time::Duration;
use tracing::{debug, warn};

/// Which upload endpoint a file goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Image,
    Video,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Image => "image",
            ResourceKind::Video => "video",
        }
    }
}

/// A file received from a multipart form
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

/// Stored asset as reported by the media host
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedAsset {
    pub url: String,
    pub public_id: String,
    /// Present for video uploads
    pub duration_secs: Option<f64>,
}

#[async_trait]
pub trait MediaStorage: Send + Sync {
    async fn upload(&self, file: UploadedFile, kind: ResourceKind) -> Result<UploadedAsset>;
}

/// Reject files above `max_bytes` before anything is sent upstream
pub fn ensure_within_limit(size: usize, max_bytes: usize) -> Result<()> {
    if size > max_bytes {
        return Err(AppError::PayloadTooLarge(format!(
            "file is {} bytes, limit is {} bytes",
            size, max_bytes
        )));
    }
    Ok(())
}

/// Hex SHA-1 signature over the signed parameters plus the API secret
pub fn sign_upload(timestamp: i64, api_secret: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(format!("timestamp={}{}", timestamp, api_secret).as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    url: Option<String>,
    public_id: String,
    duration: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct UploadErrorBody {
    error: UploadErrorMessage,
}

#[derive(Debug, Deserialize)]
struct UploadErrorMessage {
    message: String,
}

pub struct CloudinaryStorage {
    client: reqwest::Client,
    config: MediaConfig,
}

impl CloudinaryStorage {
    pub fn new(config: MediaConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build media client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn upload_url(&self, kind: ResourceKind) -> String {
        format!(
            "{}/{}/{}/upload",
            self.config.upload_base_url.trim_end_matches('/'),
            self.config.cloud_name,
            kind.as_str()
        )
    }
}

#[async_trait]
impl MediaStorage for CloudinaryStorage {
    async fn upload(&self, file: UploadedFile, kind: ResourceKind) -> Result<UploadedAsset> {
        ensure_within_limit(file.bytes.len(), self.config.max_upload_bytes)?;

        if self.config.cloud_name.is_empty() || self.config.api_secret.is_empty() {
            return Err(AppError::Upstream(
                "media storage is not configured".to_string(),
            ));
        }

        let timestamp = chrono::Utc::now().timestamp();
        let size = file.bytes.len();
        let mut part = reqwest::multipart::Part::bytes(file.bytes).file_name(file.file_name);
        if let Some(content_type) = file.content_type.as_deref() {
            part = part
                .mime_str(content_type)
                .map_err(|e| AppError::BadRequest(format!("invalid content type: {}", e)))?;
        }

        let form = reqwest::multipart::Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("timestamp", timestamp.to_string())
            .text("signature", sign_upload(timestamp, &self.config.api_secret))
            .part("file", part);

        debug!(kind = kind.as_str(), size, "uploading to media host");
        let timer = metrics::MEDIA_UPLOAD_DURATION
            .with_label_values(&[kind.as_str()])
            .start_timer();

        let response = self
            .client
            .post(self.upload_url(kind))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                metrics::MEDIA_UPLOADS.with_label_values(&[kind.as_str(), "error"]).inc();
                AppError::Upstream(format!("media upload failed: {}", e))
            })?;
        timer.observe_duration();

        let status = response.status();
        if !status.is_success() {
            metrics::MEDIA_UPLOADS.with_label_values(&[kind.as_str(), "error"]).inc();
            let message = response
                .json::<UploadErrorBody>()
                .await
                .map(|body| body.error.message)
                .unwrap_or_else(|_| status.to_string());
            warn!(status = %status, %message, "media host rejected upload");
            return Err(AppError::Upstream(format!("media upload rejected: {}", message)));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("invalid media host response: {}", e)))?;

        let url = body
            .secure_url
            .or(body.url)
            .ok_or_else(|| AppError::Upstream("media host returned no URL".to_string()))?;

        metrics::MEDIA_UPLOADS.with_label_values(&[kind.as_str(), "ok"]).inc();
        Ok(UploadedAsset {
            url,
            public_id: body.public_id,
            duration_secs: body.duration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_sha1_of_timestamp_and_secret() {
        // sha1("timestamp=1315060510abcd")
        assert_eq!(
            sign_upload(1315060510, "abcd"),
            hex::encode(Sha1::digest(b"timestamp=1315060510abcd"))
        );
        assert_eq!(sign_upload(1, "s").len(), 40);
    }

    #[test]
    fn oversize_files_are_rejected() {
        assert!(ensure_within_limit(10, 10).is_ok());
        assert!(matches!(
            ensure_within_limit(11, 10),
            Err(AppError::PayloadTooLarge(_))
        ));
    }

    #[test]
    fn upload_url_uses_resource_kind() {
        let storage = CloudinaryStorage::new(MediaConfig {
            cloud_name: "demo".into(),
            api_key: "key".into(),
            api_secret: "secret".into(),
            upload_base_url: "https://api.cloudinary.com/v1_1/".into(),
            max_upload_bytes: 1024,
            request_timeout_secs: 5,
        })
        .unwrap();
        assert_eq!(
            storage.upload_url(ResourceKind::Video),
            "https://api.cloudinary.com/v1_1/demo/video/upload"
        );
    }

    #[actix_rt::test]
    async fn unconfigured_storage_fails_upstream() {
        let storage = CloudinaryStorage::new(MediaConfig {
            cloud_name: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            upload_base_url: "http://127.0.0.1:9".into(),
            max_upload_bytes: 1024,
            request_timeout_secs: 1,
        })
        .unwrap();
        let file = UploadedFile {
            file_name: "a.png".into(),
            content_type: Some("image/png".into()),
            bytes: vec![0; 8],
        };
        assert!(matches!(
            storage.upload(file, ResourceKind::Image).await,
            Err(AppError::Upstream(_))
        ));
    }
}
