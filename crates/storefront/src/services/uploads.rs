//! Product image uploads.
//!
//! Files are stored under a generated unique name at `{bucket}/{name}` inside
//! the bucket of the same name, so the public URL carries the bucket twice.

use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use rand::Rng;
use serde::Serialize;
use tracing::{error, info, instrument};

use crate::gateway::{StorageGateway, UploadOptions};

/// Bucket used when the caller does not name one.
pub const DEFAULT_BUCKET: &str = "product-images";

/// `Cache-Control: max-age` for uploaded images, in seconds.
const CACHE_CONTROL_SECS: u32 = 3600;

/// Length of the random part of a generated file name.
const RANDOM_SUFFIX_LEN: usize = 11;

/// Outcome of a single upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Object path inside the bucket, needed to remove the file later.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UploadResult {
    fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            url: None,
            path: None,
            error: Some(message.into()),
        }
    }
}

/// Image storage over a [`StorageGateway`].
#[derive(Clone)]
pub struct ImageUploads {
    storage: Arc<dyn StorageGateway>,
}

impl ImageUploads {
    #[must_use]
    pub fn new(storage: Arc<dyn StorageGateway>) -> Self {
        Self { storage }
    }

    /// Upload one file under a fresh unique name.
    #[instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn upload(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        bucket: Option<&str>,
    ) -> UploadResult {
        let bucket = bucket.unwrap_or(DEFAULT_BUCKET);
        let path = format!("{bucket}/{}", unique_file_name(file_name));
        let options = UploadOptions {
            content_type: content_type_for(file_name).to_string(),
            cache_control_secs: CACHE_CONTROL_SECS,
            upsert: false,
        };

        match self.storage.upload(bucket, &path, bytes, &options).await {
            Ok(()) => {
                let url = self.storage.public_url(bucket, &path);
                info!(path = %path, "Uploaded image");
                UploadResult {
                    success: true,
                    url: Some(url),
                    path: Some(path),
                    error: None,
                }
            }
            Err(e) => {
                error!(error = %e, "Failed to upload image");
                UploadResult::failed(e.to_string())
            }
        }
    }

    /// Upload several files concurrently. Results keep the input order.
    pub async fn upload_many(
        &self,
        files: Vec<(String, Vec<u8>)>,
        bucket: Option<&str>,
    ) -> Vec<UploadResult> {
        join_all(
            files
                .into_iter()
                .map(|(name, bytes)| async move { self.upload(&name, bytes, bucket).await }),
        )
        .await
    }

    /// Remove a stored file by its path inside the bucket.
    #[instrument(skip(self))]
    pub async fn remove(&self, path: &str, bucket: Option<&str>) -> bool {
        let bucket = bucket.unwrap_or(DEFAULT_BUCKET);
        match self.storage.remove(bucket, &[path.to_string()]).await {
            Ok(()) => true,
            Err(e) => {
                error!(error = %e, "Failed to remove image");
                false
            }
        }
    }

    /// Public URL of a stored file.
    #[must_use]
    pub fn public_url(&self, path: &str, bucket: Option<&str>) -> String {
        self.storage
            .public_url(bucket.unwrap_or(DEFAULT_BUCKET), path)
    }
}

/// `{millis}-{random base36}.{ext}` where `ext` is the text after the last
/// `.` of `original` (the whole name when it has no dot).
#[must_use]
pub fn unique_file_name(original: &str) -> String {
    let extension = original.rsplit('.').next().unwrap_or(original);
    let mut rng = rand::rng();
    let suffix: String = (0..RANDOM_SUFFIX_LEN)
        .filter_map(|_| char::from_digit(rng.random_range(0..36), 36))
        .collect();

    format!("{}-{suffix}.{extension}", Utc::now().timestamp_millis())
}

fn content_type_for(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("avif") => "image/avif",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::gateway::MemoryBackend;

    #[test]
    fn test_unique_file_name_shape() {
        let name = unique_file_name("vestido azul.JPG");
        let (stem, extension) = name.rsplit_once('.').unwrap();
        assert_eq!(extension, "JPG");

        let (millis, suffix) = stem.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), RANDOM_SUFFIX_LEN);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        );

        assert_ne!(unique_file_name("a.png"), unique_file_name("a.png"));
    }

    #[test]
    fn test_unique_file_name_without_dot_uses_whole_name() {
        assert!(unique_file_name("foto").ends_with(".foto"));
    }

    #[test]
    fn test_content_type() {
        assert_eq!(content_type_for("a.JPEG"), "image/jpeg");
        assert_eq!(content_type_for("a.webp"), "image/webp");
        assert_eq!(content_type_for("noext"), "application/octet-stream");
    }

    #[tokio::test]
    async fn test_upload_stores_under_bucket_prefix() {
        let backend = MemoryBackend::new();
        let uploads = ImageUploads::new(Arc::new(backend.clone()));

        let result = uploads.upload("saia.png", vec![1, 2, 3], None).await;
        assert!(result.success);
        let path = result.path.unwrap();
        assert!(path.starts_with("product-images/"));
        assert_eq!(
            result.url.as_deref(),
            Some(format!("memory://product-images/{path}").as_str())
        );

        let (bytes, content_type) = backend.object(DEFAULT_BUCKET, &path).unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
        assert_eq!(content_type, "image/png");

        assert!(uploads.remove(&path, None).await);
        assert!(backend.object(DEFAULT_BUCKET, &path).is_none());
    }

    #[tokio::test]
    async fn test_upload_many_keeps_order() {
        let uploads = ImageUploads::new(Arc::new(MemoryBackend::new()));
        let results = uploads
            .upload_many(
                vec![
                    ("a.png".to_string(), vec![1]),
                    ("b.jpg".to_string(), vec![2]),
                ],
                Some("banners"),
            )
            .await;

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.success));
        assert!(results[0].path.as_deref().unwrap().ends_with(".png"));
        assert!(results[1].path.as_deref().unwrap().starts_with("banners/"));
    }
}
