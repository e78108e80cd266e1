//! Uploads to a public object-storage bucket (Supabase Storage REST API).

use std::time::{SystemTime, UNIX_EPOCH};

use rand::{distributions::Alphanumeric, Rng};
use reqwest::{header, Client, StatusCode};

use crate::config::StorageConfig;
use crate::error::{AppError, AppResult};

pub const MAX_IMAGE_BYTES: usize = 2 * 1024 * 1024;
pub const DEFAULT_FOLDER: &str = "icons";

#[derive(Clone)]
pub struct ObjectStorage {
    http: Client,
    config: StorageConfig,
}

impl ObjectStorage {
    pub fn new(http: Client, config: StorageConfig) -> Self {
        Self { http, config }
    }

    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.base_url, self.config.bucket, path
        )
    }

    /// Path of an object inside this bucket, given its public URL. URLs on
    /// another host or bucket yield `None`.
    pub fn path_from_url<'a>(&self, url: &'a str) -> Option<&'a str> {
        url.strip_prefix(&self.public_url(""))
            .map(|path| path.split(['?', '#']).next().unwrap_or_default())
            .filter(|path| !path.is_empty())
    }

    /// Store an image and return its public URL. Existing objects are never overwritten.
    pub async fn upload_image(
        &self,
        folder: &str,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> AppResult<String> {
        validate_image(content_type, bytes.len())?;

        let path = object_path(folder, file_name);
        let url = format!(
            "{}/storage/v1/object/{}/{}",
            self.config.base_url, self.config.bucket, path
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.service_key)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CACHE_CONTROL, "max-age=3600")
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("upload request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Storage(format!("upload rejected ({}): {}", status, body)));
        }

        tracing::info!(path = %path, "Uploaded image");
        Ok(self.public_url(&path))
    }

    /// Remove an object by its public URL. URLs outside the bucket are ignored
    /// and storage failures are only logged.
    pub async fn delete_by_url(&self, url: &str) {
        let Some(path) = self.path_from_url(url) else {
            tracing::debug!(url = %url, "Not a bucket URL, nothing to delete");
            return;
        };

        let endpoint = format!("{}/storage/v1/object/{}", self.config.base_url, self.config.bucket);
        let result = self
            .http
            .delete(&endpoint)
            .bearer_auth(&self.config.service_key)
            .json(&serde_json::json!({ "prefixes": [path] }))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                tracing::info!(path = %path, "Deleted image");
            }
            Ok(response) if response.status() == StatusCode::NOT_FOUND => {
                tracing::debug!(path = %path, "Image already gone");
            }
            Ok(response) => {
                tracing::warn!(path = %path, status = %response.status(), "Failed to delete image");
            }
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "Failed to delete image");
            }
        }
    }
}

pub fn validate_image(content_type: &str, len: usize) -> AppResult<()> {
    if !content_type.starts_with("image/") {
        return Err(AppError::BadRequest("Only image files can be uploaded".to_string()));
    }
    if len == 0 {
        return Err(AppError::BadRequest("Empty file".to_string()));
    }
    if len > MAX_IMAGE_BYTES {
        return Err(AppError::BadRequest("Images must be 2MB or smaller".to_string()));
    }
    Ok(())
}

/// `{folder}/{millis}-{random}.{ext}`; the extension comes from the original file name.
pub fn object_path(folder: &str, file_name: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(10)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();

    let folder = sanitize_segment(folder);
    let folder = if folder.is_empty() { DEFAULT_FOLDER.to_string() } else { folder };

    match file_name.rsplit_once('.').map(|(_, ext)| sanitize_segment(ext)) {
        Some(ext) if !ext.is_empty() => format!("{}/{}-{}.{}", folder, millis, suffix, ext.to_ascii_lowercase()),
        _ => format!("{}/{}-{}", folder, millis, suffix),
    }
}

fn sanitize_segment(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}
