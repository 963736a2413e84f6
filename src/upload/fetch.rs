//! Downloading remote sources to a temporary file.
//!
//! Two provider quirks are handled here:
//! - share pages (an HTML page embedding the real media URL) are scraped for
//!   the first direct `.gif`/`.mp4` link before downloading;
//! - some CDNs serve images without an extension in the path, so the
//!   extension is taken from a `HEAD` request's `Content-Type` instead.

use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio::io::AsyncWriteExt;
use url::Url;

use super::extension;
use super::temp::TempSlot;
use super::types::{ResolvedArtifact, UploadError};

/// Timeout applied to every HTTP request.
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Hosts whose URLs point at an HTML page rather than the media itself.
const SHARE_PAGE_HOSTS: &[&str] = &["tenor.com", "www.tenor.com"];

/// Hosts that serve images from extension-less paths.
const EXTENSIONLESS_HOSTS: &[&str] = &[
    "pbs.twimg.com",
    "images.unsplash.com",
    "lh3.googleusercontent.com",
];

static SHARE_PAGE_MEDIA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https://media[0-9]*\.tenor\.com/[^"'\s<>\\]+?\.(?:gif|mp4)"#)
        .expect("share-page media pattern is valid")
});

/// Minimal HTTP surface needed by [`fetch`].
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET `url` and return the body as text.
    async fn get_text(&self, url: &str) -> Result<String, String>;
    /// HEAD `url` and return its `Content-Type`, if any.
    async fn content_type(&self, url: &str) -> Result<Option<String>, String>;
    /// GET `url` and stream the body into `dest`; returns bytes written.
    async fn download(&self, url: &str, dest: &Path) -> Result<u64, String>;
}

/// Default [`HttpClient`] backed by reqwest.
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(concat!("wayshare/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, String> {
        self.client
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| format!("GET {} failed: {}", url, e))
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get_text(&self, url: &str) -> Result<String, String> {
        self.get(url)
            .await?
            .text()
            .await
            .map_err(|e| format!("failed to read body of {}: {}", url, e))
    }

    async fn content_type(&self, url: &str) -> Result<Option<String>, String> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| format!("HEAD {} failed: {}", url, e))?;

        Ok(response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string))
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64, String> {
        let mut response = self.get(url).await?;
        // `dest` was created exclusively by the temp slot; never create it here.
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(dest)
            .await
            .map_err(|e| format!("failed to create {}: {}", dest.display(), e))?;

        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| format!("download of {} interrupted: {}", url, e))?
        {
            file.write_all(&chunk)
                .await
                .map_err(|e| format!("failed to write {}: {}", dest.display(), e))?;
            written += chunk.len() as u64;
        }
        file.flush()
            .await
            .map_err(|e| format!("failed to flush {}: {}", dest.display(), e))?;

        Ok(written)
    }
}

/// Downloads `url` into a fresh temporary file owned by `temp`.
pub async fn fetch(
    url: &str,
    http: &dyn HttpClient,
    temp: &mut TempSlot,
) -> Result<ResolvedArtifact, UploadError> {
    let parsed = Url::parse(url)
        .map_err(|e| UploadError::DownloadFailed(format!("invalid URL {}: {}", url, e)))?;

    let parsed = if is_share_page(&parsed) {
        log::info!("Extracting media from share page {}", url);
        let page = http.get_text(url).await.map_err(UploadError::DownloadFailed)?;
        let media = extract_media_url(&page).ok_or_else(|| {
            UploadError::DownloadFailed(format!("no media link found on share page {}", url))
        })?;
        log::debug!("Share page media URL: {}", media);
        Url::parse(media)
            .map_err(|e| UploadError::DownloadFailed(format!("invalid media URL {}: {}", media, e)))?
    } else {
        parsed
    };

    let extension = target_extension(&parsed, http).await;
    let dest = temp.allocate(extension.as_deref()).map_err(|e| {
        UploadError::DownloadFailed(format!("failed to create a temporary file: {}", e))
    })?;

    let written = http
        .download(parsed.as_str(), &dest)
        .await
        .map_err(UploadError::DownloadFailed)?;
    log::info!("Downloaded {} ({} bytes) to {}", parsed, written, dest.display());

    Ok(ResolvedArtifact::temporary(dest))
}

/// Extension for the downloaded file: from the URL's last path segment, or
/// from the `Content-Type` for hosts known to drop extensions.
async fn target_extension(url: &Url, http: &dyn HttpClient) -> Option<String> {
    let basename = url_basename(url);
    let from_name = extension::classify(&basename);
    if !from_name.is_empty() {
        return Some(from_name.to_string());
    }

    if !omits_extension(url) {
        return None;
    }

    match http.content_type(url.as_str()).await {
        // Types outside the fixed table keep their MIME subtype (`image/avif`
        // becomes `avif`) rather than falling straight back to `bin`.
        Ok(Some(content_type)) => Some(extension::for_unknown_content_type(&content_type)),
        Ok(None) => Some("bin".to_string()),
        Err(e) => {
            log::warn!("Could not determine content type of {}: {}", url, e);
            Some("bin".to_string())
        }
    }
}

/// Last non-empty path segment, ignoring the query string.
pub fn url_basename(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or_default()
        .to_string()
}

pub fn is_share_page(url: &Url) -> bool {
    url.host_str()
        .is_some_and(|host| SHARE_PAGE_HOSTS.contains(&host.to_ascii_lowercase().as_str()))
}

fn omits_extension(url: &Url) -> bool {
    url.host_str()
        .is_some_and(|host| EXTENSIONLESS_HOSTS.contains(&host.to_ascii_lowercase().as_str()))
}

/// First direct media link embedded in a share page.
pub fn extract_media_url(page: &str) -> Option<&str> {
    SHARE_PAGE_MEDIA.find(page).map(|m| m.as_str())
}
