// HTTP client for the external download service
//
// One request/response exchange per operation, no retries, no caching.
// Non-2xx responses surface the service's `detail` message when the body
// carries one, else a generic transport message.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::errors::DownloadError;
use super::models::{ClientConfig, ProgressSnapshot, RemoteFile, VideoMetadata};
use super::traits::JobService;

#[derive(Debug, Serialize)]
struct ExtractRequest<'a> {
    url: &'a str,
}

#[derive(Debug, Serialize)]
struct DownloadRequest<'a> {
    url: &'a str,
    format_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct DownloadResponse {
    download_id: String,
}

#[derive(Debug, Deserialize)]
struct ServiceDetail {
    detail: Option<String>,
}

pub struct JobClient {
    http: reqwest::Client,
    base_url: reqwest::Url,
}

impl JobClient {
    pub fn new(config: &ClientConfig) -> Result<Self, DownloadError> {
        let mut builder =
            reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_seconds));

        if let Some(proxy_url) = config.proxy.as_deref() {
            let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
                DownloadError::Transport(format!("Invalid proxy URL {}: {}", proxy_url, e))
            })?;
            builder = builder.proxy(proxy);
        }

        let http = builder
            .build()
            .map_err(|e| DownloadError::Transport(e.to_string()))?;
        let base_url = reqwest::Url::parse(&config.base_url).map_err(|e| {
            DownloadError::Transport(format!("Invalid base URL {}: {}", config.base_url, e))
        })?;

        Ok(Self { http, base_url })
    }

    /// Build an endpoint URL; each segment is percent-encoded, so raw
    /// filenames are safe to pass.
    fn endpoint(&self, segments: &[&str]) -> Result<reqwest::Url, DownloadError> {
        let mut url = self.base_url.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| {
                DownloadError::Transport(format!(
                    "Base URL {} cannot carry a path",
                    self.base_url
                ))
            })?;
            path.pop_if_empty();
            for segment in segments {
                path.push(segment);
            }
        }
        Ok(url)
    }

    /// Pull the `{detail}` message out of a non-2xx response body.
    async fn error_detail(response: reqwest::Response) -> Option<String> {
        let text = response.text().await.ok()?;
        serde_json::from_str::<ServiceDetail>(&text)
            .ok()
            .and_then(|body| body.detail)
    }
}

#[async_trait]
impl JobService for JobClient {
    async fn extract(&self, url: &str) -> Result<VideoMetadata, DownloadError> {
        let endpoint = self.endpoint(&["extract_info"])?;
        tracing::debug!(%url, "requesting extraction");

        let response = self
            .http
            .post(endpoint)
            .json(&ExtractRequest { url })
            .send()
            .await?;
        if !response.status().is_success() {
            let detail = Self::error_detail(response).await;
            return Err(DownloadError::Extraction(
                detail.unwrap_or_else(|| "Failed to extract video info".to_string()),
            ));
        }

        let metadata = response.json::<VideoMetadata>().await?;
        tracing::debug!(
            title = %metadata.title,
            formats = metadata.formats.len(),
            "extraction succeeded"
        );
        Ok(metadata)
    }

    async fn start_download(
        &self,
        url: &str,
        format_id: &str,
    ) -> Result<String, DownloadError> {
        let endpoint = self.endpoint(&["download"])?;
        tracing::debug!(%url, format_id, "starting download");

        let response = self
            .http
            .post(endpoint)
            .json(&DownloadRequest { url, format_id })
            .send()
            .await?;
        if !response.status().is_success() {
            let detail = Self::error_detail(response).await;
            return Err(DownloadError::DownloadStart(
                detail.unwrap_or_else(|| "Download failed".to_string()),
            ));
        }

        let body = response.json::<DownloadResponse>().await?;
        tracing::debug!(download_id = %body.download_id, "download started");
        Ok(body.download_id)
    }

    async fn poll_progress(
        &self,
        download_id: &str,
    ) -> Result<ProgressSnapshot, DownloadError> {
        let endpoint = self.endpoint(&["progress", download_id])?;

        let response = self.http.get(endpoint).send().await?;
        if !response.status().is_success() {
            let detail = Self::error_detail(response).await;
            return Err(DownloadError::Transport(
                detail.unwrap_or_else(|| "Progress request failed".to_string()),
            ));
        }

        Ok(response.json::<ProgressSnapshot>().await?)
    }

    async fn fetch_file(&self, filename: &str) -> Result<Vec<u8>, DownloadError> {
        let endpoint = self.endpoint(&["download_file", filename])?;
        tracing::debug!(filename, "fetching file");

        let response = self.http.get(endpoint).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(DownloadError::NotFound(filename.to_string()));
        }
        if !response.status().is_success() {
            let detail = Self::error_detail(response).await;
            return Err(DownloadError::Transport(
                detail.unwrap_or_else(|| "File request failed".to_string()),
            ));
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn list_files(&self) -> Result<Vec<RemoteFile>, DownloadError> {
        let endpoint = self.endpoint(&["list_files"])?;

        let response = self.http.get(endpoint).send().await?;
        if !response.status().is_success() {
            let detail = Self::error_detail(response).await;
            return Err(DownloadError::Transport(
                detail.unwrap_or_else(|| "File listing failed".to_string()),
            ));
        }

        Ok(response.json::<Vec<RemoteFile>>().await?)
    }
}

/// Default directory for saved media: the user's downloads folder.
pub fn default_save_dir() -> PathBuf {
    dirs::download_dir().unwrap_or_else(|| PathBuf::from("."))
}
