// Service and observer trait seams

use async_trait::async_trait;

use super::errors::DownloadError;
use super::models::{ProgressSnapshot, RemoteFile, VideoMetadata};

/// The five operations the external download service exposes.
///
/// Each call is a single request/response exchange. Implementations do
/// not retry and do not cache; callers own any retry policy.
#[async_trait]
pub trait JobService: Send + Sync {
    /// Extract metadata and the candidate format list for a URL
    async fn extract(&self, url: &str) -> Result<VideoMetadata, DownloadError>;

    /// Ask the service to start downloading; returns the opaque job id
    async fn start_download(
        &self,
        url: &str,
        format_id: &str,
    ) -> Result<String, DownloadError>;

    /// Fetch the current progress snapshot for a job
    async fn poll_progress(&self, download_id: &str)
        -> Result<ProgressSnapshot, DownloadError>;

    /// Retrieve a completed file's bytes
    async fn fetch_file(&self, filename: &str) -> Result<Vec<u8>, DownloadError>;

    /// List completed files available on the service
    async fn list_files(&self) -> Result<Vec<RemoteFile>, DownloadError>;
}

/// Receives non-terminal snapshots while a poll loop runs.
///
/// Terminal outcomes are returned by the poller itself, not pushed here.
pub trait ProgressSink: Send + Sync {
    fn update(&self, snapshot: &ProgressSnapshot);
}
