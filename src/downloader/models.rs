// Common data models for the download client

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Kind of media a format carries, as reported by the extraction service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatKind {
    /// Single file with both video and audio tracks
    Combined,
    /// Synthetic best-video + best-audio pairing built by the service
    BestCombined,
    /// Video track only; audio is merged server-side at download time
    VideoOnly,
    /// Audio track only
    AudioOnly,
}

impl FormatKind {
    /// Whether this format carries a video track
    pub fn has_video(&self) -> bool {
        !matches!(self, Self::AudioOnly)
    }

    /// combined/best_combined formats are highlighted as the safe choice
    pub fn is_recommended(&self) -> bool {
        matches!(self, Self::Combined | Self::BestCombined)
    }
}

/// One selectable format from an extraction response.
///
/// `format_id` is unique within a single response and opaque to us.
/// The service reports missing numeric details as zero; treat zero and
/// absent the same way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormatDescriptor {
    pub format_id: String,
    #[serde(rename = "type")]
    pub kind: FormatKind,
    /// Display string, e.g. "720p (Video + Audio)"
    pub quality: String,
    /// Container extension (mp4, webm, m4a)
    pub ext: String,
    /// File size in bytes
    #[serde(default)]
    pub filesize: Option<u64>,
    /// Frames per second
    #[serde(default)]
    pub fps: Option<f64>,
    /// Audio bitrate in kbps
    #[serde(default)]
    pub abr: Option<f64>,
}

/// Video information extracted from a source URL.
///
/// Immutable once received; a new extraction replaces it wholesale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoMetadata {
    pub title: String,
    pub uploader: String,
    /// Duration in seconds
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub formats: Vec<FormatDescriptor>,
}

/// Job status reported by the progress endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Starting,
    Preparing,
    Downloading,
    /// Raw transfer done, tracks being merged
    Merging,
    /// Post-processing after transfer
    Processing,
    Finished,
    Error,
    /// Any status string the service adds later; polling just continues
    #[serde(other)]
    Unknown,
}

impl ProgressStatus {
    /// Whether polling ceases permanently after this status
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished | Self::Error)
    }
}

/// One progress report for a download job.
///
/// The newest snapshot fully replaces the previous one; fields are never
/// merged across polls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    pub status: ProgressStatus,
    /// 0-100; the service does not guarantee monotonicity
    #[serde(default)]
    pub percent: Option<f64>,
    /// Display string, e.g. "1.2 MiB/s"
    #[serde(default)]
    pub speed: Option<String>,
    #[serde(default)]
    pub eta: Option<String>,
    /// Bytes transferred so far
    #[serde(default)]
    pub downloaded: Option<u64>,
    /// Total bytes when known
    #[serde(default)]
    pub total: Option<u64>,
    /// Present only when status is `finished`
    #[serde(default)]
    pub filename: Option<String>,
    /// Present only when status is `error`
    #[serde(default)]
    pub error: Option<String>,
    /// Human-readable status line for the starting/preparing phases
    #[serde(default)]
    pub message: Option<String>,
}

impl ProgressSnapshot {
    pub fn percent_or_zero(&self) -> f64 {
        self.percent.unwrap_or(0.0)
    }
}

/// One in-flight or settled download, identified by the service-issued id.
///
/// Owned exclusively by the session state machine; at most one job is
/// active per session.
#[derive(Debug, Clone)]
pub struct DownloadJob {
    pub download_id: String,
    /// Source URL the job was started from
    pub url: String,
    /// Chosen format id
    pub format_id: String,
    /// Last known snapshot; newest wins
    pub progress: Option<ProgressSnapshot>,
    pub created: OffsetDateTime,
}

impl DownloadJob {
    pub fn new(download_id: String, url: String, format_id: String) -> Self {
        Self {
            download_id,
            url,
            format_id,
            progress: None,
            created: OffsetDateTime::now_utc(),
        }
    }
}

/// One entry of the service's completed-file listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteFile {
    pub name: String,
    /// Size in bytes
    pub size: u64,
}

/// Connection settings for the download service
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the service, e.g. "http://127.0.0.1:8000"
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// SOCKS5/HTTP proxy URL (e.g. "socks5://127.0.0.1:1080")
    pub proxy: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            timeout_seconds: 30,
            proxy: None,
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }
}
