// Error types for the download client

use std::fmt;

#[derive(Debug, Clone)]
pub enum DownloadError {
    /// URL rejected locally; no network call was made
    InvalidUrl(String),

    /// Service rejected or could not parse the URL
    Extraction(String),

    /// Service refused to start the download
    DownloadStart(String),

    /// Network/HTTP-layer failure, distinct from a service-reported error
    Transport(String),

    /// Requested file does not exist on the service
    NotFound(String),

    /// Extraction returned no usable formats
    NoFormats,

    /// Poll attempt ceiling reached before the job settled
    StallTimeout,

    /// Too many consecutive transport failures while polling
    ConnectivityLoss,

    /// Service explicitly reported the job as failed
    JobFailed(String),
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            // Service-authored messages are already user-facing
            Self::Extraction(msg) => write!(f, "{}", msg),
            Self::DownloadStart(msg) => write!(f, "{}", msg),
            Self::Transport(msg) => write!(f, "Connection error: {}", msg),
            Self::NotFound(name) => write!(f, "File not found: {}", name),
            Self::NoFormats => write!(f, "No downloadable formats available"),
            Self::StallTimeout => write!(f, "Download timeout. Please try again."),
            Self::ConnectivityLoss => write!(
                f,
                "Connection lost. Please check your internet and try again."
            ),
            Self::JobFailed(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for DownloadError {}

impl From<reqwest::Error> for DownloadError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
