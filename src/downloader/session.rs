// Session lifecycle - pure state machine for the download workflow
//
// apply() is a pure transition over an immutable-per-transition session
// record: it performs no I/O and mutates nothing in place. The adapter
// (controller) executes the returned effects - issue a request, arm or
// stop the poller, refresh the file list.

use lazy_static::lazy_static;
use regex::Regex;

use super::models::{DownloadJob, ProgressSnapshot, VideoMetadata};

lazy_static! {
    // Hosts the external service can extract from
    static ref SUPPORTED_URL: Regex =
        Regex::new(r"(?i)(facebook\.com|fb\.watch)").unwrap();
}

/// URL allow-list applied before any network call is made
pub fn is_supported_url(url: &str) -> bool {
    SUPPORTED_URL.is_match(url)
}

/// The single authoritative UI state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Loading,
    ShowingInfo,
    Downloading,
    Complete,
    Error,
}

/// User actions and component results driving the session
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Submit { url: String },
    ExtractSucceeded { video: VideoMetadata },
    ExtractFailed { message: String },
    FormatSelected { format_id: String },
    DownloadStarted { download_id: String },
    DownloadStartFailed { message: String },
    ProgressUpdated { snapshot: ProgressSnapshot },
    DownloadFinished { filename: String },
    DownloadFailed { message: String },
    Reset,
}

/// Side effects for the adapter to execute after a transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Extract { url: String },
    StartDownload { url: String, format_id: String },
    StartPolling { download_id: String },
    StopPolling,
    RefreshFiles,
    /// Local input rejection; no state changed and no request was issued
    ShowValidation { message: String },
}

/// Immutable-per-transition session record.
///
/// Single-writer: only `apply` produces new sessions; every other
/// component is a read-only observer.
#[derive(Debug, Clone)]
pub struct Session {
    pub phase: SessionPhase,
    /// URL of the current workflow, kept for the download-start call
    pub url: Option<String>,
    pub video: Option<VideoMetadata>,
    pub job: Option<DownloadJob>,
    /// Format chosen but not yet acknowledged by the service
    pub pending_format: Option<String>,
    /// Guards against re-entrant submit/select while a call is outstanding
    pub is_processing: bool,
    /// Message shown in the error phase
    pub error: Option<String>,
    /// Filename handed off on completion
    pub completed_file: Option<String>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Idle,
            url: None,
            video: None,
            job: None,
            pending_format: None,
            is_processing: false,
            error: None,
            completed_file: None,
        }
    }

    /// Apply one event, returning the next session and the effects to run.
    pub fn apply(&self, event: SessionEvent) -> (Session, Vec<Effect>) {
        match event {
            SessionEvent::Submit { url } => self.submit(url),
            SessionEvent::ExtractSucceeded { video } => self.extract_succeeded(video),
            SessionEvent::ExtractFailed { message } => self.extract_failed(message),
            SessionEvent::FormatSelected { format_id } => self.format_selected(format_id),
            SessionEvent::DownloadStarted { download_id } => {
                self.download_started(download_id)
            }
            SessionEvent::DownloadStartFailed { message } => self.fail(message),
            SessionEvent::ProgressUpdated { snapshot } => self.progress_updated(snapshot),
            SessionEvent::DownloadFinished { filename } => self.download_finished(filename),
            SessionEvent::DownloadFailed { message } => self.fail(message),
            SessionEvent::Reset => self.reset(),
        }
    }

    fn submit(&self, url: String) -> (Session, Vec<Effect>) {
        if self.is_processing {
            tracing::debug!("submit ignored: a request is already in flight");
            return (self.clone(), Vec::new());
        }

        let url = url.trim().to_string();
        if url.is_empty() {
            return (
                self.clone(),
                vec![Effect::ShowValidation {
                    message: "Please enter a Facebook video URL".to_string(),
                }],
            );
        }
        if !is_supported_url(&url) {
            return (
                self.clone(),
                vec![Effect::ShowValidation {
                    message: "Please enter a valid Facebook video URL \
                              (facebook.com, m.facebook.com, or fb.watch)"
                        .to_string(),
                }],
            );
        }

        // A new submission invalidates whatever came before it
        let next = Session {
            phase: SessionPhase::Loading,
            url: Some(url.clone()),
            is_processing: true,
            ..Session::new()
        };
        (next, vec![Effect::StopPolling, Effect::Extract { url }])
    }

    fn extract_succeeded(&self, video: VideoMetadata) -> (Session, Vec<Effect>) {
        if self.phase != SessionPhase::Loading {
            tracing::debug!("stale extraction result dropped");
            return (self.clone(), Vec::new());
        }
        let next = Session {
            phase: SessionPhase::ShowingInfo,
            video: Some(video),
            is_processing: false,
            ..self.clone()
        };
        (next, Vec::new())
    }

    fn extract_failed(&self, message: String) -> (Session, Vec<Effect>) {
        if self.phase != SessionPhase::Loading {
            tracing::debug!("stale extraction failure dropped");
            return (self.clone(), Vec::new());
        }
        let next = Session {
            phase: SessionPhase::Error,
            error: Some(message),
            is_processing: false,
            ..self.clone()
        };
        (next, Vec::new())
    }

    fn format_selected(&self, format_id: String) -> (Session, Vec<Effect>) {
        if self.is_processing {
            tracing::debug!("format selection ignored: a request is already in flight");
            return (self.clone(), Vec::new());
        }
        if self.phase != SessionPhase::ShowingInfo {
            return (self.clone(), Vec::new());
        }
        let url = match &self.url {
            Some(url) => url.clone(),
            None => return (self.clone(), Vec::new()),
        };

        let next = Session {
            phase: SessionPhase::Downloading,
            pending_format: Some(format_id.clone()),
            is_processing: true,
            ..self.clone()
        };
        (next, vec![Effect::StartDownload { url, format_id }])
    }

    fn download_started(&self, download_id: String) -> (Session, Vec<Effect>) {
        if self.phase != SessionPhase::Downloading {
            tracing::debug!("stale download-start result dropped");
            return (self.clone(), Vec::new());
        }
        let url = self.url.clone().unwrap_or_default();
        let format_id = self.pending_format.clone().unwrap_or_default();
        let job = DownloadJob::new(download_id.clone(), url, format_id);

        let next = Session {
            job: Some(job),
            is_processing: false,
            ..self.clone()
        };
        (next, vec![Effect::StartPolling { download_id }])
    }

    fn progress_updated(&self, snapshot: ProgressSnapshot) -> (Session, Vec<Effect>) {
        if self.phase != SessionPhase::Downloading {
            return (self.clone(), Vec::new());
        }
        let job = match &self.job {
            Some(job) => job,
            None => return (self.clone(), Vec::new()),
        };

        // Newest snapshot fully replaces the displayed one
        let mut job = job.clone();
        job.progress = Some(snapshot);
        let next = Session {
            job: Some(job),
            ..self.clone()
        };
        (next, Vec::new())
    }

    fn download_finished(&self, filename: String) -> (Session, Vec<Effect>) {
        if self.phase != SessionPhase::Downloading {
            tracing::debug!("stale completion dropped");
            return (self.clone(), Vec::new());
        }
        let next = Session {
            phase: SessionPhase::Complete,
            completed_file: Some(filename),
            is_processing: false,
            ..self.clone()
        };
        (next, vec![Effect::RefreshFiles])
    }

    /// Shared exit path for download-start failures, poller timeouts,
    /// connectivity loss and service-reported job errors.
    fn fail(&self, message: String) -> (Session, Vec<Effect>) {
        if self.phase != SessionPhase::Downloading {
            tracing::debug!("stale failure dropped");
            return (self.clone(), Vec::new());
        }
        let next = Session {
            phase: SessionPhase::Error,
            error: Some(message),
            is_processing: false,
            ..self.clone()
        };
        (next, Vec::new())
    }

    fn reset(&self) -> (Session, Vec<Effect>) {
        (Session::new(), vec![Effect::StopPolling, Effect::RefreshFiles])
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
