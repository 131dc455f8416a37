// Download controller - executes session effects
//
// Owns the JobClient, the single poller task and the event channel. This
// is the only place that touches tokio primitives; the session machine
// itself stays pure.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::errors::DownloadError;
use super::models::{ProgressSnapshot, RemoteFile};
use super::poller::{PollOutcome, PollerConfig, ProgressPoller};
use super::session::{Effect, Session, SessionEvent, SessionPhase};
use super::traits::{JobService, ProgressSink};

/// Presentation hook, called after every transition and on local input
/// rejection. Implementations render; they never drive the workflow.
pub trait Presenter: Send + Sync {
    fn render(&self, session: &Session);
    fn show_validation(&self, message: &str);
    fn show_files(&self, files: &[RemoteFile]);
}

/// Forwards poller snapshots into the session event channel.
struct ChannelSink {
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl ProgressSink for ChannelSink {
    fn update(&self, snapshot: &ProgressSnapshot) {
        let _ = self.events.send(SessionEvent::ProgressUpdated {
            snapshot: snapshot.clone(),
        });
    }
}

pub struct DownloadController {
    service: Arc<dyn JobService>,
    poller_config: PollerConfig,
    presenter: Arc<dyn Presenter>,
    session: Session,
    poll_task: Option<JoinHandle<()>>,
    events_tx: mpsc::UnboundedSender<SessionEvent>,
    events_rx: mpsc::UnboundedReceiver<SessionEvent>,
}

impl DownloadController {
    pub fn new(
        service: Arc<dyn JobService>,
        poller_config: PollerConfig,
        presenter: Arc<dyn Presenter>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            service,
            poller_config,
            presenter,
            session: Session::new(),
            poll_task: None,
            events_tx,
            events_rx,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Apply an event and run every effect it produces, including the
    /// follow-up events those effects resolve to.
    pub async fn dispatch(&mut self, event: SessionEvent) {
        let mut queue = VecDeque::new();
        queue.push_back(event);
        while let Some(event) = queue.pop_front() {
            let (next, effects) = self.session.apply(event);
            self.session = next;
            self.presenter.render(&self.session);
            for effect in effects {
                if let Some(follow_up) = self.run_effect(effect).await {
                    queue.push_back(follow_up);
                }
            }
        }
    }

    /// Pump poller events until the active download settles.
    pub async fn run_until_settled(&mut self) {
        while self.session.phase == SessionPhase::Downloading {
            match self.events_rx.recv().await {
                Some(event) => self.dispatch(event).await,
                None => break,
            }
        }
    }

    async fn run_effect(&mut self, effect: Effect) -> Option<SessionEvent> {
        match effect {
            Effect::Extract { url } => match self.service.extract(&url).await {
                Ok(video) => Some(SessionEvent::ExtractSucceeded { video }),
                Err(error) => Some(SessionEvent::ExtractFailed {
                    message: error.to_string(),
                }),
            },
            Effect::StartDownload { url, format_id } => {
                match self.service.start_download(&url, &format_id).await {
                    Ok(download_id) => Some(SessionEvent::DownloadStarted { download_id }),
                    Err(error) => Some(SessionEvent::DownloadStartFailed {
                        message: error.to_string(),
                    }),
                }
            }
            Effect::StartPolling { download_id } => {
                self.start_polling(download_id);
                None
            }
            Effect::StopPolling => {
                self.stop_polling();
                None
            }
            Effect::RefreshFiles => {
                match self.service.list_files().await {
                    Ok(files) => self.presenter.show_files(&files),
                    Err(error) => tracing::warn!(%error, "file listing failed"),
                }
                None
            }
            Effect::ShowValidation { message } => {
                self.presenter.show_validation(&message);
                None
            }
        }
    }

    /// At most one poller per session: the previous task is stopped
    /// before the new one is armed, never overlapped.
    fn start_polling(&mut self, download_id: String) {
        self.stop_polling();

        let service = Arc::clone(&self.service);
        let events = self.events_tx.clone();
        let poller = ProgressPoller::new(self.poller_config.clone());
        self.poll_task = Some(tokio::spawn(async move {
            let sink = ChannelSink {
                events: events.clone(),
            };
            let outcome = poller.run(service.as_ref(), &download_id, &sink).await;
            let event = match outcome {
                PollOutcome::Finished { filename } => {
                    SessionEvent::DownloadFinished { filename }
                }
                PollOutcome::Failed { message } => SessionEvent::DownloadFailed { message },
                PollOutcome::TimedOut => SessionEvent::DownloadFailed {
                    message: DownloadError::StallTimeout.to_string(),
                },
                PollOutcome::ConnectionLost => SessionEvent::DownloadFailed {
                    message: DownloadError::ConnectivityLoss.to_string(),
                },
            };
            let _ = events.send(event);
        }));
    }

    fn stop_polling(&mut self) {
        if let Some(task) = self.poll_task.take() {
            // Cooperative cancellation: an in-flight poll response that
            // outlives the task is dropped unobserved.
            task.abort();
        }
    }
}

impl Drop for DownloadController {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::downloader::models::{
        FormatDescriptor, FormatKind, ProgressStatus, VideoMetadata,
    };

    fn sample_video() -> VideoMetadata {
        VideoMetadata {
            title: "Clip".to_string(),
            uploader: "Someone".to_string(),
            duration: 125,
            view_count: 1_500_000,
            description: None,
            thumbnail: None,
            formats: vec![FormatDescriptor {
                format_id: "hd".to_string(),
                kind: FormatKind::Combined,
                quality: "720p (Video + Audio)".to_string(),
                ext: "mp4".to_string(),
                filesize: Some(2_097_152),
                fps: Some(30.0),
                abr: None,
            }],
        }
    }

    /// Hands out sequential job ids and records which job every progress
    /// poll was for.
    struct FakeService {
        started: AtomicU32,
        polled_ids: Mutex<Vec<String>>,
        finish_immediately: bool,
    }

    impl FakeService {
        fn new(finish_immediately: bool) -> Self {
            Self {
                started: AtomicU32::new(0),
                polled_ids: Mutex::new(Vec::new()),
                finish_immediately,
            }
        }

        fn polled_ids(&self) -> Vec<String> {
            self.polled_ids.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl JobService for FakeService {
        async fn extract(&self, _url: &str) -> Result<VideoMetadata, DownloadError> {
            Ok(sample_video())
        }

        async fn start_download(
            &self,
            _url: &str,
            _format_id: &str,
        ) -> Result<String, DownloadError> {
            let n = self.started.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(format!("job-{}", n))
        }

        async fn poll_progress(
            &self,
            download_id: &str,
        ) -> Result<ProgressSnapshot, DownloadError> {
            self.polled_ids
                .lock()
                .unwrap()
                .push(download_id.to_string());
            let (status, percent, filename) = if self.finish_immediately {
                (ProgressStatus::Finished, Some(100.0), Some("x.mp4".to_string()))
            } else {
                (ProgressStatus::Downloading, Some(10.0), None)
            };
            Ok(ProgressSnapshot {
                status,
                percent,
                speed: None,
                eta: None,
                downloaded: None,
                total: None,
                filename,
                error: None,
                message: None,
            })
        }

        async fn fetch_file(&self, _filename: &str) -> Result<Vec<u8>, DownloadError> {
            Ok(Vec::new())
        }

        async fn list_files(&self) -> Result<Vec<RemoteFile>, DownloadError> {
            Ok(Vec::new())
        }
    }

    struct NullPresenter;

    impl Presenter for NullPresenter {
        fn render(&self, _session: &Session) {}
        fn show_validation(&self, _message: &str) {}
        fn show_files(&self, _files: &[RemoteFile]) {}
    }

    fn controller(
        service: Arc<FakeService>,
        poller_config: PollerConfig,
    ) -> DownloadController {
        DownloadController::new(service, poller_config, Arc::new(NullPresenter))
    }

    async fn drive_to_downloading(controller: &mut DownloadController) {
        controller
            .dispatch(SessionEvent::Submit {
                url: "https://facebook.com/watch?v=1".to_string(),
            })
            .await;
        controller
            .dispatch(SessionEvent::FormatSelected {
                format_id: "hd".to_string(),
            })
            .await;
        assert_eq!(controller.session().phase, SessionPhase::Downloading);
    }

    #[tokio::test]
    async fn download_settles_to_complete() {
        let service = Arc::new(FakeService::new(true));
        let config = PollerConfig::default().with_intervals(Duration::ZERO, Duration::ZERO);
        let mut controller = controller(Arc::clone(&service), config);

        drive_to_downloading(&mut controller).await;
        controller.run_until_settled().await;

        assert_eq!(controller.session().phase, SessionPhase::Complete);
        assert_eq!(
            controller.session().completed_file.as_deref(),
            Some("x.mp4")
        );
    }

    #[tokio::test]
    async fn second_download_stops_the_first_poller_before_arming() {
        let service = Arc::new(FakeService::new(false));
        let config = PollerConfig::default()
            .with_intervals(Duration::from_millis(5), Duration::from_millis(5));
        let mut controller = controller(Arc::clone(&service), config);

        drive_to_downloading(&mut controller).await;
        // Let the first poller take a few ticks
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(service.polled_ids().contains(&"job-1".to_string()));

        // Submitting again replaces the job and its poller
        drive_to_downloading(&mut controller).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        let ids = service.polled_ids();
        let first_of_second = ids.iter().position(|id| id.as_str() == "job-2").unwrap();
        // Exactly one tick sequence at any time: once the second poller
        // ran, the first never polled again
        assert!(
            ids[first_of_second..].iter().all(|id| id.as_str() == "job-2"),
            "first poller outlived its replacement: {:?}",
            ids
        );
    }

    #[tokio::test]
    async fn reset_stops_polling() {
        let service = Arc::new(FakeService::new(false));
        let config = PollerConfig::default()
            .with_intervals(Duration::from_millis(5), Duration::from_millis(5));
        let mut controller = controller(Arc::clone(&service), config);

        drive_to_downloading(&mut controller).await;
        tokio::time::sleep(Duration::from_millis(30)).await;

        controller.dispatch(SessionEvent::Reset).await;
        assert_eq!(controller.session().phase, SessionPhase::Idle);
        assert!(controller.session().job.is_none());

        let polls_after_reset = service.polled_ids().len();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(service.polled_ids().len(), polls_after_reset);
    }

    #[tokio::test]
    async fn validation_failures_reach_the_presenter_not_the_service() {
        struct RecordingPresenter {
            validations: Mutex<Vec<String>>,
        }
        impl Presenter for RecordingPresenter {
            fn render(&self, _session: &Session) {}
            fn show_validation(&self, message: &str) {
                self.validations.lock().unwrap().push(message.to_string());
            }
            fn show_files(&self, _files: &[RemoteFile]) {}
        }

        let service = Arc::new(FakeService::new(true));
        let presenter = Arc::new(RecordingPresenter {
            validations: Mutex::new(Vec::new()),
        });
        let mut controller = DownloadController::new(
            Arc::clone(&service) as Arc<dyn JobService>,
            PollerConfig::default(),
            Arc::clone(&presenter) as Arc<dyn Presenter>,
        );

        controller
            .dispatch(SessionEvent::Submit {
                url: "   ".to_string(),
            })
            .await;

        assert_eq!(controller.session().phase, SessionPhase::Idle);
        assert_eq!(presenter.validations.lock().unwrap().len(), 1);
        // No extraction was attempted
        assert!(service.polled_ids().is_empty());
        assert_eq!(service.started.load(Ordering::SeqCst), 0);
    }
}
