// Progress poller - adaptive polling loop over one active download
//
// A single scheduler task owns the cadence: the current interval is plain
// data re-read before every tick, so slowing down past the halfway mark
// is a field update rather than a timer teardown. Polls are strictly
// sequential; the interval is a minimum spacing, not a concurrency bound.

use std::time::Duration;

use super::models::ProgressStatus;
use super::traits::{JobService, ProgressSink};

/// Tuning knobs for the poll loop
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Hard ceiling on poll attempts, independent of reported progress
    pub max_attempts: u32,
    /// Cadence while the job is young
    pub initial_interval: Duration,
    /// Cadence once the job is well underway
    pub slow_interval: Duration,
    /// Reported percent past which the slower cadence kicks in
    pub slow_after_percent: f64,
    /// Consecutive no-change polls before a stall is logged
    pub stall_threshold: u32,
    /// Consecutive transport failures before the job is declared lost
    pub network_error_threshold: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 180,
            initial_interval: Duration::from_millis(2000),
            slow_interval: Duration::from_millis(3000),
            slow_after_percent: 50.0,
            stall_threshold: 10,
            network_error_threshold: 15,
        }
    }
}

impl PollerConfig {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_intervals(mut self, initial: Duration, slow: Duration) -> Self {
        self.initial_interval = initial;
        self.slow_interval = slow;
        self
    }

    pub fn with_stall_threshold(mut self, polls: u32) -> Self {
        self.stall_threshold = polls;
        self
    }

    pub fn with_network_error_threshold(mut self, failures: u32) -> Self {
        self.network_error_threshold = failures;
        self
    }
}

/// Why a poll loop stopped
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    /// Service reported `finished`; the file is ready to fetch
    Finished { filename: String },
    /// Service reported `error` for the job
    Failed { message: String },
    /// Attempt ceiling reached before the job settled
    TimedOut,
    /// Too many consecutive transport failures
    ConnectionLost,
}

pub struct ProgressPoller {
    config: PollerConfig,
}

impl ProgressPoller {
    pub fn new(config: PollerConfig) -> Self {
        Self { config }
    }

    /// Poll until the job settles or a protection threshold trips.
    ///
    /// Non-terminal snapshots go to `sink`; the terminal outcome is the
    /// return value. A new poll is never issued before the previous
    /// response (or failure) has been handled.
    pub async fn run(
        &self,
        service: &dyn JobService,
        download_id: &str,
        sink: &dyn ProgressSink,
    ) -> PollOutcome {
        let mut interval = self.config.initial_interval;
        let mut attempts: u32 = 0;
        let mut consecutive_errors: u32 = 0;
        let mut stalled_polls: u32 = 0;
        let mut last_percent: Option<f64> = None;

        loop {
            tokio::time::sleep(interval).await;

            attempts += 1;
            if attempts > self.config.max_attempts {
                tracing::warn!(download_id, attempts, "poll attempt ceiling reached");
                return PollOutcome::TimedOut;
            }

            let snapshot = match service.poll_progress(download_id).await {
                Ok(snapshot) => {
                    consecutive_errors = 0;
                    snapshot
                }
                Err(error) => {
                    // Transient blips must not abort the job
                    consecutive_errors += 1;
                    tracing::warn!(
                        download_id,
                        consecutive_errors,
                        %error,
                        "progress poll failed"
                    );
                    if consecutive_errors > self.config.network_error_threshold {
                        return PollOutcome::ConnectionLost;
                    }
                    continue;
                }
            };

            match snapshot.status {
                ProgressStatus::Downloading => {
                    // Raw values pass through, regressions included; the
                    // display mirrors the service while transfer is live.
                    sink.update(&snapshot);

                    let percent = snapshot.percent_or_zero();
                    if last_percent == Some(percent) {
                        stalled_polls += 1;
                        // Advisory only: the service may legitimately hold
                        // at a percentage during long I/O. The attempt
                        // ceiling is the enforced bound.
                        if stalled_polls > self.config.stall_threshold {
                            tracing::warn!(download_id, percent, "download appears stalled");
                        }
                    } else {
                        stalled_polls = 0;
                        if percent > self.config.slow_after_percent
                            && interval < self.config.slow_interval
                        {
                            tracing::debug!(
                                download_id,
                                percent,
                                "switching to slower poll cadence"
                            );
                            interval = self.config.slow_interval;
                        }
                        last_percent = Some(percent);
                    }
                }
                ProgressStatus::Starting | ProgressStatus::Preparing => {
                    // Textual status only; percent is untouched
                    sink.update(&snapshot);
                }
                ProgressStatus::Merging | ProgressStatus::Processing => {
                    // Post-transfer states must never regress below the
                    // near-complete mark
                    let mut clamped = snapshot.clone();
                    clamped.percent = Some(snapshot.percent_or_zero().max(95.0));
                    sink.update(&clamped);
                }
                ProgressStatus::Finished => {
                    let filename = snapshot.filename.clone().unwrap_or_default();
                    tracing::info!(download_id, %filename, "download finished");
                    return PollOutcome::Finished { filename };
                }
                ProgressStatus::Error => {
                    let message = snapshot
                        .error
                        .clone()
                        .unwrap_or_else(|| "Download failed".to_string());
                    tracing::warn!(download_id, %message, "service reported job failure");
                    return PollOutcome::Failed { message };
                }
                ProgressStatus::Unknown => {
                    tracing::debug!(download_id, "unrecognized progress status, continuing");
                }
            }
        }
    }
}
