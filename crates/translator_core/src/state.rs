use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;

use crate::languages::{AUTO_DETECT, DEFAULT_TARGET};
use crate::progress::ProgressEstimate;
use crate::view_model::{ProgressView, TextPaneView, TrackerViewModel};
use crate::{Effect, JobFailure};

pub type JobId = u64;
pub type TimerId = u64;
pub type RequestId = u64;

/// How a file job is followed after submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingMode {
    /// The upload blocks until the artifact comes back; progress is estimated locally.
    #[default]
    Simulated,
    /// The upload returns a job id; progress comes from the status endpoint.
    Polled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerSettings {
    pub mode: TrackingMode,
    pub tick_interval: Duration,
    pub poll_interval: Duration,
    pub debounce: Duration,
    /// Transport failures tolerated while polling before the job fails.
    pub poll_retry_limit: u32,
    pub max_poll_backoff: Duration,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            mode: TrackingMode::Simulated,
            tick_interval: Duration::from_secs(1),
            poll_interval: Duration::from_millis(5000),
            debounce: Duration::from_millis(500),
            poll_retry_limit: 0,
            max_poll_backoff: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub payload: Bytes,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.payload.len() as u64
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobResult {
    pub payload: Bytes,
    pub filename: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Submitted,
    Processing,
    Complete,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackerPhase {
    #[default]
    Idle,
    Submitted,
    Processing,
    Complete,
    Failed,
}

impl From<JobStatus> for TrackerPhase {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Submitted => TrackerPhase::Submitted,
            JobStatus::Processing => TrackerPhase::Processing,
            JobStatus::Complete => TrackerPhase::Complete,
            JobStatus::Failed => TrackerPhase::Failed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationJob {
    pub id: JobId,
    pub remote_id: Option<String>,
    pub source: SourceFile,
    pub source_lang: String,
    pub target_lang: String,
    pub status: JobStatus,
    /// Last raw status string reported by the server.
    pub remote_status: Option<String>,
    pub result: Option<JobResult>,
    pub failure: Option<JobFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadStatus {
    Fetching,
    Saving,
    Saved(PathBuf),
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TimerPurpose {
    ProgressTick,
    StatusPoll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ActiveTimer {
    pub id: TimerId,
    pub purpose: TimerPurpose,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TextPane {
    pub text: String,
    pub source_lang: String,
    pub target_lang: String,
    pub output: String,
    pub debounce_timer: Option<TimerId>,
    pub pending_request: Option<RequestId>,
}

impl Default for TextPane {
    fn default() -> Self {
        Self {
            text: String::new(),
            source_lang: AUTO_DETECT.to_string(),
            target_lang: DEFAULT_TARGET.to_string(),
            output: String::new(),
            debounce_timer: None,
            pending_request: None,
        }
    }
}

/// The whole tracker: at most one file job plus the live text pane.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TrackerState {
    settings: TrackerSettings,
    selected: Option<SourceFile>,
    job: Option<TranslationJob>,
    estimate: Option<ProgressEstimate>,
    validation_error: Option<String>,
    download: Option<DownloadStatus>,
    job_timer: Option<ActiveTimer>,
    poll_failures: u32,
    text: TextPane,
    next_job_id: JobId,
    next_timer_id: TimerId,
    next_request_id: RequestId,
    dirty: bool,
}

impl TrackerState {
    pub fn new(settings: TrackerSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    pub fn phase(&self) -> TrackerPhase {
        self.job
            .as_ref()
            .map_or(TrackerPhase::Idle, |job| job.status.into())
    }

    pub fn job(&self) -> Option<&TranslationJob> {
        self.job.as_ref()
    }

    /// Whether a job timer (progress tick or status poll) is outstanding.
    pub fn has_pending_job_timer(&self) -> bool {
        self.job_timer.is_some()
    }

    pub fn has_pending_debounce(&self) -> bool {
        self.text.debounce_timer.is_some()
    }

    pub fn text_output(&self) -> &str {
        &self.text.output
    }

    pub fn view(&self) -> TrackerViewModel {
        let phase = self.phase();
        let job = self.job.as_ref();
        TrackerViewModel {
            phase,
            selected_file: self.selected.as_ref().map(|file| file.name.clone()),
            job_id: job.map(|job| job.id),
            remote_status: job.and_then(|job| job.remote_status.clone()),
            progress: self.progress_view(),
            validation_error: self.validation_error.clone(),
            error: job
                .and_then(|job| job.failure.as_ref())
                .map(|failure| failure.message.clone()),
            result_filename: job
                .and_then(|job| job.result.as_ref())
                .map(|result| result.filename.clone()),
            download: self.download.clone(),
            can_submit: !matches!(phase, TrackerPhase::Submitted | TrackerPhase::Processing),
            can_download: phase == TrackerPhase::Complete
                && job.is_some_and(|job| job.result.is_some()),
            text: TextPaneView {
                output: self.text.output.clone(),
                translating: self.text.pending_request.is_some(),
                source_lang: self.text.source_lang.clone(),
                target_lang: self.text.target_lang.clone(),
            },
            dirty: self.dirty,
        }
    }

    fn progress_view(&self) -> Option<ProgressView> {
        let job = self.job.as_ref()?;
        let estimate = self.estimate.as_ref();
        let percent = estimate.and_then(ProgressEstimate::percent);
        let (label, detail) = match job.status {
            JobStatus::Failed => (
                format!(
                    "Error: {}",
                    job.failure.as_ref().map_or("", |f| f.message.as_str())
                ),
                "Please try again.".to_string(),
            ),
            JobStatus::Complete => (
                "Success!".to_string(),
                if job.result.is_some() {
                    "Download will start automatically.".to_string()
                } else {
                    "Fetching the translated file...".to_string()
                },
            ),
            JobStatus::Submitted => (
                "Submitted".to_string(),
                "Waiting for the server to accept the job...".to_string(),
            ),
            JobStatus::Processing => match percent {
                Some(percent) => (
                    format!("Processing... {}%", percent.round() as u8),
                    estimate
                        .and_then(ProgressEstimate::remaining_label)
                        .unwrap_or_default(),
                ),
                None => (
                    "Processing...".to_string(),
                    format!(
                        "Checking status every {}s",
                        self.settings.poll_interval.as_secs()
                    ),
                ),
            },
        };
        Some(ProgressView {
            percent,
            label,
            detail,
        })
    }

    /// Returns and clears the dirty flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn is_pristine(&self) -> bool {
        self.selected.is_none()
            && self.job.is_none()
            && self.estimate.is_none()
            && self.validation_error.is_none()
            && self.download.is_none()
            && self.job_timer.is_none()
    }

    pub(crate) fn select_file(&mut self, file: SourceFile) {
        self.selected = Some(file);
        self.mark_dirty();
    }

    pub(crate) fn selected(&self) -> Option<&SourceFile> {
        self.selected.as_ref()
    }

    pub(crate) fn set_validation_error(&mut self, message: impl Into<String>) {
        self.validation_error = Some(message.into());
        self.mark_dirty();
    }

    /// Drops the file job and everything hanging off it. Returns the effect
    /// cancelling the job timer, if one was running.
    pub(crate) fn clear_file_workspace(&mut self) -> Vec<Effect> {
        let effects = self.cancel_job_timer();
        self.selected = None;
        self.job = None;
        self.estimate = None;
        self.validation_error = None;
        self.download = None;
        self.poll_failures = 0;
        self.mark_dirty();
        effects
    }

    pub(crate) fn begin_job(
        &mut self,
        source: SourceFile,
        source_lang: String,
        target_lang: String,
    ) -> JobId {
        self.next_job_id += 1;
        let id = self.next_job_id;
        let (status, estimate) = match self.settings.mode {
            TrackingMode::Simulated => (
                JobStatus::Processing,
                ProgressEstimate::simulated(source.size_bytes()),
            ),
            TrackingMode::Polled => (
                JobStatus::Submitted,
                ProgressEstimate::Coarse(JobStatus::Submitted),
            ),
        };
        self.job = Some(TranslationJob {
            id,
            remote_id: None,
            source,
            source_lang,
            target_lang,
            status,
            remote_status: None,
            result: None,
            failure: None,
        });
        self.estimate = Some(estimate);
        self.validation_error = None;
        self.download = None;
        self.poll_failures = 0;
        self.mark_dirty();
        id
    }

    /// The current job, if `job_id` names it and it has not reached a terminal state.
    pub(crate) fn active_job_mut(&mut self, job_id: JobId) -> Option<&mut TranslationJob> {
        self.job
            .as_mut()
            .filter(|job| job.id == job_id && !job.status.is_terminal())
    }

    pub(crate) fn job_mut(&mut self, job_id: JobId) -> Option<&mut TranslationJob> {
        self.job.as_mut().filter(|job| job.id == job_id)
    }

    pub(crate) fn set_estimate(&mut self, estimate: ProgressEstimate) {
        self.estimate = Some(estimate);
    }

    pub(crate) fn estimate_mut(&mut self) -> Option<&mut ProgressEstimate> {
        self.estimate.as_mut()
    }

    pub(crate) fn set_download(&mut self, status: Option<DownloadStatus>) {
        self.download = status;
        self.mark_dirty();
    }

    /// Replaces the job timer. The previous one, if any, is cancelled first so
    /// that at most one job timer is ever outstanding.
    pub(crate) fn start_job_timer(&mut self, purpose: TimerPurpose, after: Duration) -> Vec<Effect> {
        let mut effects = self.cancel_job_timer();
        let id = self.allocate_timer();
        self.job_timer = Some(ActiveTimer { id, purpose });
        effects.push(Effect::StartTimer { timer: id, after });
        effects
    }

    pub(crate) fn cancel_job_timer(&mut self) -> Vec<Effect> {
        match self.job_timer.take() {
            Some(timer) => vec![Effect::CancelTimer { timer: timer.id }],
            None => Vec::new(),
        }
    }

    /// Marks the job timer as fired; it is no longer outstanding.
    pub(crate) fn take_fired_job_timer(&mut self, timer: TimerId) -> Option<TimerPurpose> {
        match self.job_timer {
            Some(active) if active.id == timer => {
                self.job_timer = None;
                Some(active.purpose)
            }
            _ => None,
        }
    }

    pub(crate) fn poll_failures(&self) -> u32 {
        self.poll_failures
    }

    pub(crate) fn set_poll_failures(&mut self, count: u32) {
        self.poll_failures = count;
    }

    pub(crate) fn text_mut(&mut self) -> &mut TextPane {
        &mut self.text
    }

    pub(crate) fn restart_debounce(&mut self) -> Vec<Effect> {
        let mut effects = Vec::with_capacity(2);
        if let Some(old) = self.text.debounce_timer.take() {
            effects.push(Effect::CancelTimer { timer: old });
        }
        let id = self.allocate_timer();
        self.text.debounce_timer = Some(id);
        effects.push(Effect::StartTimer {
            timer: id,
            after: self.settings.debounce,
        });
        effects
    }

    pub(crate) fn take_fired_debounce(&mut self, timer: TimerId) -> bool {
        if self.text.debounce_timer == Some(timer) {
            self.text.debounce_timer = None;
            true
        } else {
            false
        }
    }

    pub(crate) fn allocate_request(&mut self) -> RequestId {
        self.next_request_id += 1;
        self.next_request_id
    }

    fn allocate_timer(&mut self) -> TimerId {
        self.next_timer_id += 1;
        self.next_timer_id
    }
}
