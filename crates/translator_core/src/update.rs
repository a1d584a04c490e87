use std::time::Duration;

use translator_logging::{translator_debug, translator_info, translator_warn};

use crate::progress::ProgressEstimate;
use crate::state::TimerPurpose;
use crate::{
    DownloadStatus, Effect, FailureKind, JobFailure, JobId, JobResult, JobStatus, Msg,
    RemoteStatus, TimerId, TrackerPhase, TrackerState, TrackingMode,
};

const JOB_ERROR_FALLBACK: &str = "Translation failed.";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: TrackerState, msg: Msg) -> (TrackerState, Vec<Effect>) {
    let effects = match msg {
        Msg::FileSelected(file) => {
            translator_debug!("File selected name={} size={}", file.name, file.size_bytes());
            let effects = state.clear_file_workspace();
            state.select_file(file);
            effects
        }
        Msg::SubmitRequested {
            source_lang,
            target_lang,
        } => submit(&mut state, source_lang, target_lang),
        Msg::JobAccepted { job_id, remote_id } => job_accepted(&mut state, job_id, remote_id),
        Msg::StatusReported { job_id, report } => status_reported(&mut state, job_id, report),
        Msg::ResultReady { job_id, result } => result_ready(&mut state, job_id, result),
        Msg::JobFailed { job_id, failure } => job_failed(&mut state, job_id, failure),
        Msg::TimerFired { timer } => timer_fired(&mut state, timer),
        Msg::DownloadClicked => download_clicked(&mut state),
        Msg::ResultSaved { job_id, path } => {
            if state.job_mut(job_id).is_some() {
                translator_info!("Job {} result saved to {:?}", job_id, path);
                state.set_download(Some(DownloadStatus::Saved(path)));
            }
            Vec::new()
        }
        Msg::ResultSaveFailed { job_id, message } => {
            if state.job_mut(job_id).is_some() {
                translator_warn!("Job {} result could not be saved: {}", job_id, message);
                state.set_download(Some(DownloadStatus::Failed(message)));
            }
            Vec::new()
        }
        Msg::ResetRequested => {
            if state.is_pristine() {
                Vec::new()
            } else {
                translator_debug!("Resetting file workspace from {:?}", state.phase());
                state.clear_file_workspace()
            }
        }
        Msg::TextEdited(text) => {
            state.text_mut().text = text;
            state.mark_dirty();
            state.restart_debounce()
        }
        Msg::TextLanguagesChanged {
            source_lang,
            target_lang,
        } => {
            let pane = state.text_mut();
            pane.source_lang = source_lang;
            pane.target_lang = target_lang;
            state.mark_dirty();
            Vec::new()
        }
        Msg::TextTranslated { request_id, result } => {
            let pane = state.text_mut();
            if pane.pending_request != Some(request_id) {
                translator_debug!("Dropping stale text translation {}", request_id);
                return (state, Vec::new());
            }
            pane.pending_request = None;
            pane.output = match result {
                Ok(text) => text,
                Err(message) => format!("Error: {message}"),
            };
            state.mark_dirty();
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn submit(state: &mut TrackerState, source_lang: String, target_lang: String) -> Vec<Effect> {
    if matches!(
        state.phase(),
        TrackerPhase::Submitted | TrackerPhase::Processing
    ) {
        translator_warn!(
            "Rejecting submission while job {:?} is in flight",
            state.job().map(|job| job.id)
        );
        return Vec::new();
    }
    let Some(file) = state.selected().cloned() else {
        state.set_validation_error("Please select a file to translate.");
        return Vec::new();
    };
    if file.payload.is_empty() {
        state.set_validation_error(format!("The selected file \"{}\" is empty.", file.name));
        return Vec::new();
    }

    let mut effects = state.cancel_job_timer();
    let job_id = state.begin_job(file.clone(), source_lang.clone(), target_lang.clone());
    translator_info!(
        "Submitting job {} file={} bytes={} {} -> {}",
        job_id,
        file.name,
        file.size_bytes(),
        source_lang,
        target_lang
    );
    effects.push(Effect::SubmitFile {
        job_id,
        file,
        source_lang,
        target_lang,
    });
    if state.settings().mode == TrackingMode::Simulated {
        let interval = state.settings().tick_interval;
        effects.extend(state.start_job_timer(TimerPurpose::ProgressTick, interval));
    }
    effects
}

fn job_accepted(state: &mut TrackerState, job_id: JobId, remote_id: String) -> Vec<Effect> {
    let poll_interval = state.settings().poll_interval;
    let Some(job) = state.active_job_mut(job_id) else {
        translator_debug!("Ignoring acceptance for inactive job {}", job_id);
        return Vec::new();
    };
    if job.remote_id.is_some() {
        translator_debug!("Job {} already has a remote id", job_id);
        return Vec::new();
    }
    translator_info!("Job {} accepted as remote job {}", job_id, remote_id);
    job.remote_id = Some(remote_id);
    let status = job.status;
    state.set_estimate(ProgressEstimate::Coarse(status));
    state.mark_dirty();
    // Replaces a running progress tick, if the service answered asynchronously.
    state.start_job_timer(TimerPurpose::StatusPoll, poll_interval)
}

fn status_reported(
    state: &mut TrackerState,
    job_id: JobId,
    report: Result<RemoteStatus, JobFailure>,
) -> Vec<Effect> {
    let settings = state.settings().clone();
    let Some(job) = state.active_job_mut(job_id) else {
        translator_debug!("Ignoring status for inactive job {}", job_id);
        return Vec::new();
    };

    match report {
        Ok(RemoteStatus::Complete) => {
            job.status = JobStatus::Complete;
            job.remote_status = Some("complete".to_string());
            let remote_id = job.remote_id.clone();
            let original_name = job.source.name.clone();
            translator_info!("Job {} complete", job_id);
            let mut effects = state.cancel_job_timer();
            state.set_estimate(ProgressEstimate::Finished);
            state.set_poll_failures(0);
            state.mark_dirty();
            match remote_id {
                Some(remote_id) => {
                    state.set_download(Some(DownloadStatus::Fetching));
                    effects.push(Effect::FetchResult {
                        job_id,
                        remote_id,
                        original_name,
                    });
                }
                None => translator_warn!("Job {} completed without a remote id", job_id),
            }
            effects
        }
        Ok(RemoteStatus::Error(message)) => {
            job.remote_status = Some("error".to_string());
            let message = message
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| JOB_ERROR_FALLBACK.to_string());
            fail_job(state, job_id, JobFailure::new(FailureKind::Job, message))
        }
        Ok(RemoteStatus::Pending(raw)) => {
            translator_debug!("Job {} still pending (status={:?})", job_id, raw);
            job.status = JobStatus::Processing;
            job.remote_status = Some(raw);
            state.set_estimate(ProgressEstimate::Coarse(JobStatus::Processing));
            state.set_poll_failures(0);
            state.mark_dirty();
            state.start_job_timer(TimerPurpose::StatusPoll, settings.poll_interval)
        }
        Err(failure) => {
            let attempts = state.poll_failures();
            if failure.kind == FailureKind::Transport && attempts < settings.poll_retry_limit {
                let attempt = attempts + 1;
                let delay = poll_backoff(settings.poll_interval, attempt, settings.max_poll_backoff);
                translator_warn!(
                    "Status poll for job {} failed ({}), retry {}/{} in {:?}",
                    job_id,
                    failure,
                    attempt,
                    settings.poll_retry_limit,
                    delay
                );
                state.set_poll_failures(attempt);
                state.start_job_timer(TimerPurpose::StatusPoll, delay)
            } else {
                fail_job(state, job_id, failure)
            }
        }
    }
}

/// Delay before retry `attempt` (1-based): the poll interval doubled per attempt, capped.
fn poll_backoff(base: Duration, attempt: u32, max: Duration) -> Duration {
    let factor = 1u32 << attempt.saturating_sub(1).min(16);
    base.saturating_mul(factor).min(max)
}

fn result_ready(state: &mut TrackerState, job_id: JobId, result: JobResult) -> Vec<Effect> {
    let Some(job) = state.job_mut(job_id) else {
        translator_debug!("Ignoring result for unknown job {}", job_id);
        return Vec::new();
    };
    match job.status {
        JobStatus::Submitted | JobStatus::Processing => {
            translator_info!(
                "Job {} finished: {} ({} bytes)",
                job_id,
                result.filename,
                result.payload.len()
            );
            job.status = JobStatus::Complete;
            job.result = Some(result.clone());
            let mut effects = state.cancel_job_timer();
            state.set_estimate(ProgressEstimate::Finished);
            state.set_download(Some(DownloadStatus::Saving));
            effects.push(Effect::SaveResult { job_id, result });
            effects
        }
        JobStatus::Complete if job.result.is_none() => {
            translator_info!("Job {} result fetched: {}", job_id, result.filename);
            job.result = Some(result.clone());
            state.set_download(Some(DownloadStatus::Saving));
            vec![Effect::SaveResult { job_id, result }]
        }
        JobStatus::Complete | JobStatus::Failed => {
            translator_debug!("Ignoring late result for job {}", job_id);
            Vec::new()
        }
    }
}

fn download_clicked(state: &mut TrackerState) -> Vec<Effect> {
    if state.phase() != TrackerPhase::Complete {
        return Vec::new();
    }
    let Some((job_id, result)) = state
        .job()
        .and_then(|job| job.result.clone().map(|result| (job.id, result)))
    else {
        translator_debug!("Download requested before a result is available");
        return Vec::new();
    };
    translator_info!("Saving job {} result again as {}", job_id, result.filename);
    state.set_download(Some(DownloadStatus::Saving));
    vec![Effect::SaveResult { job_id, result }]
}

fn job_failed(state: &mut TrackerState, job_id: JobId, failure: JobFailure) -> Vec<Effect> {
    let status = state
        .job()
        .filter(|job| job.id == job_id)
        .map(|job| job.status);
    match status {
        Some(JobStatus::Submitted | JobStatus::Processing) => fail_job(state, job_id, failure),
        Some(JobStatus::Complete) => {
            translator_warn!("Fetching the result of job {} failed: {}", job_id, failure);
            state.set_download(Some(DownloadStatus::Failed(failure.message)));
            Vec::new()
        }
        Some(JobStatus::Failed) | None => {
            translator_debug!("Ignoring failure for inactive job {}", job_id);
            Vec::new()
        }
    }
}

fn fail_job(state: &mut TrackerState, job_id: JobId, failure: JobFailure) -> Vec<Effect> {
    let effects = state.cancel_job_timer();
    if let Some(job) = state.job_mut(job_id) {
        translator_warn!("Job {} failed ({}): {}", job_id, failure.kind, failure.message);
        job.status = JobStatus::Failed;
        job.failure = Some(failure);
    }
    state.mark_dirty();
    effects
}

fn timer_fired(state: &mut TrackerState, timer: TimerId) -> Vec<Effect> {
    if let Some(purpose) = state.take_fired_job_timer(timer) {
        return match purpose {
            TimerPurpose::ProgressTick => progress_tick(state),
            TimerPurpose::StatusPoll => status_poll(state),
        };
    }
    if state.take_fired_debounce(timer) {
        return debounce_elapsed(state);
    }
    translator_debug!("Ignoring stale timer {}", timer);
    Vec::new()
}

fn progress_tick(state: &mut TrackerState) -> Vec<Effect> {
    if state.phase() != TrackerPhase::Processing {
        return Vec::new();
    }
    let interval = state.settings().tick_interval;
    let Some(estimate) = state.estimate_mut() else {
        return Vec::new();
    };
    let keep_ticking = estimate.advance(interval);
    state.mark_dirty();
    if keep_ticking {
        state.start_job_timer(TimerPurpose::ProgressTick, interval)
    } else {
        Vec::new()
    }
}

fn status_poll(state: &mut TrackerState) -> Vec<Effect> {
    let target = state
        .job()
        .filter(|job| !job.status.is_terminal())
        .and_then(|job| job.remote_id.clone().map(|remote_id| (job.id, remote_id)));
    match target {
        Some((job_id, remote_id)) => vec![Effect::PollStatus { job_id, remote_id }],
        None => Vec::new(),
    }
}

fn debounce_elapsed(state: &mut TrackerState) -> Vec<Effect> {
    let pane = state.text_mut();
    let text = pane.text.trim().to_string();
    if text.is_empty() {
        pane.output.clear();
        pane.pending_request = None;
        state.mark_dirty();
        return Vec::new();
    }
    let source_lang = pane.source_lang.clone();
    let target_lang = pane.target_lang.clone();
    let request_id = state.allocate_request();
    state.text_mut().pending_request = Some(request_id);
    state.mark_dirty();
    vec![Effect::TranslateText {
        request_id,
        text,
        source_lang,
        target_lang,
    }]
}
