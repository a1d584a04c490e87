use std::time::Duration;

use translator_core::{Effect, FailureKind, JobFailure, JobResult, Msg, RemoteStatus};
use translator_engine::{
    EngineConfig, EngineError, EngineEvent, EngineHandle, ServiceError, SubmitOutcome,
    TextRequest, UploadFile,
};
use translator_logging::{translator_debug, translator_info, translator_warn};

/// Executes core effects on the engine and turns engine events back into messages.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        translator_info!(
            "Engine starting: server={} output={:?}",
            config.service.base_url,
            config.output_dir
        );
        Ok(Self {
            engine: EngineHandle::new(config)?,
        })
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SubmitFile {
                    job_id,
                    file,
                    source_lang,
                    target_lang,
                } => {
                    translator_info!(
                        "SubmitFile job_id={} name={} bytes={} {} -> {}",
                        job_id,
                        file.name,
                        file.size_bytes(),
                        source_lang,
                        target_lang
                    );
                    let upload = UploadFile {
                        name: file.name,
                        payload: file.payload,
                    };
                    self.engine
                        .submit_file(job_id, upload, source_lang, target_lang);
                }
                Effect::StartTimer { timer, after } => self.engine.start_timer(timer, after),
                Effect::CancelTimer { timer } => self.engine.cancel_timer(timer),
                Effect::PollStatus { job_id, remote_id } => {
                    translator_debug!("PollStatus job_id={} remote_id={}", job_id, remote_id);
                    self.engine.poll_status(job_id, remote_id);
                }
                Effect::FetchResult {
                    job_id,
                    remote_id,
                    original_name,
                } => {
                    translator_info!("FetchResult job_id={} remote_id={}", job_id, remote_id);
                    self.engine.fetch_result(job_id, remote_id, original_name);
                }
                Effect::SaveResult { job_id, result } => {
                    self.engine
                        .save_result(job_id, result.filename, result.payload);
                }
                Effect::TranslateText {
                    request_id,
                    text,
                    source_lang,
                    target_lang,
                } => {
                    translator_debug!("TranslateText request_id={} chars={}", request_id, text.len());
                    self.engine.translate_text(
                        request_id,
                        TextRequest {
                            text,
                            source_lang,
                            target_lang,
                        },
                    );
                }
            }
        }
    }

    /// Waits up to `timeout` for the next engine event.
    pub fn next_msg(&self, timeout: Duration) -> Option<Msg> {
        self.engine.recv_timeout(timeout).map(map_event)
    }
}

pub(crate) fn map_event(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::Submitted { job_id, result } => match result {
            Ok(SubmitOutcome::Artifact(artifact)) => Msg::ResultReady {
                job_id,
                result: JobResult {
                    payload: artifact.payload,
                    filename: artifact.filename,
                },
            },
            Ok(SubmitOutcome::Accepted { remote_id }) => Msg::JobAccepted { job_id, remote_id },
            Err(err) => Msg::JobFailed {
                job_id,
                failure: map_failure(err),
            },
        },
        EngineEvent::StatusPolled { job_id, result } => Msg::StatusReported {
            job_id,
            report: result
                .map(|report| RemoteStatus::from_wire(&report.status, report.error))
                .map_err(map_failure),
        },
        EngineEvent::ResultFetched { job_id, result } => match result {
            Ok(artifact) => Msg::ResultReady {
                job_id,
                result: JobResult {
                    payload: artifact.payload,
                    filename: artifact.filename,
                },
            },
            Err(err) => Msg::JobFailed {
                job_id,
                failure: map_failure(err),
            },
        },
        EngineEvent::ResultSaved { job_id, result } => match result {
            Ok(path) => Msg::ResultSaved { job_id, path },
            Err(message) => {
                translator_warn!("Saving job {} failed: {}", job_id, message);
                Msg::ResultSaveFailed { job_id, message }
            }
        },
        EngineEvent::TextTranslated { request_id, result } => Msg::TextTranslated {
            request_id,
            result: result.map_err(|err| err.message),
        },
        EngineEvent::TimerFired { timer } => Msg::TimerFired { timer },
    }
}

fn map_failure(err: ServiceError) -> JobFailure {
    use translator_engine::FailureKind as Engine;

    let kind = match err.kind {
        Engine::HttpStatus(status) => FailureKind::Server { status },
        Engine::InvalidResponse | Engine::TooLarge { .. } => FailureKind::MalformedResponse,
        Engine::InvalidUrl | Engine::Timeout | Engine::RedirectLimitExceeded | Engine::Network => {
            FailureKind::Transport
        }
    };
    translator_warn!("{}: {}", kind, err.message);
    JobFailure::new(kind, err.message)
}
