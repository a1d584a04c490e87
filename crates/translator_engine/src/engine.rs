use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use thiserror::Error;
use tokio::runtime::Runtime;
use translator_logging::{translator_debug, translator_warn};

use crate::client::{ReqwestService, ServiceSettings, TranslationService};
use crate::persist::AtomicFileWriter;
use crate::timer::Timers;
use crate::{EngineEvent, JobId, RequestId, ServiceError, TextRequest, TimerId, UploadFile};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub service: ServiceSettings,
    /// Where downloaded translations are saved.
    pub output_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("could not start the engine runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

enum EngineCommand {
    Call(ServiceCall),
    StartTimer { timer: TimerId, after: Duration },
    CancelTimer { timer: TimerId },
}

enum ServiceCall {
    SubmitFile {
        job_id: JobId,
        file: UploadFile,
        source_lang: String,
        target_lang: String,
    },
    PollStatus {
        job_id: JobId,
        remote_id: String,
    },
    FetchResult {
        job_id: JobId,
        remote_id: String,
        original_name: String,
    },
    SaveResult {
        job_id: JobId,
        filename: String,
        payload: Bytes,
    },
    TranslateText {
        request_id: RequestId,
        request: TextRequest,
    },
}

/// Runs service calls and timers on a background runtime. Results come back
/// as [`EngineEvent`]s. Dropping the handle stops the engine and disarms
/// every pending timer.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        let service = Arc::new(ReqwestService::new(config.service)?);
        Self::with_service(service, config.output_dir)
    }

    /// Engine over any service implementation; used by tests and alternative transports.
    pub fn with_service(
        service: Arc<dyn TranslationService>,
        output_dir: PathBuf,
    ) -> Result<Self, EngineError> {
        let runtime = Runtime::new()?;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let writer = AtomicFileWriter::new(output_dir);

        thread::spawn(move || {
            let timers = Timers::new();
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    // Timer commands are applied in order on this thread so a
                    // cancel can never overtake the start it refers to.
                    EngineCommand::StartTimer { timer, after } => {
                        let event_tx = event_tx.clone();
                        timers.start(runtime.handle(), timer, after, move |timer| {
                            let _ = event_tx.send(EngineEvent::TimerFired { timer });
                        });
                    }
                    EngineCommand::CancelTimer { timer } => {
                        timers.cancel(timer);
                    }
                    EngineCommand::Call(call) => {
                        let service = service.clone();
                        let writer = writer.clone();
                        let event_tx = event_tx.clone();
                        runtime.spawn(async move {
                            let event = handle_call(service.as_ref(), &writer, call).await;
                            let _ = event_tx.send(event);
                        });
                    }
                }
            }
            translator_debug!("engine command channel closed; stopping");
            timers.cancel_all();
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn submit_file(
        &self,
        job_id: JobId,
        file: UploadFile,
        source_lang: impl Into<String>,
        target_lang: impl Into<String>,
    ) {
        self.call(ServiceCall::SubmitFile {
            job_id,
            file,
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
        });
    }

    pub fn poll_status(&self, job_id: JobId, remote_id: impl Into<String>) {
        self.call(ServiceCall::PollStatus {
            job_id,
            remote_id: remote_id.into(),
        });
    }

    pub fn fetch_result(
        &self,
        job_id: JobId,
        remote_id: impl Into<String>,
        original_name: impl Into<String>,
    ) {
        self.call(ServiceCall::FetchResult {
            job_id,
            remote_id: remote_id.into(),
            original_name: original_name.into(),
        });
    }

    pub fn save_result(&self, job_id: JobId, filename: impl Into<String>, payload: Bytes) {
        self.call(ServiceCall::SaveResult {
            job_id,
            filename: filename.into(),
            payload,
        });
    }

    pub fn translate_text(&self, request_id: RequestId, request: TextRequest) {
        self.call(ServiceCall::TranslateText {
            request_id,
            request,
        });
    }

    pub fn start_timer(&self, timer: TimerId, after: Duration) {
        self.send(EngineCommand::StartTimer { timer, after });
    }

    pub fn cancel_timer(&self, timer: TimerId) {
        self.send(EngineCommand::CancelTimer { timer });
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Blocks for up to `timeout` waiting for the next event.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    fn call(&self, call: ServiceCall) {
        self.send(EngineCommand::Call(call));
    }

    fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            translator_warn!("engine thread is gone; command dropped");
        }
    }
}

async fn handle_call(
    service: &dyn TranslationService,
    writer: &AtomicFileWriter,
    call: ServiceCall,
) -> EngineEvent {
    match call {
        ServiceCall::SubmitFile {
            job_id,
            file,
            source_lang,
            target_lang,
        } => EngineEvent::Submitted {
            job_id,
            result: service.submit_file(&file, &source_lang, &target_lang).await,
        },
        ServiceCall::PollStatus { job_id, remote_id } => EngineEvent::StatusPolled {
            job_id,
            result: service.job_status(&remote_id).await,
        },
        ServiceCall::FetchResult {
            job_id,
            remote_id,
            original_name,
        } => EngineEvent::ResultFetched {
            job_id,
            result: service.download(&remote_id, &original_name).await,
        },
        ServiceCall::SaveResult {
            job_id,
            filename,
            payload,
        } => {
            let writer = writer.clone();
            let saved = tokio::task::spawn_blocking(move || writer.write(&filename, &payload))
                .await
                .map_err(|err| err.to_string())
                .and_then(|result| result.map_err(|err| err.to_string()));
            EngineEvent::ResultSaved {
                job_id,
                result: saved,
            }
        }
        ServiceCall::TranslateText {
            request_id,
            request,
        } => EngineEvent::TextTranslated {
            request_id,
            result: service.translate_text(&request).await,
        },
    }
}
