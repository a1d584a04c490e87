use std::path::PathBuf;

use crate::{JobFailure, JobId, JobResult, RequestId, SourceFile, TimerId};

/// Job state as reported by the status endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteStatus {
    Complete,
    Error(Option<String>),
    /// Anything else, including values the service never documented.
    Pending(String),
}

impl RemoteStatus {
    pub fn from_wire(status: &str, error: Option<String>) -> Self {
        match status {
            "complete" => RemoteStatus::Complete,
            "error" => RemoteStatus::Error(error),
            other => RemoteStatus::Pending(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User picked (or dropped) a file. Any current job is discarded.
    FileSelected(SourceFile),
    /// User asked to translate the selected file.
    SubmitRequested {
        source_lang: String,
        target_lang: String,
    },
    /// The service accepted the upload and assigned a job id.
    JobAccepted { job_id: JobId, remote_id: String },
    /// A status poll finished.
    StatusReported {
        job_id: JobId,
        report: Result<RemoteStatus, JobFailure>,
    },
    /// The translated artifact is in hand.
    ResultReady { job_id: JobId, result: JobResult },
    /// Submission or result download failed.
    JobFailed { job_id: JobId, failure: JobFailure },
    /// A timer started by `Effect::StartTimer` elapsed.
    TimerFired { timer: TimerId },
    /// User asked to download the result again.
    DownloadClicked,
    ResultSaved { job_id: JobId, path: PathBuf },
    ResultSaveFailed { job_id: JobId, message: String },
    /// Back to idle from any phase.
    ResetRequested,
    /// The live text pane changed.
    TextEdited(String),
    TextLanguagesChanged {
        source_lang: String,
        target_lang: String,
    },
    TextTranslated {
        request_id: RequestId,
        result: Result<String, String>,
    },
    /// Fallback for placeholder wiring.
    NoOp,
}
