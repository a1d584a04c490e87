use std::fmt;
use std::path::PathBuf;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

pub type JobId = u64;
pub type TimerId = u64;
pub type RequestId = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub name: String,
    pub payload: Bytes,
}

/// A translated document and the name it should be saved under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub payload: Bytes,
    pub filename: String,
}

/// How the service answered a file upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Blocking variant: the response body is the translated file.
    Artifact(Artifact),
    /// Job variant: poll `/status/{remote_id}` for progress.
    Accepted { remote_id: String },
}

/// Body of `GET /status/{job_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StatusReport {
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
}

/// Body of `POST /translate-text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextRequest {
    pub text: String,
    pub source_lang: String,
    pub target_lang: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    Submitted {
        job_id: JobId,
        result: Result<SubmitOutcome, ServiceError>,
    },
    StatusPolled {
        job_id: JobId,
        result: Result<StatusReport, ServiceError>,
    },
    ResultFetched {
        job_id: JobId,
        result: Result<Artifact, ServiceError>,
    },
    ResultSaved {
        job_id: JobId,
        result: Result<PathBuf, String>,
    },
    TextTranslated {
        request_id: RequestId,
        result: Result<String, ServiceError>,
    },
    TimerFired {
        timer: TimerId,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ServiceError {
    pub kind: FailureKind,
    pub message: String,
}

impl ServiceError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    InvalidResponse,
    Network,
}

impl FailureKind {
    /// Whether the request never produced a usable HTTP exchange.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            FailureKind::InvalidUrl
                | FailureKind::Timeout
                | FailureKind::RedirectLimitExceeded
                | FailureKind::Network
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::InvalidResponse => write!(f, "invalid response"),
            FailureKind::Network => write!(f, "network error"),
        }
    }
}
