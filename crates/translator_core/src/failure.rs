use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Caller-level input problem; no request was issued.
    Validation,
    Transport,
    Server { status: u16 },
    MalformedResponse,
    /// The server reported `status: error` for the job.
    Job,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Validation => write!(f, "validation error"),
            FailureKind::Transport => write!(f, "network error"),
            FailureKind::Server { status } => write!(f, "server error (http {status})"),
            FailureKind::MalformedResponse => write!(f, "malformed response"),
            FailureKind::Job => write!(f, "job error"),
        }
    }
}

/// A terminal failure, carried as one human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl JobFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Validation, message)
    }
}

impl fmt::Display for JobFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}
