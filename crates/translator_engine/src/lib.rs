//! Translator engine: HTTP client, timers and effect execution.
mod client;
mod disposition;
mod engine;
mod filename;
mod persist;
mod response;
mod timer;
mod types;

pub use client::{ReqwestService, ServiceSettings, TranslationService};
pub use disposition::ContentDisposition;
pub use engine::{EngineConfig, EngineError, EngineHandle};
pub use filename::{fallback_filename, resolve_filename, sanitize_filename};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use response::{error_message, INVALID_RESPONSE_MESSAGE};
pub use types::{
    Artifact, EngineEvent, FailureKind, JobId, RequestId, ServiceError, StatusReport,
    SubmitOutcome, TextRequest, TimerId, UploadFile,
};
