//! Translator core: pure job-tracking state machine and view-model helpers.
mod effect;
mod failure;
pub mod languages;
mod msg;
pub mod progress;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use failure::{FailureKind, JobFailure};
pub use msg::{Msg, RemoteStatus};
pub use progress::{advance_estimate, ProgressEstimate};
pub use state::{
    DownloadStatus, JobId, JobResult, JobStatus, RequestId, SourceFile, TimerId, TrackerPhase,
    TrackerSettings, TrackerState, TrackingMode, TranslationJob,
};
pub use update::update;
pub use view_model::{ProgressView, TextPaneView, TrackerViewModel};
