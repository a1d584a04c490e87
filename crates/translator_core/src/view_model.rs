use crate::{DownloadStatus, JobId, TrackerPhase};

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressView {
    /// `None` when only coarse server states are known.
    pub percent: Option<f64>,
    pub label: String,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextPaneView {
    pub output: String,
    pub translating: bool,
    pub source_lang: String,
    pub target_lang: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackerViewModel {
    pub phase: TrackerPhase,
    pub selected_file: Option<String>,
    pub job_id: Option<JobId>,
    pub remote_status: Option<String>,
    pub progress: Option<ProgressView>,
    pub validation_error: Option<String>,
    pub error: Option<String>,
    pub result_filename: Option<String>,
    pub download: Option<DownloadStatus>,
    pub can_submit: bool,
    pub can_download: bool,
    pub text: TextPaneView,
    pub dirty: bool,
}
