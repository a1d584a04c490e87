use std::time::Duration;

use crate::{JobId, JobResult, RequestId, SourceFile, TimerId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SubmitFile {
        job_id: JobId,
        file: SourceFile,
        source_lang: String,
        target_lang: String,
    },
    StartTimer { timer: TimerId, after: Duration },
    CancelTimer { timer: TimerId },
    PollStatus { job_id: JobId, remote_id: String },
    FetchResult {
        job_id: JobId,
        remote_id: String,
        original_name: String,
    },
    SaveResult { job_id: JobId, result: JobResult },
    TranslateText {
        request_id: RequestId,
        text: String,
        source_lang: String,
        target_lang: String,
    },
}
