#![allow(dead_code)]

use std::sync::Once;

use translator_core::{
    update, Effect, JobId, Msg, SourceFile, TimerId, TrackerSettings, TrackerState, TrackingMode,
};

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(translator_logging::initialize_for_tests);
}

pub fn tracker(mode: TrackingMode) -> TrackerState {
    TrackerState::new(TrackerSettings {
        mode,
        ..TrackerSettings::default()
    })
}

pub fn sample_file(name: &str, len: usize) -> SourceFile {
    SourceFile::new(name, vec![b'x'; len])
}

pub fn submit_file(state: TrackerState, file: SourceFile) -> (TrackerState, Vec<Effect>) {
    let (state, _) = update(state, Msg::FileSelected(file));
    update(
        state,
        Msg::SubmitRequested {
            source_lang: "auto".to_string(),
            target_lang: "Arabic".to_string(),
        },
    )
}

pub fn submitted_job(effects: &[Effect]) -> JobId {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::SubmitFile { job_id, .. } => Some(*job_id),
            _ => None,
        })
        .expect("submit effect")
}

pub fn started_timer(effects: &[Effect]) -> TimerId {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::StartTimer { timer, .. } => Some(*timer),
            _ => None,
        })
        .expect("start timer effect")
}

pub fn count_started_timers(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|effect| matches!(effect, Effect::StartTimer { .. }))
        .count()
}
