use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use translator_core::{
    update, DownloadStatus, Msg, SourceFile, TrackerPhase, TrackerSettings, TrackerState,
    TrackerViewModel,
};
use translator_logging::{translator_debug, translator_info};

use super::config::ClientConfig;
use super::effects::EffectRunner;
use super::render::{text_line, ProgressRenderer};

const PUMP_INTERVAL: Duration = Duration::from_millis(100);

/// Owns the tracker state; the only place it is mutated.
struct App {
    state: TrackerState,
    runner: EffectRunner,
}

impl App {
    fn new(settings: TrackerSettings, runner: EffectRunner) -> Self {
        Self {
            state: TrackerState::new(settings),
            runner,
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        self.runner.enqueue(effects);
    }

    /// Applies the next engine event, if one arrives within `timeout`.
    fn pump(&mut self, timeout: Duration) {
        if let Some(msg) = self.runner.next_msg(timeout) {
            self.dispatch(msg);
        }
    }

    fn take_view(&mut self) -> Option<TrackerViewModel> {
        let view = self.state.view();
        self.state.consume_dirty().then_some(view)
    }
}

/// Uploads `path`, follows the job and saves the translation. Returns the saved path.
pub fn translate_file(config: &ClientConfig, path: &Path) -> Result<PathBuf> {
    let (source_lang, target_lang) = config.languages()?;
    let payload = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} is not a file", path.display()))?;

    let runner = EffectRunner::new(config.engine_config()).context("starting engine")?;
    let mut app = App::new(config.tracker_settings(), runner);
    let mut renderer = ProgressRenderer::new();

    translator_info!("Translating {} ({} -> {})", name, source_lang, target_lang);
    app.dispatch(Msg::FileSelected(SourceFile::new(name, payload)));
    app.dispatch(Msg::SubmitRequested {
        source_lang: source_lang.to_string(),
        target_lang: target_lang.to_string(),
    });

    loop {
        if let Some(view) = app.take_view() {
            renderer.render(&view);
            if let Some(outcome) = file_outcome(&view) {
                renderer.finish();
                return outcome.map_err(|message| anyhow!(message));
            }
        }
        app.pump(PUMP_INTERVAL);
    }
}

/// Terminal result of a file run, once there is one.
fn file_outcome(view: &TrackerViewModel) -> Option<Result<PathBuf, String>> {
    match view.phase {
        TrackerPhase::Idle => view.validation_error.clone().map(Err),
        TrackerPhase::Failed => Some(Err(view
            .error
            .clone()
            .unwrap_or_else(|| "Translation failed.".to_string()))),
        TrackerPhase::Complete => match &view.download {
            Some(DownloadStatus::Saved(path)) => Some(Ok(path.clone())),
            Some(DownloadStatus::Failed(message)) => {
                Some(Err(format!("Could not save the translated file: {message}")))
            }
            _ => None,
        },
        TrackerPhase::Submitted | TrackerPhase::Processing => None,
    }
}

/// Live text pane over stdin: every line replaces the pane's text.
pub fn live_text(config: &ClientConfig) -> Result<()> {
    let (source_lang, target_lang) = config.languages()?;
    let runner = EffectRunner::new(config.engine_config()).context("starting engine")?;
    let mut app = App::new(config.tracker_settings(), runner);
    app.dispatch(Msg::TextLanguagesChanged {
        source_lang: source_lang.to_string(),
        target_lang: target_lang.to_string(),
    });

    let lines = spawn_line_reader();
    let mut input_open = true;
    let mut last_line: Option<String> = None;

    loop {
        loop {
            match lines.try_recv() {
                Ok(line) => app.dispatch(Msg::TextEdited(line)),
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    input_open = false;
                    break;
                }
            }
        }

        let view = app.take_view();
        if let Some(line) = view.as_ref().and_then(|view| text_line(&view.text)) {
            if last_line.as_deref() != Some(line.as_str()) {
                println!("{line}");
                last_line = Some(line);
            }
        }

        if !input_open {
            let idle = !app.state.has_pending_debounce() && !app.state.view().text.translating;
            if idle {
                translator_debug!("Input closed and nothing pending; leaving text mode");
                return Ok(());
            }
        }
        app.pump(PUMP_INTERVAL);
    }
}

fn spawn_line_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Prints the language catalog.
pub fn print_languages() -> Result<()> {
    use std::io::Write;

    let mut out = io::stdout().lock();
    writeln!(out, "{:<24} {}", "auto", "Auto-Detect (source only)")?;
    for lang in translator_core::languages::LANGUAGES {
        writeln!(out, "{:<24} {}", lang.code, lang.name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use translator_core::ProgressView;

    fn view(phase: TrackerPhase) -> TrackerViewModel {
        TrackerViewModel {
            phase,
            ..TrackerViewModel::default()
        }
    }

    #[test]
    fn in_flight_jobs_have_no_outcome() {
        assert_eq!(file_outcome(&view(TrackerPhase::Submitted)), None);
        let mut processing = view(TrackerPhase::Processing);
        processing.progress = Some(ProgressView {
            percent: Some(40.0),
            label: "Processing... 40%".to_string(),
            detail: "~6s remaining".to_string(),
        });
        assert_eq!(file_outcome(&processing), None);
    }

    #[test]
    fn completion_waits_for_the_save() {
        let mut complete = view(TrackerPhase::Complete);
        complete.download = Some(DownloadStatus::Saving);
        assert_eq!(file_outcome(&complete), None);

        complete.download = Some(DownloadStatus::Saved(PathBuf::from("out/result.docx")));
        assert_eq!(
            file_outcome(&complete),
            Some(Ok(PathBuf::from("out/result.docx")))
        );

        complete.download = Some(DownloadStatus::Failed("disk full".to_string()));
        assert_eq!(
            file_outcome(&complete),
            Some(Err("Could not save the translated file: disk full".to_string()))
        );
    }

    #[test]
    fn failures_and_validation_end_the_run() {
        let mut failed = view(TrackerPhase::Failed);
        failed.error = Some("Unsupported file type".to_string());
        assert_eq!(
            file_outcome(&failed),
            Some(Err("Unsupported file type".to_string()))
        );

        let mut idle = view(TrackerPhase::Idle);
        assert_eq!(file_outcome(&idle), None);
        idle.validation_error = Some("The selected file \"a.pdf\" is empty.".to_string());
        assert_eq!(
            file_outcome(&idle),
            Some(Err("The selected file \"a.pdf\" is empty.".to_string()))
        );
    }
}
