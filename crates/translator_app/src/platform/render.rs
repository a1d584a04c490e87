use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use translator_core::{TextPaneView, TrackerViewModel};

const BAR_TEMPLATE: &str = "{spinner:.green} [{bar:40.cyan/blue}] {pos:>3}% {msg}";
const SPINNER_TEMPLATE: &str = "{spinner:.green} {msg}";

/// Terminal progress display for one file job.
pub struct ProgressRenderer {
    bar: ProgressBar,
    determinate: Option<bool>,
}

impl ProgressRenderer {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        bar.enable_steady_tick(Duration::from_millis(120));
        Self {
            bar,
            determinate: None,
        }
    }

    pub fn render(&mut self, view: &TrackerViewModel) {
        let Some(progress) = &view.progress else {
            return;
        };
        let determinate = progress.percent.is_some();
        if self.determinate != Some(determinate) {
            self.bar.set_style(style(if determinate {
                BAR_TEMPLATE
            } else {
                SPINNER_TEMPLATE
            }));
            self.determinate = Some(determinate);
        }
        if let Some(percent) = progress.percent {
            self.bar.set_position(percent.round().clamp(0.0, 100.0) as u64);
        }
        if progress.detail.is_empty() {
            self.bar.set_message(progress.label.clone());
        } else {
            self.bar
                .set_message(format!("{} ({})", progress.label, progress.detail));
        }
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

fn style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template)
        .map(|style| style.progress_chars("#>-"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// One line per change of the live text pane.
pub fn text_line(view: &TextPaneView) -> Option<String> {
    if view.translating {
        Some("Translating...".to_string())
    } else if view.output.is_empty() {
        None
    } else {
        Some(view.output.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::text_line;
    use translator_core::TextPaneView;

    #[test]
    fn text_pane_lines() {
        let mut view = TextPaneView {
            translating: true,
            ..TextPaneView::default()
        };
        assert_eq!(text_line(&view).as_deref(), Some("Translating..."));
        view.translating = false;
        assert_eq!(text_line(&view), None);
        view.output = "Error: model unavailable".to_string();
        assert_eq!(text_line(&view).as_deref(), Some("Error: model unavailable"));
    }
}
