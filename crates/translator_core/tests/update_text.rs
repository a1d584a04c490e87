use std::sync::Once;
use std::time::Duration;

use pretty_assertions::assert_eq;
use translator_core::{update, Effect, Msg, TrackerState};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(translator_logging::initialize_for_tests);
}

const DEBOUNCE: Duration = Duration::from_millis(500);

#[test]
fn translation_waits_for_debounce_window() {
    init_logging();
    let (state, effects) = update(TrackerState::default(), Msg::TextEdited("hello".into()));

    // Editing alone never issues a request.
    assert_eq!(
        effects,
        vec![Effect::StartTimer {
            timer: 1,
            after: DEBOUNCE
        }]
    );
    assert!(state.has_pending_debounce());

    let (state, effects) = update(state, Msg::TimerFired { timer: 1 });
    assert_eq!(
        effects,
        vec![Effect::TranslateText {
            request_id: 1,
            text: "hello".to_string(),
            source_lang: "auto".to_string(),
            target_lang: "Arabic".to_string(),
        }]
    );
    assert!(state.view().text.translating);
    assert!(!state.has_pending_debounce());
}

#[test]
fn each_edit_restarts_the_window() {
    init_logging();
    let (state, _) = update(TrackerState::default(), Msg::TextEdited("hel".into()));
    let (state, effects) = update(state, Msg::TextEdited("hello".into()));
    assert_eq!(
        effects,
        vec![
            Effect::CancelTimer { timer: 1 },
            Effect::StartTimer {
                timer: 2,
                after: DEBOUNCE
            },
        ]
    );

    // The superseded timer firing late is ignored.
    let (state, effects) = update(state, Msg::TimerFired { timer: 1 });
    assert!(effects.is_empty());

    let (_state, effects) = update(state, Msg::TimerFired { timer: 2 });
    assert_eq!(effects.len(), 1);
    assert!(matches!(
        &effects[0],
        Effect::TranslateText { text, .. } if text == "hello"
    ));
}

#[test]
fn blank_text_clears_output_without_request() {
    init_logging();
    let (state, _) = update(TrackerState::default(), Msg::TextEdited("hi".into()));
    let (state, _) = update(state, Msg::TimerFired { timer: 1 });
    let (state, _) = update(
        state,
        Msg::TextTranslated {
            request_id: 1,
            result: Ok("مرحبا".into()),
        },
    );
    assert_eq!(state.text_output(), "مرحبا");

    let (state, _) = update(state, Msg::TextEdited("   \n".into()));
    let (state, effects) = update(state, Msg::TimerFired { timer: 2 });
    assert!(effects.is_empty());
    assert_eq!(state.text_output(), "");
}

#[test]
fn text_is_trimmed_and_languages_follow_selection() {
    init_logging();
    let (state, _) = update(
        TrackerState::default(),
        Msg::TextLanguagesChanged {
            source_lang: "English".into(),
            target_lang: "French".into(),
        },
    );
    let (state, _) = update(state, Msg::TextEdited("  good morning \n".into()));
    let (_state, effects) = update(state, Msg::TimerFired { timer: 1 });
    assert_eq!(
        effects,
        vec![Effect::TranslateText {
            request_id: 1,
            text: "good morning".to_string(),
            source_lang: "English".to_string(),
            target_lang: "French".to_string(),
        }]
    );
}

#[test]
fn only_latest_response_is_applied() {
    init_logging();
    let (state, _) = update(TrackerState::default(), Msg::TextEdited("one".into()));
    let (state, _) = update(state, Msg::TimerFired { timer: 1 });
    let (state, _) = update(state, Msg::TextEdited("two".into()));
    let (state, _) = update(state, Msg::TimerFired { timer: 2 });

    let (state, _) = update(
        state,
        Msg::TextTranslated {
            request_id: 1,
            result: Ok("uno".into()),
        },
    );
    assert_eq!(state.text_output(), "");

    let (state, _) = update(
        state,
        Msg::TextTranslated {
            request_id: 2,
            result: Err("Server error".into()),
        },
    );
    assert_eq!(state.text_output(), "Error: Server error");
    assert!(!state.view().text.translating);
}

#[test]
fn text_pane_survives_file_reset() {
    init_logging();
    let (state, _) = update(TrackerState::default(), Msg::TextEdited("hello".into()));
    let (state, effects) = update(state, Msg::ResetRequested);
    assert!(effects.is_empty());
    assert!(state.has_pending_debounce());
}
