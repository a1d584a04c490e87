use std::fs;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use translator_engine::{
    EngineConfig, EngineEvent, EngineHandle, ReqwestService, ServiceSettings, SubmitOutcome,
    TextRequest, UploadFile,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn wait_for(engine: &EngineHandle, timeout: Duration) -> Option<EngineEvent> {
    engine.recv_timeout(timeout)
}

fn engine_for(server: &MockServer, output: &TempDir) -> EngineHandle {
    EngineHandle::new(EngineConfig {
        service: ServiceSettings {
            base_url: server.uri(),
            ..ServiceSettings::default()
        },
        output_dir: output.path().to_path_buf(),
    })
    .expect("engine starts")
}

#[test]
fn timer_fires_once() {
    let output = TempDir::new().unwrap();
    let service = Arc::new(ReqwestService::new(ServiceSettings::default()).unwrap());
    let engine = EngineHandle::with_service(service, output.path().to_path_buf()).unwrap();

    let started = Instant::now();
    engine.start_timer(4, Duration::from_millis(50));
    assert_eq!(
        wait_for(&engine, Duration::from_secs(2)),
        Some(EngineEvent::TimerFired { timer: 4 })
    );
    assert!(started.elapsed() >= Duration::from_millis(50));
    assert_eq!(wait_for(&engine, Duration::from_millis(150)), None);
}

#[test]
fn cancelled_timer_is_silent() {
    let output = TempDir::new().unwrap();
    let service = Arc::new(ReqwestService::new(ServiceSettings::default()).unwrap());
    let engine = EngineHandle::with_service(service, output.path().to_path_buf()).unwrap();

    engine.start_timer(1, Duration::from_millis(60));
    engine.cancel_timer(1);
    engine.start_timer(2, Duration::from_millis(80));
    assert_eq!(
        wait_for(&engine, Duration::from_secs(2)),
        Some(EngineEvent::TimerFired { timer: 2 })
    );
    assert_eq!(wait_for(&engine, Duration::from_millis(150)), None);
}

#[tokio::test(flavor = "multi_thread")]
async fn submit_and_save_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/translate-file"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"translated".to_vec(), "application/octet-stream")
                .insert_header("content-disposition", r#"attachment; filename="result.docx""#),
        )
        .mount(&server)
        .await;

    let output = TempDir::new().unwrap();
    let events = tokio::task::spawn_blocking({
        let uri = server.uri();
        let dir = output.path().to_path_buf();
        move || {
            let engine = EngineHandle::new(EngineConfig {
                service: ServiceSettings {
                    base_url: uri,
                    ..ServiceSettings::default()
                },
                output_dir: dir,
            })
            .unwrap();
            engine.submit_file(
                3,
                UploadFile {
                    name: "report.pdf".to_string(),
                    payload: Bytes::from_static(b"pdf"),
                },
                "auto",
                "Arabic",
            );
            let submitted = engine.recv_timeout(Duration::from_secs(5));
            engine.save_result(3, "result.docx", Bytes::from_static(b"translated"));
            let saved = engine.recv_timeout(Duration::from_secs(5));
            (submitted, saved)
        }
    })
    .await
    .unwrap();

    match events.0 {
        Some(EngineEvent::Submitted {
            job_id: 3,
            result: Ok(SubmitOutcome::Artifact(artifact)),
        }) => assert_eq!(artifact.filename, "result.docx"),
        other => panic!("unexpected event {other:?}"),
    }
    let expected = output.path().join("result.docx");
    assert_eq!(
        events.1,
        Some(EngineEvent::ResultSaved {
            job_id: 3,
            result: Ok(expected.clone()),
        })
    );
    assert_eq!(fs::read(expected).unwrap(), b"translated");
}

#[tokio::test(flavor = "multi_thread")]
async fn text_request_reports_back_with_its_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/translate-text"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"translated_text": "Bonjour"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let output = TempDir::new().unwrap();
    let engine = engine_for(&server, &output);
    let event = tokio::task::spawn_blocking(move || {
        engine.translate_text(
            9,
            TextRequest {
                text: "Hello".to_string(),
                source_lang: "English".to_string(),
                target_lang: "French".to_string(),
            },
        );
        engine.recv_timeout(Duration::from_secs(5))
    })
    .await
    .unwrap();

    assert_eq!(
        event,
        Some(EngineEvent::TextTranslated {
            request_id: 9,
            result: Ok("Bonjour".to_string()),
        })
    );
}

#[test]
fn save_with_unsafe_name_reports_failure() {
    let output = TempDir::new().unwrap();
    let service = Arc::new(ReqwestService::new(ServiceSettings::default()).unwrap());
    let engine = EngineHandle::with_service(service, output.path().to_path_buf()).unwrap();

    engine.save_result(1, "../escape.docx", Bytes::from_static(b"x"));
    match engine.recv_timeout(Duration::from_secs(2)) {
        Some(EngineEvent::ResultSaved {
            job_id: 1,
            result: Err(message),
        }) => assert!(message.contains("escape.docx"), "{message}"),
        other => panic!("unexpected event {other:?}"),
    }
}
