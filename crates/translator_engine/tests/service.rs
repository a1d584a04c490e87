use bytes::Bytes;
use pretty_assertions::assert_eq;
use translator_engine::{
    FailureKind, ReqwestService, ServiceSettings, SubmitOutcome, TextRequest, TranslationService,
    UploadFile, INVALID_RESPONSE_MESSAGE,
};
use wiremock::matchers::{body_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

fn service_for(server: &MockServer) -> ReqwestService {
    ReqwestService::new(ServiceSettings {
        base_url: server.uri(),
        ..ServiceSettings::default()
    })
    .unwrap()
}

fn upload(name: &str) -> UploadFile {
    UploadFile {
        name: name.to_string(),
        payload: Bytes::from_static(b"%PDF-1.4 fake"),
    }
}

#[tokio::test]
async fn blocking_upload_returns_named_artifact() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/translate-file"))
        .and(body_string_contains("name=\"source_lang\""))
        .and(body_string_contains("Arabic"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"translated".to_vec(), DOCX_MIME)
                .insert_header("content-disposition", r#"attachment; filename="result.docx""#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let outcome = service_for(&server)
        .submit_file(&upload("report.pdf"), "auto", "Arabic")
        .await
        .expect("upload ok");

    match outcome {
        SubmitOutcome::Artifact(artifact) => {
            assert_eq!(artifact.filename, "result.docx");
            assert_eq!(artifact.payload, Bytes::from_static(b"translated"));
        }
        other => panic!("expected an artifact, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_disposition_synthesizes_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/translate-file"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(b"x".to_vec(), DOCX_MIME))
        .mount(&server)
        .await;

    let outcome = service_for(&server)
        .submit_file(&upload("report.pdf"), "auto", "Arabic")
        .await
        .unwrap();
    let SubmitOutcome::Artifact(artifact) = outcome else {
        panic!("expected an artifact");
    };
    assert_eq!(artifact.filename, "translated_report.docx");
}

#[tokio::test]
async fn json_upload_reply_is_a_job() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/translate-file"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"job_id": "j-17"})),
        )
        .mount(&server)
        .await;

    let outcome = service_for(&server)
        .submit_file(&upload("slides.pptx"), "English", "French")
        .await
        .unwrap();
    assert_eq!(
        outcome,
        SubmitOutcome::Accepted {
            remote_id: "j-17".to_string()
        }
    );
}

#[tokio::test]
async fn upload_error_uses_json_error_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/translate-file"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({"error": "Unsupported file type"})),
        )
        .mount(&server)
        .await;

    let err = service_for(&server)
        .submit_file(&upload("notes.txt"), "auto", "Arabic")
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(400));
    assert_eq!(err.message, "Unsupported file type");
}

#[tokio::test]
async fn html_error_page_gets_generic_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/translate-file"))
        .respond_with(
            ResponseTemplate::new(502)
                .set_body_raw(b"<html>Bad Gateway</html>".to_vec(), "text/html"),
        )
        .mount(&server)
        .await;

    let err = service_for(&server)
        .submit_file(&upload("report.pdf"), "auto", "Arabic")
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(502));
    assert_eq!(err.message, INVALID_RESPONSE_MESSAGE);
}

#[tokio::test]
async fn job_id_body_is_a_job_whatever_the_content_type() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/translate-file"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(br#"{"job_id":"abc"}"#.to_vec(), "text/plain"),
        )
        .mount(&server)
        .await;

    let outcome = service_for(&server)
        .submit_file(&upload("a.docx"), "auto", "Arabic")
        .await
        .unwrap();
    assert_eq!(
        outcome,
        SubmitOutcome::Accepted {
            remote_id: "abc".to_string()
        }
    );
}

#[tokio::test]
async fn json_body_without_job_id_is_an_artifact() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/translate-file"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .mount(&server)
        .await;

    let outcome = service_for(&server)
        .submit_file(&upload("report.pdf"), "auto", "Arabic")
        .await
        .unwrap();
    match outcome {
        SubmitOutcome::Artifact(artifact) => {
            assert_eq!(artifact.filename, "translated_report.docx");
            assert_eq!(artifact.payload, Bytes::from_static(br#"{"ok":true}"#));
        }
        other => panic!("expected an artifact, got {other:?}"),
    }
}

#[tokio::test]
async fn oversized_error_body_gets_generic_message() {
    let server = MockServer::start().await;
    let padding = "x".repeat(128 * 1024);
    Mock::given(method("POST"))
        .and(path("/translate-file"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(serde_json::json!({"error": "disk full", "trace": padding})),
        )
        .mount(&server)
        .await;

    let err = service_for(&server)
        .submit_file(&upload("report.pdf"), "auto", "Arabic")
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(500));
    assert_eq!(err.message, INVALID_RESPONSE_MESSAGE);
}

#[tokio::test]
async fn status_reports_pass_through() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/done"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "complete"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status/broken"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"status": "error", "error": "disk full"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status/busy"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ocr"})),
        )
        .mount(&server)
        .await;

    let service = service_for(&server);
    let done = service.job_status("done").await.unwrap();
    assert_eq!(done.status, "complete");
    assert_eq!(done.error, None);

    let broken = service.job_status("broken").await.unwrap();
    assert_eq!(broken.status, "error");
    assert_eq!(broken.error.as_deref(), Some("disk full"));

    let busy = service.job_status("busy").await.unwrap();
    assert_eq!(busy.status, "ocr");
}

#[tokio::test]
async fn status_body_that_is_not_json_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status/x"))
        .respond_with(ResponseTemplate::new(200).set_body_string("maybe"))
        .mount(&server)
        .await;

    let err = service_for(&server).job_status("x").await.unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidResponse);
    assert_eq!(err.message, INVALID_RESPONSE_MESSAGE);
}

#[tokio::test]
async fn download_resolves_filename() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download/j-1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"deck".to_vec(), "application/octet-stream")
                .insert_header(
                    "content-disposition",
                    "attachment; filename*=UTF-8''%D8%B4%D8%B1%D8%A7%D8%A6%D8%AD.pptx",
                ),
        )
        .mount(&server)
        .await;

    let artifact = service_for(&server)
        .download("j-1", "slides.pptx")
        .await
        .unwrap();
    assert_eq!(artifact.filename, "شرائح.pptx");
    assert_eq!(artifact.payload, Bytes::from_static(b"deck"));
}

#[tokio::test]
async fn oversized_download_is_refused() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/download/big"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 2048], DOCX_MIME))
        .mount(&server)
        .await;

    let service = ReqwestService::new(ServiceSettings {
        base_url: server.uri(),
        max_download_bytes: 1024,
        ..ServiceSettings::default()
    })
    .unwrap();
    let err = service.download("big", "a.docx").await.unwrap_err();
    assert!(matches!(err.kind, FailureKind::TooLarge { max_bytes: 1024, .. }));
}

#[tokio::test]
async fn text_translation_sends_exact_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/translate-text"))
        .and(body_json(serde_json::json!({
            "text": "hello",
            "source_lang": "auto",
            "target_lang": "Arabic"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"translated_text": "مرحبا"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let text = service_for(&server)
        .translate_text(&TextRequest {
            text: "hello".to_string(),
            source_lang: "auto".to_string(),
            target_lang: "Arabic".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(text, "مرحبا");
}

#[tokio::test]
async fn text_translation_error_field_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/translate-text"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(serde_json::json!({"error": "model unavailable"})),
        )
        .mount(&server)
        .await;

    let err = service_for(&server)
        .translate_text(&TextRequest {
            text: "hi".to_string(),
            source_lang: "auto".to_string(),
            target_lang: "German".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(500));
    assert_eq!(err.message, "model unavailable");
}

#[tokio::test]
async fn unreachable_server_is_a_network_failure() {
    let service = ReqwestService::new(ServiceSettings {
        base_url: "http://127.0.0.1:9".to_string(),
        ..ServiceSettings::default()
    })
    .unwrap();
    let err = service.job_status("x").await.unwrap_err();
    assert!(err.kind.is_transport(), "unexpected kind {:?}", err.kind);
}
