use std::time::Duration;

use reqwest::header::CONTENT_DISPOSITION;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, Url};
use serde::Deserialize;
use serde_json::Value;
use translator_logging::{translator_debug, translator_info};

use crate::filename::resolve_filename;
use crate::response::{ensure_success, invalid_response, map_reqwest_error, read_limited};
use crate::{
    Artifact, FailureKind, ServiceError, StatusReport, SubmitOutcome, TextRequest, UploadFile,
};

const UPLOAD_BASE_SECS: f64 = 10.0;
const UPLOAD_SECS_PER_MIB: f64 = 15.0;

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    /// Covers the whole exchange; the blocking upload waits for the full translation.
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_download_bytes: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(600),
            redirect_limit: 5,
            max_download_bytes: 200 * 1024 * 1024,
        }
    }
}

/// The remote translation service.
#[async_trait::async_trait]
pub trait TranslationService: Send + Sync {
    /// `POST /translate-file`.
    async fn submit_file(
        &self,
        file: &UploadFile,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<SubmitOutcome, ServiceError>;

    /// `GET /status/{remote_id}`.
    async fn job_status(&self, remote_id: &str) -> Result<StatusReport, ServiceError>;

    /// `GET /download/{remote_id}`.
    async fn download(&self, remote_id: &str, original_name: &str)
        -> Result<Artifact, ServiceError>;

    /// `POST /translate-text`.
    async fn translate_text(&self, request: &TextRequest) -> Result<String, ServiceError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestService {
    settings: ServiceSettings,
    base_url: Url,
    client: reqwest::Client,
}

impl ReqwestService {
    pub fn new(settings: ServiceSettings) -> Result<Self, ServiceError> {
        let base_url = Url::parse(&settings.base_url)
            .map_err(|err| ServiceError::new(FailureKind::InvalidUrl, err.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(ServiceError::new(
                FailureKind::InvalidUrl,
                format!("{} cannot be used as a server address", settings.base_url),
            ));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(reqwest::redirect::Policy::limited(settings.redirect_limit))
            .build()
            .map_err(|err| ServiceError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            settings,
            base_url,
            client,
        })
    }

    /// The blocking upload waits for the whole translation, so large files get
    /// twice the expected processing time when that exceeds `request_timeout`.
    fn upload_timeout(&self, size_bytes: u64) -> Duration {
        let mib = size_bytes as f64 / (1024.0 * 1024.0);
        let expected = Duration::from_secs_f64(UPLOAD_BASE_SECS + UPLOAD_SECS_PER_MIB * mib);
        self.settings.request_timeout.max(expected * 2)
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ServiceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ServiceError::new(FailureKind::InvalidUrl, "server url cannot be a base")
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn read_artifact(
        &self,
        response: Response,
        original_name: &str,
    ) -> Result<Artifact, ServiceError> {
        let disposition = header_value(&response, CONTENT_DISPOSITION);
        let payload = read_limited(response, self.settings.max_download_bytes).await?;
        Ok(Artifact {
            payload,
            filename: resolve_filename(disposition.as_deref(), original_name),
        })
    }
}

#[async_trait::async_trait]
impl TranslationService for ReqwestService {
    async fn submit_file(
        &self,
        file: &UploadFile,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<SubmitOutcome, ServiceError> {
        let url = self.endpoint(&["translate-file"])?;
        translator_debug!("POST {} file={} bytes={}", url, file.name, file.payload.len());
        let part = Part::bytes(file.payload.to_vec()).file_name(file.name.clone());
        let form = Form::new()
            .part("file", part)
            .text("source_lang", source_lang.to_string())
            .text("target_lang", target_lang.to_string());

        let response = self
            .client
            .post(url)
            .timeout(self.upload_timeout(file.payload.len() as u64))
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        let disposition = header_value(&response, CONTENT_DISPOSITION);
        let payload = read_limited(response, self.settings.max_download_bytes).await?;

        // A body carrying `job_id` is an accepted job whatever its content type.
        if let Some(remote_id) = parse_job_id(&payload) {
            translator_info!("{} accepted as job {}", file.name, remote_id);
            return Ok(SubmitOutcome::Accepted { remote_id });
        }

        let artifact = Artifact {
            filename: resolve_filename(disposition.as_deref(), &file.name),
            payload,
        };
        translator_info!(
            "{} translated into {} ({} bytes)",
            file.name,
            artifact.filename,
            artifact.payload.len()
        );
        Ok(SubmitOutcome::Artifact(artifact))
    }

    async fn job_status(&self, remote_id: &str) -> Result<StatusReport, ServiceError> {
        let url = self.endpoint(&["status", remote_id])?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        let report: StatusReport =
            serde_json::from_slice(&body).map_err(|_| invalid_response())?;
        translator_debug!("job {} status={}", remote_id, report.status);
        Ok(report)
    }

    async fn download(
        &self,
        remote_id: &str,
        original_name: &str,
    ) -> Result<Artifact, ServiceError> {
        let url = self.endpoint(&["download", remote_id])?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        self.read_artifact(response, original_name).await
    }

    async fn translate_text(&self, request: &TextRequest) -> Result<String, ServiceError> {
        let url = self.endpoint(&["translate-text"])?;
        let response = self
            .client
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        let reply: TextReply = serde_json::from_slice(&body).map_err(|_| invalid_response())?;
        match reply {
            TextReply {
                translated_text: Some(text),
                ..
            } => Ok(text),
            TextReply {
                error: Some(message),
                ..
            } => Err(ServiceError::new(FailureKind::InvalidResponse, message)),
            _ => Err(invalid_response()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TextReply {
    #[serde(default)]
    translated_text: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

fn header_value(response: &Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned)
}

/// `{"job_id": "..."}`; numeric ids are accepted too.
fn parse_job_id(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    match value.get("job_id")? {
        Value::String(id) if !id.trim().is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}
