use futures_util::StreamExt;
use reqwest::Response;
use serde_json::Value;

use crate::{FailureKind, ServiceError};

/// Shown when an error body is not JSON, e.g. an HTML page from a reverse proxy.
pub const INVALID_RESPONSE_MESSAGE: &str =
    "Server returned an invalid response. Please try again.";

/// Error bodies longer than this are not parsed.
const MAX_ERROR_BODY_BYTES: u64 = 64 * 1024;

/// Human-readable message for a non-success response body.
///
/// Prefers the JSON `error` field; JSON without one falls back to the status
/// code, and a body that is not JSON at all gets the generic message.
pub fn error_message(status: u16, body: &[u8]) -> String {
    match serde_json::from_slice::<Value>(body) {
        Ok(value) => value
            .get("error")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .map(ToOwned::to_owned)
            .unwrap_or_else(|| format!("HTTP error! status: {status}")),
        Err(_) => INVALID_RESPONSE_MESSAGE.to_string(),
    }
}

/// Passes successful responses through and turns the rest into `HttpStatus` errors.
pub(crate) async fn ensure_success(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = read_limited(response, MAX_ERROR_BODY_BYTES)
        .await
        .unwrap_or_default();
    Err(ServiceError::new(
        FailureKind::HttpStatus(status.as_u16()),
        error_message(status.as_u16(), &body),
    ))
}

pub(crate) fn invalid_response() -> ServiceError {
    ServiceError::new(FailureKind::InvalidResponse, INVALID_RESPONSE_MESSAGE)
}

/// Reads the body, refusing to buffer more than `max_bytes`.
pub(crate) async fn read_limited(
    response: Response,
    max_bytes: u64,
) -> Result<bytes::Bytes, ServiceError> {
    if let Some(content_len) = response.content_length() {
        if content_len > max_bytes {
            return Err(too_large(max_bytes, Some(content_len)));
        }
    }
    let mut body = Vec::new();
    let mut stream = response.bytes_stream();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(map_reqwest_error)?;
        let next_len = body.len() as u64 + chunk.len() as u64;
        if next_len > max_bytes {
            return Err(too_large(max_bytes, Some(next_len)));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body.into())
}

fn too_large(max_bytes: u64, actual: Option<u64>) -> ServiceError {
    ServiceError::new(
        FailureKind::TooLarge { max_bytes, actual },
        "translated file is too large",
    )
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> ServiceError {
    if err.is_timeout() {
        return ServiceError::new(FailureKind::Timeout, format!("request timed out: {err}"));
    }
    if err.is_redirect() {
        return ServiceError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    ServiceError::new(FailureKind::Network, format!("network error: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_error_field_wins() {
        assert_eq!(error_message(500, br#"{"error":"disk full"}"#), "disk full");
    }

    #[test]
    fn json_without_error_field_reports_status() {
        assert_eq!(error_message(502, br#"{"detail":"x"}"#), "HTTP error! status: 502");
        assert_eq!(error_message(400, br#"{"error":"  "}"#), "HTTP error! status: 400");
    }

    #[test]
    fn non_json_body_is_masked() {
        assert_eq!(
            error_message(504, b"<html><body>Gateway Timeout</body></html>"),
            INVALID_RESPONSE_MESSAGE
        );
        assert_eq!(error_message(500, b""), INVALID_RESPONSE_MESSAGE);
    }
}
