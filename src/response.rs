// ABOUTME: Turns raw HTTP responses into success payloads or taxonomy errors
// ABOUTME: Handles no-content, success-coded failures, malformed bodies and error message extraction

use crate::error::{mentions_not_running, ApiErrorInfo, Error, Result};
use crate::util::truncate_str;
use reqwest::StatusCode;
use serde_json::{json, Map, Value};
use tracing::{debug, error, warn};

pub const NO_CONTENT_MESSAGE: &str = "Operation successful (No Content)";
pub const PARSING_ISSUE_STATUS: &str = "success_with_parsing_issue";
pub const PARSING_ISSUE_MESSAGE: &str = "Operation successful (Non-JSON or malformed JSON response)";

const UNKNOWN_SUCCESS_ERROR: &str = "Unknown error in successful HTTP response.";
const UNREADABLE_BODY: &str = "Unknown error reading response.";
const UNKNOWN_API_ERROR: &str = "Unknown API error";

/// A fully read response. `body` is `None` when reading the body failed.
#[derive(Debug, Clone)]
pub(crate) struct RawResponse {
    pub status: StatusCode,
    pub content_type: Option<String>,
    pub body: Option<Vec<u8>>,
}

impl RawResponse {
    pub async fn read(response: reqwest::Response) -> Self {
        let status = response.status();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = match response.bytes().await {
            Ok(bytes) => Some(bytes.to_vec()),
            Err(e) => {
                warn!(status = %status, error = %e, "Failed to read response body");
                None
            }
        };

        RawResponse {
            status,
            content_type,
            body,
        }
    }

    fn text(&self) -> Option<String> {
        self.body
            .as_deref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .and_then(|ct| ct.split(';').next())
            .map(|mime| mime.trim().eq_ignore_ascii_case("application/json"))
            .unwrap_or(false)
    }
}

/// The fixed marker returned for 204 and empty-bodied responses.
pub fn no_content() -> Value {
    json!({ "status": "success", "message": NO_CONTENT_MESSAGE })
}

/// Produces the outcome of a 2xx response.
pub(crate) fn parse_success(raw: &RawResponse, path: &str) -> Result<Value> {
    debug!(path = %path, status = %raw.status, "API request successful");

    if raw.status == StatusCode::NO_CONTENT || matches!(raw.body.as_deref(), Some([])) {
        return Ok(no_content());
    }

    // Decode regardless of the declared content type; servers mislabel JSON.
    let decoded = raw
        .body
        .as_deref()
        .map(serde_json::from_slice::<Value>);

    match decoded {
        Some(Ok(Value::Object(body))) if is_error_status(&body) => {
            let message = body
                .get("message")
                .filter(|m| !m.is_null())
                .map(render_value)
                .unwrap_or_else(|| UNKNOWN_SUCCESS_ERROR.to_string());
            error!(path = %path, message = %message, "API success status but error in JSON body");

            let info = ApiErrorInfo::new(message)
                .with_status(raw.status.as_u16())
                .with_data(Value::Object(body));
            if mentions_not_running(&info.message) {
                Err(Error::ServerNotRunning(info))
            } else {
                Err(Error::Api(info))
            }
        }
        Some(Ok(value)) => Ok(value),
        Some(Err(e)) => {
            warn!(path = %path, status = %raw.status, error = %e, "Successful API response not valid JSON");
            Ok(degraded(raw.text().unwrap_or_default()))
        }
        None => {
            warn!(path = %path, status = %raw.status, "Successful API response body could not be read");
            Ok(degraded(String::new()))
        }
    }
}

fn is_error_status(body: &Map<String, Value>) -> bool {
    body.get("status").and_then(Value::as_str) == Some("error")
}

fn degraded(raw_response: String) -> Value {
    json!({
        "status": PARSING_ISSUE_STATUS,
        "message": PARSING_ISSUE_MESSAGE,
        "raw_response": raw_response,
    })
}

/// Derives a human readable message and the structured error data from a
/// non-2xx response.
pub(crate) fn extract_error(raw: &RawResponse) -> (String, Value) {
    let reason = raw.status.canonical_reason();
    let text = raw.text();

    let data: Map<String, Value> = match &text {
        None => raw_error(reason.unwrap_or(UNREADABLE_BODY)),
        Some(text) if raw.is_json() => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => map,
            Ok(other) => {
                let mut map = Map::new();
                map.insert("raw_error".into(), other);
                map
            }
            Err(e) => {
                warn!(error = %e, body = %truncate_str(text, 200), "Could not parse error response JSON");
                if text.is_empty() {
                    raw_error(reason.unwrap_or(UNREADABLE_BODY))
                } else {
                    raw_error(text)
                }
            }
        },
        Some(text) => raw_error(text),
    };

    // First key present wins, even when its value is empty.
    let mut message = ["detail", "message", "error"]
        .iter()
        .find_map(|key| data.get(*key))
        .map(render_value)
        .unwrap_or_default();

    if message.is_empty() {
        message = match data.get("errors") {
            Some(Value::Object(errors)) => errors
                .iter()
                .map(|(k, v)| format!("{}: {}", k, render_value(v)))
                .collect::<Vec<_>>()
                .join("; "),
            _ => data.get("raw_error").map(render_value).unwrap_or_default(),
        };
    }

    if message.is_empty() {
        message = reason.unwrap_or(UNKNOWN_API_ERROR).to_string();
    }

    (message, Value::Object(data))
}

/// Builds the taxonomy error for a non-2xx response.
pub(crate) fn error_from_response(raw: &RawResponse, path: &str) -> Error {
    let (message, data) = extract_error(raw);
    let err = Error::from_response(raw.status.as_u16(), message, Some(data), path);
    error!(path = %path, status = %raw.status, error = %err, "API request failed");
    err
}

fn raw_error(text: &str) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("raw_error".into(), Value::String(text.to_string()));
    map
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(status: u16, content_type: Option<&str>, body: &str) -> RawResponse {
        RawResponse {
            status: StatusCode::from_u16(status).unwrap(),
            content_type: content_type.map(str::to_string),
            body: Some(body.as_bytes().to_vec()),
        }
    }

    const JSON: Option<&str> = Some("application/json");

    #[test]
    fn test_no_content_marker() {
        assert_eq!(parse_success(&raw(204, None, ""), "/x").unwrap(), no_content());
        assert_eq!(parse_success(&raw(200, JSON, ""), "/x").unwrap(), no_content());
        assert_eq!(
            parse_success(&raw(204, None, ""), "/x").unwrap()["message"],
            "Operation successful (No Content)"
        );
    }

    #[test]
    fn test_json_object_and_list_pass_through() {
        let value = parse_success(&raw(200, JSON, r#"{"status":"success","n":1}"#), "/x").unwrap();
        assert_eq!(value["n"], 1);

        let value = parse_success(&raw(200, JSON, r#"["a","b"]"#), "/x").unwrap();
        assert_eq!(value, json!(["a", "b"]));
    }

    #[test]
    fn test_mislabelled_json_still_decoded() {
        let value = parse_success(&raw(200, Some("text/html"), r#"{"ok":true}"#), "/x").unwrap();
        assert_eq!(value["ok"], true);
    }

    #[test]
    fn test_success_coded_failure() {
        let err = parse_success(
            &raw(200, JSON, r#"{"status":"error","message":"Backup failed"}"#),
            "/server/x/backup/action",
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Api);
        assert_eq!(err.message(), "Backup failed");
        assert_eq!(err.status(), Some(200));
    }

    #[test]
    fn test_success_coded_not_running() {
        let err = parse_success(
            &raw(200, JSON, r#"{"status":"error","message":"Server 'x' is not running"}"#),
            "/server/x/stop",
        )
        .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::ServerNotRunning);
        assert_eq!(err.message(), "Server 'x' is not running");
    }

    #[test]
    fn test_success_coded_failure_without_message() {
        let err = parse_success(&raw(200, JSON, r#"{"status":"error"}"#), "/x").unwrap_err();
        assert_eq!(err.message(), "Unknown error in successful HTTP response.");

        let err = parse_success(&raw(200, JSON, r#"{"status":"error","message":null}"#), "/x")
            .unwrap_err();
        assert_eq!(err.message(), "Unknown error in successful HTTP response.");
    }

    #[test]
    fn test_success_coded_failure_keeps_empty_message() {
        let err = parse_success(&raw(200, JSON, r#"{"status":"error","message":""}"#), "/x")
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Api);
        assert_eq!(err.message(), "");
    }

    #[test]
    fn test_degraded_success_keeps_raw_text() {
        let value = parse_success(&raw(200, Some("text/plain"), "Started OK"), "/x").unwrap();
        assert_eq!(value["status"], PARSING_ISSUE_STATUS);
        assert_eq!(value["raw_response"], "Started OK");

        let value = parse_success(&raw(200, JSON, "{not json"), "/x").unwrap();
        assert_eq!(value["raw_response"], "{not json");
    }

    #[test]
    fn test_unreadable_body_is_degraded() {
        let response = RawResponse {
            status: StatusCode::OK,
            content_type: None,
            body: None,
        };
        let value = parse_success(&response, "/x").unwrap();
        assert_eq!(value["status"], PARSING_ISSUE_STATUS);
    }

    #[test]
    fn test_extract_prefers_detail_then_message_then_error() {
        let (msg, _) = extract_error(&raw(400, JSON, r#"{"detail":"d","message":"m","error":"e"}"#));
        assert_eq!(msg, "d");
        let (msg, _) = extract_error(&raw(400, JSON, r#"{"message":"m","error":"e"}"#));
        assert_eq!(msg, "m");
        let (msg, _) = extract_error(&raw(400, JSON, r#"{"error":"e"}"#));
        assert_eq!(msg, "e");
    }

    #[test]
    fn test_extract_structured_detail_is_serialized() {
        let (msg, data) = extract_error(&raw(
            422,
            JSON,
            r#"{"detail":[{"loc":["body","name"],"msg":"field required"}]}"#,
        ));
        assert!(msg.contains("field required"));
        assert!(data["detail"].is_array());
    }

    #[test]
    fn test_extract_errors_mapping() {
        let (msg, _) = extract_error(&raw(
            400,
            JSON,
            r#"{"errors":{"level-name":"invalid","max-players":"too large"}}"#,
        ));
        assert_eq!(msg, "level-name: invalid; max-players: too large");
    }

    #[test]
    fn test_extract_non_json_falls_back_to_text() {
        let (msg, data) = extract_error(&raw(500, Some("text/plain"), "Internal kaboom"));
        assert_eq!(msg, "Internal kaboom");
        assert_eq!(data["raw_error"], "Internal kaboom");
    }

    #[test]
    fn test_extract_empty_body_falls_back_to_reason() {
        let (msg, _) = extract_error(&raw(503, Some("text/plain"), ""));
        assert_eq!(msg, "Service Unavailable");

        let (msg, _) = extract_error(&raw(599, None, ""));
        assert_eq!(msg, "Unknown API error");
    }

    #[test]
    fn test_extract_json_array_body() {
        let (msg, data) = extract_error(&raw(400, JSON, r#"["bad"]"#));
        assert_eq!(msg, r#"["bad"]"#);
        assert_eq!(data["raw_error"], json!(["bad"]));
    }

    #[test]
    fn test_error_from_response_classifies() {
        let err = error_from_response(
            &raw(404, JSON, r#"{"detail":"server not found"}"#),
            "/server/ghost/status",
        );
        assert_eq!(err.kind(), crate::ErrorKind::ServerNotFound);
        assert_eq!(err.message(), "server not found");
    }
}
