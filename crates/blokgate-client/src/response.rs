//! Response interpretation.
//!
//! Error bodies are interpreted by an explicit chain with one typed outcome
//! per tier:
//!
//! 1. [`ErrorBody::Structured`]: JSON object with a string `message`
//! 2. [`ErrorBody::Text`]: any other readable, non-blank body
//! 3. [`ErrorBody::Unreadable`]: nothing usable, so only the status line
//!    is reported
//!
//! Success bodies must be JSON. A success status with a body that is not
//! JSON, or JSON of the wrong shape, is a decode error.

use blokgate_core::{Error, Result};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Outcome of interpreting a non-success response body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorBody {
    /// The body was JSON carrying a `message`.
    Structured(String),
    /// The body was readable text.
    Text(String),
    /// The body could not be read or was empty.
    Unreadable,
}

impl ErrorBody {
    /// Run the chain over a body that may have failed to read.
    pub fn interpret(body: Option<&[u8]>) -> Self {
        let Some(bytes) = body else {
            return Self::Unreadable;
        };
        if let Some(message) = structured_message(bytes) {
            return Self::Structured(message);
        }
        match readable_text(bytes) {
            Some(text) => Self::Text(text),
            None => Self::Unreadable,
        }
    }

    /// The detail to append to the status line, if any.
    pub fn into_detail(self) -> Option<String> {
        match self {
            Self::Structured(message) | Self::Text(message) => Some(message),
            Self::Unreadable => None,
        }
    }
}

fn structured_message(bytes: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(bytes).ok()?;
    value
        .get("message")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

fn readable_text(bytes: &[u8]) -> Option<String> {
    std::str::from_utf8(bytes)
        .ok()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Status line such as `404 Not Found`.
pub fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {}", status.as_u16(), reason),
        None => status.as_u16().to_string(),
    }
}

/// Build the API error for a non-success response.
pub fn api_error(status: StatusCode, body: Option<&[u8]>) -> Error {
    let detail = ErrorBody::interpret(body).into_detail();
    Error::api(status.as_u16(), status_line(status), detail)
}

/// Decode a success body into `T`.
///
/// `204 No Content` with an empty body decodes as JSON `null`.
pub fn decode_success<T: DeserializeOwned>(status: StatusCode, bytes: &[u8]) -> Result<T> {
    let value = if status == StatusCode::NO_CONTENT && bytes.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(bytes)
            .map_err(|e| Error::decode(format!("body is not valid JSON ({e})")))?
    };
    serde_json::from_value(value).map_err(|e| Error::decode(format!("unexpected body shape ({e})")))
}

/// A transport error with every underlying cause, outermost first.
///
/// reqwest's own message names only the URL; refused connections, DNS and
/// TLS failures live further down the source chain.
pub fn transport_reason(err: &reqwest::Error) -> String {
    let mut reason = err.to_string();
    let mut cause = std::error::Error::source(err);
    while let Some(inner) = cause {
        let text = inner.to_string();
        if !reason.contains(&text) {
            reason.push_str(": ");
            reason.push_str(&text);
        }
        cause = inner.source();
    }
    reason
}

/// Read a response to completion and classify it.
pub async fn read_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response.bytes().await;

    if !status.is_success() {
        let body = body.ok();
        return Err(api_error(status, body.as_deref()));
    }

    let bytes = body.map_err(|e| {
        let what = format!("failed to read response body: {}", transport_reason(&e));
        Error::network_with_source(what, e)
    })?;
    decode_success(status, &bytes)
}
