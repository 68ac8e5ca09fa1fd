//! 传输层：单次上传音频到分析服务，带超时控制。
//!
//! Upload transport.
//!
//! A transport issues exactly one request per [`AudioTransport::send`] call;
//! repetition belongs to the orchestrator. [`HttpTransport`] is the production
//! implementation; tests substitute their own.

mod http;

pub use http::{HttpTransport, API_KEY_HEADER, FILE_FIELD, REQUEST_ID_HEADER};

use crate::types::AudioPayload;
use async_trait::async_trait;
use std::time::Duration;

/// Decoded 2xx response, not yet checked against the result schema.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub body: serde_json::Value,
    /// Correlation id sent with the request, if any.
    pub request_id: Option<String>,
}

#[async_trait]
pub trait AudioTransport: Send + Sync {
    /// Upload `payload` once, giving up after `timeout`.
    async fn send(
        &self,
        payload: &AudioPayload,
        timeout: Duration,
    ) -> Result<RawResponse, TransportError>;
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The service could not be reached at all.
    #[error("Cannot connect to analysis service: {0}")]
    Connect(String),

    #[error("Analysis request timed out after {}ms", .after.as_millis())]
    Timeout { after: Duration },

    #[error("HTTP {status}: {status_text}{}", format_body(.body))]
    Http {
        status: u16,
        status_text: String,
        body: String,
    },

    /// 2xx status but the body is not JSON.
    #[error("Invalid response JSON: {0}")]
    Decode(String),

    #[error("Transport error: {0}")]
    Other(String),
}

fn format_body(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(" - {}", body)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            // reqwest does not expose the configured duration
            TransportError::Timeout {
                after: Duration::ZERO,
            }
        } else if e.is_connect() {
            TransportError::Connect(e.to_string())
        } else if e.is_decode() {
            TransportError::Decode(e.to_string())
        } else if e.is_request() || has_io_source(&e) {
            // reset or closed by the peer before a response arrived
            TransportError::Connect(describe_chain(&e))
        } else {
            TransportError::Other(e.to_string())
        }
    }
}

fn has_io_source(e: &reqwest::Error) -> bool {
    let mut source = std::error::Error::source(e);
    while let Some(err) = source {
        if err.is::<std::io::Error>() {
            return true;
        }
        source = err.source();
    }
    false
}

/// `error sending request for url (...): connection reset by peer`
fn describe_chain(e: &reqwest::Error) -> String {
    let mut text = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(err) = source {
        text.push_str(": ");
        text.push_str(&err.to_string());
        source = err.source();
    }
    text
}
