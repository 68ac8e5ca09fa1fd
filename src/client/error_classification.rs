//! Error classification logic.
//!
//! Turns raw transport, schema and validation failures into an [`ErrorInfo`]
//! carrying a user-facing message and a retryability verdict. Variants are
//! checked in a fixed order: connectivity, timeout, HTTP status, response
//! schema, pre-flight validation, anything else.

use crate::client::validation::ValidationError;
use crate::error_code::ErrorKind;
use crate::transport::TransportError;
use crate::types::SchemaError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

const RETRY_SUFFIX: &str = " You can try again or contact support if the problem persists.";
const CHECK_INPUT_SUFFIX: &str = " Please check your input and try again.";

/// A classified analysis failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("{user_message}")]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    /// Raw technical message.
    pub message: String,
    pub user_message: String,
    pub retryable: bool,
    pub should_log: bool,
    /// HTTP status, when the failure came from a response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorInfo {
    fn new(kind: ErrorKind, message: impl Into<String>, user_message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            user_message: user_message.into(),
            retryable: kind.default_retryable(),
            should_log: true,
            status: None,
        }
    }

    fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// User message followed by a call to action matching retryability.
    pub fn format_user_message(&self) -> String {
        let suffix = if self.retryable {
            RETRY_SUFFIX
        } else {
            CHECK_INPUT_SUFFIX
        };
        format!("{}{}", self.user_message, suffix)
    }

    /// Record this error with a timestamp and context, unless it is an
    /// expected user error (`should_log == false`).
    pub fn log(&self, context: &str) -> Option<ErrorRecord> {
        if !self.should_log {
            return None;
        }
        let record = ErrorRecord {
            timestamp: Utc::now(),
            context: context.to_string(),
            info: self.clone(),
        };
        error!(
            timestamp = %record.timestamp.to_rfc3339(),
            context,
            kind = %self.kind,
            retryable = self.retryable,
            status = ?self.status,
            message = self.message.as_str(),
            "audio analysis error"
        );
        Some(record)
    }
}

/// A logged [`ErrorInfo`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    pub timestamp: DateTime<Utc>,
    pub context: String,
    pub info: ErrorInfo,
}

/// Anything that can go wrong between picking a clip and holding a result.
#[derive(Debug)]
pub enum Failure {
    Transport(TransportError),
    Response(SchemaError),
    Validation(ValidationError),
    Other(String),
}

impl From<TransportError> for Failure {
    fn from(e: TransportError) -> Self {
        Failure::Transport(e)
    }
}

impl From<SchemaError> for Failure {
    fn from(e: SchemaError) -> Self {
        Failure::Response(e)
    }
}

impl From<ValidationError> for Failure {
    fn from(e: ValidationError) -> Self {
        Failure::Validation(e)
    }
}

/// Map a failure to its [`ErrorInfo`].
pub fn classify(failure: &Failure) -> ErrorInfo {
    match failure {
        Failure::Transport(TransportError::Connect(msg)) => ErrorInfo::new(
            ErrorKind::Network,
            msg.clone(),
            "Unable to connect to analysis service. Please check your connection and try again.",
        ),
        Failure::Transport(e @ TransportError::Timeout { .. }) => ErrorInfo::new(
            ErrorKind::Network,
            e.to_string(),
            "Analysis is taking longer than expected. Please try with a shorter audio clip.",
        ),
        Failure::Transport(e @ TransportError::Http { status, .. }) => {
            classify_status(*status, e.to_string())
        }
        Failure::Transport(TransportError::Decode(msg)) => ErrorInfo::new(
            ErrorKind::Response,
            msg.clone(),
            "Analysis service returned invalid data. Please try again.",
        ),
        Failure::Response(e) => {
            let user_message = match e {
                SchemaError::MissingField(_) => {
                    "Analysis response is incomplete. Please retry the analysis."
                }
                _ => "Analysis service returned unexpected data format.",
            };
            ErrorInfo::new(ErrorKind::Response, e.to_string(), user_message)
        }
        Failure::Validation(e) => {
            // already user-facing
            let mut info = ErrorInfo::new(ErrorKind::Validation, e.to_string(), e.to_string());
            info.should_log = false;
            info
        }
        Failure::Transport(TransportError::Other(msg)) | Failure::Other(msg) => ErrorInfo::new(
            ErrorKind::Unknown,
            msg.clone(),
            "An unexpected error occurred during analysis. Please try again.",
        ),
    }
}

fn classify_status(status: u16, message: String) -> ErrorInfo {
    let (user_message, retryable) = match status {
        400 => (
            "Invalid audio file format. Please use MP3 or WAV files.".to_string(),
            false,
        ),
        401 => (
            "Authentication failed. Please verify your credentials.".to_string(),
            false,
        ),
        403 => ("Access denied. Please contact support.".to_string(), false),
        404 => (
            "Analysis service not found. Please contact support.".to_string(),
            false,
        ),
        413 => (
            "Audio file is too large. Maximum size is 10MB.".to_string(),
            false,
        ),
        415 => (
            "Unsupported audio format. Please use MP3 or WAV files.".to_string(),
            false,
        ),
        429 => (
            "Too many requests. Please wait a moment and try again.".to_string(),
            true,
        ),
        500 => (
            "Analysis failed due to a processing error. Please try again.".to_string(),
            true,
        ),
        502 | 503 | 504 => (
            "Analysis service is temporarily unavailable. Please try again later.".to_string(),
            true,
        ),
        other => (
            format!("Analysis failed with error {}. Please try again.", other),
            true,
        ),
    };
    let mut info = ErrorInfo::new(ErrorKind::from_http_status(status), message, user_message)
        .with_retryable(retryable);
    info.status = Some(status);
    info
}
