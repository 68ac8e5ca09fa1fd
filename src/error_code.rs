//! 错误分类码：分析失败的六种类别及其默认语义。
//!
//! Error kinds for analysis failures.
//!
//! Every failure that reaches the presentation layer is tagged with exactly one
//! [`ErrorKind`]. The kind drives the call-to-action shown to the user and, for
//! most kinds, the default retry behavior.
//!
//! | Kind         | Meaning                                   | Default retryable |
//! |--------------|-------------------------------------------|-------------------|
//! | `network`    | Service unreachable or request timed out  | yes               |
//! | `api`        | Non-2xx status from the service           | depends on status |
//! | `validation` | The input must change before resubmitting | no                |
//! | `processing` | The service failed while analyzing        | yes               |
//! | `response`   | The service answered with malformed data  | yes               |
//! | `unknown`    | Catch-all                                 | yes               |
//!
//! ## Example
//!
//! ```rust
//! use voiceguard_client::error_code::ErrorKind;
//!
//! let kind = ErrorKind::from_http_status(413);
//! assert_eq!(kind, ErrorKind::Validation);
//! assert_eq!(kind.name(), "validation");
//! assert!(!kind.default_retryable());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Category of a classified analysis failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Connectivity failure or timeout
    Network,
    /// Service-side rejection identified by HTTP status
    Api,
    /// Input rejected, either pre-flight or by the service
    Validation,
    /// Service failed while processing the audio
    Processing,
    /// Response body missing fields or malformed
    Response,
    /// Could not be classified
    Unknown,
}

impl ErrorKind {
    /// Returns the lowercase name (e.g., `"network"`).
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Api => "api",
            Self::Validation => "validation",
            Self::Processing => "processing",
            Self::Response => "response",
            Self::Unknown => "unknown",
        }
    }

    /// Returns whether failures of this kind are retryable when nothing more
    /// specific is known. `Api` is status-dependent; its default here is the
    /// "other status" row of the classification table.
    #[inline]
    pub fn default_retryable(&self) -> bool {
        !matches!(self, Self::Validation)
    }

    /// Maps an HTTP status code to its error kind.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 | 413 | 415 => Self::Validation,
            500 => Self::Processing,
            _ => Self::Api,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
