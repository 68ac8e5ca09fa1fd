//! # voiceguard-client
//!
//! 语音真实性分析客户端：上传音频片段，判定真人语音或合成语音。
//!
//! Client runtime for a remote voice-authenticity analysis service. Submit an
//! audio clip (a picked file or a microphone recording) and get back a decision
//! (human vs. synthetic speech) with supporting scores.
//!
//! ## Overview
//!
//! The crate owns the request orchestration around a single outstanding
//! network call:
//!
//! - **Pre-flight validation**: size and media-type checks before any upload
//! - **Upload transport**: one multipart `POST` per attempt, with a timeout
//! - **Error classification**: every failure becomes an [`ErrorInfo`] with a
//!   user-facing message and a retryability verdict
//! - **Retry orchestration**: capped exponential backoff (1s, 2s, 4s, … ≤ 10s)
//! - **Session state**: `Idle → Loading → {Success, Error}` with manual
//!   retry and reset
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use voiceguard_client::{AnalysisClientBuilder, AnalysisSession, AudioPayload};
//!
//! #[tokio::main]
//! async fn main() -> voiceguard_client::Result<()> {
//!     let client = Arc::new(
//!         AnalysisClientBuilder::from_env()?
//!             .base_url("http://127.0.0.1:8000")
//!             .build()?,
//!     );
//!
//!     let clip = AudioPayload::from_path("sample.wav")?;
//!     let session = AnalysisSession::new(client.clone());
//!     let state = session.analyze(clip, client.default_options()).await?;
//!
//!     match (&state.data, &state.error) {
//!         (Some(result), _) => println!("{:?}", result.decision),
//!         (_, Some(err)) => eprintln!("{}", err.format_user_message()),
//!         _ => {}
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Client, builder, config, validation, classification, retry policy, session |
//! | [`transport`] | Upload transport trait and the reqwest implementation |
//! | [`types`] | Audio payloads and analysis results |
//! | [`progress`] | Progress events and sinks |
//! | [`error_code`] | Error kinds |

pub mod client;
pub mod error_code;
pub mod progress;
pub mod transport;
pub mod types;

// Re-export main types for convenience
pub use client::{
    AnalysisClient, AnalysisClientBuilder, AnalysisOptions, AnalysisSession, AnalysisState,
    ClientConfig, ErrorInfo, RetryPolicy, SessionStatus, ValidationError,
};
pub use error_code::ErrorKind;
pub use progress::{ProgressEvent, ProgressSink};
pub use transport::{AudioTransport, RawResponse, TransportError};
pub use types::{AnalysisResult, AudioPayload, Decision};

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
