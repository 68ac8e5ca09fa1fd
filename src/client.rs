//! Analysis client: pre-flight validation, retry orchestration and session state.
//!
//! Developer-friendly goal: keep the public surface small and predictable.
//! Implementation details are split into submodules under `src/client/`.

pub mod builder;
pub mod config;
pub mod core;
pub mod error_classification;
pub mod policy;
pub mod session;
pub mod validation;

pub use builder::AnalysisClientBuilder;
pub use config::ClientConfig;
pub use core::{AnalysisClient, AnalysisOptions};
pub use error_classification::{classify, ErrorInfo, ErrorRecord, Failure};
pub use policy::{RetryDecision, RetryPolicy};
pub use session::{AnalysisSession, AnalysisState, SessionStatus};
pub use validation::{AudioValidator, ValidationError, ValidatorConfig, SUPPORTED_MEDIA_TYPES};
