//! 核心进度类型：ProgressSink trait、进度事件与空实现（始终编译）。
//!
//! Core progress types.
//!
//! The orchestrator reports every stage of an analysis to a [`ProgressSink`].
//! Reporting is fire-and-forget: a sink error never changes the outcome.

use crate::client::error_classification::ErrorInfo;
use crate::Result;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

/// A stage of one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// Payload passed validation.
    Preparing,
    /// A retry is about to wait `delay_ms` after `error`. Emitted once per retry.
    Retrying {
        attempt: u32,
        delay_ms: u64,
        error: ErrorInfo,
    },
    Uploading {
        attempt: u32,
    },
    /// Response received; checking it against the result schema.
    Processing,
    Complete,
}

impl ProgressEvent {
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Preparing => "preparing",
            Self::Retrying { .. } => "retrying",
            Self::Uploading { .. } => "uploading",
            Self::Processing => "processing",
            Self::Complete => "complete",
        }
    }

    /// Status line suitable for a progress indicator.
    pub fn describe(&self) -> String {
        match self {
            Self::Preparing => "Preparing audio for analysis...".to_string(),
            Self::Retrying { attempt, .. } => format!("Retrying analysis (attempt {})...", attempt),
            Self::Uploading { .. } => "Uploading audio to analysis service...".to_string(),
            Self::Processing => "Processing analysis results...".to_string(),
            Self::Complete => "Analysis complete".to_string(),
        }
    }
}

#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn report(&self, event: ProgressEvent) -> Result<()>;
}

/// Default sink; drops everything.
pub struct NoopProgressSink;

#[async_trait]
impl ProgressSink for NoopProgressSink {
    async fn report(&self, _event: ProgressEvent) -> Result<()> {
        Ok(())
    }
}

pub fn noop_sink() -> Arc<dyn ProgressSink> {
    Arc::new(NoopProgressSink)
}
