//! 分析会话状态机：Idle → Loading → {Success, Error}，支持手动重试与重置。
//!
//! Analysis session state.
//!
//! ```text
//!            analyze()
//!   Idle ──────────────► Loading ──► Success
//!    ▲                      │  ▲         │
//!    │ reset()              ▼  │ retry() │ reset()
//!    └──────────────────── Error ◄───────┘
//! ```
//!
//! A session admits one analysis at a time: `analyze()` while `Loading` is
//! rejected. Results arriving after `reset()` (or after a newer run took
//! over) are dropped. Dropping an `analyze()` future mid-flight returns the
//! session to `Idle`.

use crate::client::core::{AnalysisClient, AnalysisOptions};
use crate::client::error_classification::ErrorInfo;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::types::{AnalysisResult, AudioPayload};
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Idle,
    Loading,
    Success,
    Error,
}

/// Snapshot of a session for the presentation layer.
///
/// At most one of `data` / `error` is set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalysisState {
    pub is_loading: bool,
    pub data: Option<AnalysisResult>,
    pub error: Option<ErrorInfo>,
    /// Attempts so far minus one.
    pub retry_count: u32,
}

impl AnalysisState {
    pub fn status(&self) -> SessionStatus {
        if self.is_loading {
            SessionStatus::Loading
        } else if self.data.is_some() {
            SessionStatus::Success
        } else if self.error.is_some() {
            SessionStatus::Error
        } else {
            SessionStatus::Idle
        }
    }
}

#[derive(Default)]
struct Inner {
    state: AnalysisState,
    /// Bumped by every `analyze()` and `reset()`; stale runs compare against it.
    generation: u64,
    last: Option<(AudioPayload, AnalysisOptions)>,
}

/// Single-owner analysis session over a shared [`AnalysisClient`].
#[derive(Clone)]
pub struct AnalysisSession {
    client: Arc<AnalysisClient>,
    inner: Arc<Mutex<Inner>>,
}

impl AnalysisSession {
    pub fn new(client: Arc<AnalysisClient>) -> Self {
        Self {
            client,
            inner: Arc::new(Mutex::new(Inner::default())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock_inner(&self.inner)
    }

    pub fn state(&self) -> AnalysisState {
        self.lock().state.clone()
    }

    pub fn status(&self) -> SessionStatus {
        self.lock().state.status()
    }

    /// Run an analysis and settle the session in `Success` or `Error`.
    ///
    /// Fails with [`Error::Runtime`] only when another analysis is in flight;
    /// analysis failures land in the returned state's `error`.
    pub async fn analyze(
        &self,
        payload: AudioPayload,
        options: AnalysisOptions,
    ) -> Result<AnalysisState> {
        let generation = {
            let mut inner = self.lock();
            if inner.state.is_loading {
                return Err(Error::runtime_with_context(
                    "analysis already in progress",
                    ErrorContext::new().with_source("analysis_session"),
                ));
            }
            inner.generation += 1;
            inner.last = Some((payload.clone(), options.clone()));
            inner.state = AnalysisState {
                is_loading: true,
                ..Default::default()
            };
            inner.generation
        };

        let mut guard = LoadingGuard {
            inner: self.inner.clone(),
            generation,
            settled: false,
        };
        let tracker = Arc::new(RetryTracker {
            inner: self.inner.clone(),
            generation,
            forward: options.progress.clone(),
        });
        let run_options = options.with_progress(tracker);
        let outcome = self.client.analyze(&payload, &run_options).await;
        guard.settled = true;

        let mut inner = self.lock();
        if inner.generation != generation {
            debug!(generation, "discarding result of superseded analysis");
            return Ok(inner.state.clone());
        }
        inner.state.is_loading = false;
        match outcome {
            Ok(result) => inner.state.data = Some(result),
            Err(info) => inner.state.error = Some(info),
        }
        Ok(inner.state.clone())
    }

    /// Replay the last payload and options. No-op when nothing was analyzed yet.
    pub async fn retry(&self) -> Result<AnalysisState> {
        let last = self.lock().last.clone();
        match last {
            Some((payload, options)) => self.analyze(payload, options).await,
            None => Ok(self.state()),
        }
    }

    /// Back to `Idle`, forgetting the last payload. Any in-flight result is dropped.
    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.generation += 1;
        inner.state = AnalysisState::default();
        inner.last = None;
    }
}

fn lock_inner(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    // State is plain data; a panic elsewhere cannot leave it half-written.
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Clears `Loading` when an `analyze()` future is dropped before it settles,
/// so a cancelled call does not wedge the session. The last payload is kept
/// for `retry()`.
struct LoadingGuard {
    inner: Arc<Mutex<Inner>>,
    generation: u64,
    settled: bool,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut inner = lock_inner(&self.inner);
        if inner.generation == self.generation && inner.state.is_loading {
            debug!(generation = self.generation, "analysis cancelled before completion");
            inner.state = AnalysisState::default();
        }
    }
}

/// Keeps `retry_count` current, then forwards to the caller's sink.
struct RetryTracker {
    inner: Arc<Mutex<Inner>>,
    generation: u64,
    forward: Arc<dyn ProgressSink>,
}

#[async_trait]
impl ProgressSink for RetryTracker {
    async fn report(&self, event: ProgressEvent) -> Result<()> {
        if let ProgressEvent::Retrying { attempt, .. } = &event {
            let mut inner = lock_inner(&self.inner);
            if inner.generation == self.generation {
                inner.state.retry_count = attempt.saturating_sub(1);
            }
        }
        self.forward.report(event).await
    }
}
