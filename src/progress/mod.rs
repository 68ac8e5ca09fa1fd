//! 进度模块：分析过程的阶段事件与多种事件接收器。
//!
//! Progress reporting.
//!
//! Replaces per-call progress/retry callbacks with an observer the
//! presentation layer plugs in through [`crate::AnalysisOptions`].
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`ProgressEvent`] | Stage of an analysis run |
//! | [`ProgressSink`] | Trait for event destinations |
//! | [`NoopProgressSink`] | Default no-op sink |
//! | [`InMemoryProgressSink`] | Collects events, for testing |
//! | [`TracingProgressSink`] | Emits events as `tracing` records |
//! | [`ChannelProgressSink`] | Forwards events over a tokio channel |
//! | [`CompositeProgressSink`] | Multi-destination composite sink |

mod event;

pub use event::{noop_sink, NoopProgressSink, ProgressEvent, ProgressSink};

use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// In-memory sink for testing.
pub struct InMemoryProgressSink {
    events: Arc<RwLock<Vec<ProgressEvent>>>,
    max_events: usize,
}

impl InMemoryProgressSink {
    pub fn new(max: usize) -> Self {
        Self {
            events: Arc::new(RwLock::new(Vec::new())),
            max_events: max,
        }
    }

    pub fn get_events(&self) -> Vec<ProgressEvent> {
        self.events
            .read()
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    /// Stage names in arrival order.
    pub fn stages(&self) -> Vec<&'static str> {
        self.get_events().iter().map(|e| e.stage()).collect()
    }

    pub fn retry_count(&self) -> usize {
        self.get_events()
            .iter()
            .filter(|e| matches!(e, ProgressEvent::Retrying { .. }))
            .count()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.write() {
            events.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.events.read().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemoryProgressSink {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[async_trait]
impl ProgressSink for InMemoryProgressSink {
    async fn report(&self, event: ProgressEvent) -> Result<()> {
        let mut events = self.events.write().map_err(|_| {
            Error::runtime_with_context(
                "progress sink poisoned",
                ErrorContext::new().with_source("in_memory_progress_sink"),
            )
        })?;
        events.push(event);
        if events.len() > self.max_events {
            events.remove(0);
        }
        Ok(())
    }
}

/// Logs each event through `tracing`.
pub struct TracingProgressSink {
    label: String,
}

impl TracingProgressSink {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }
}

impl Default for TracingProgressSink {
    fn default() -> Self {
        Self::new("analysis")
    }
}

#[async_trait]
impl ProgressSink for TracingProgressSink {
    async fn report(&self, event: ProgressEvent) -> Result<()> {
        match &event {
            ProgressEvent::Retrying {
                attempt,
                delay_ms,
                error,
            } => warn!(
                label = self.label.as_str(),
                attempt,
                delay_ms,
                kind = %error.kind,
                "{}",
                event.describe()
            ),
            _ => info!(
                label = self.label.as_str(),
                stage = event.stage(),
                "{}",
                event.describe()
            ),
        }
        Ok(())
    }
}

/// Forwards events to an unbounded tokio channel, so reporting never blocks.
pub struct ChannelProgressSink {
    tx: mpsc::UnboundedSender<ProgressEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::UnboundedSender<ProgressEvent>) -> Self {
        Self { tx }
    }

    /// A sink plus the receiver the presentation layer drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ProgressEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl ProgressSink for ChannelProgressSink {
    async fn report(&self, event: ProgressEvent) -> Result<()> {
        self.tx.send(event).map_err(|_| {
            Error::runtime_with_context(
                "progress receiver dropped",
                ErrorContext::new().with_source("channel_progress_sink"),
            )
        })
    }
}

/// Composite sink for multiple destinations.
pub struct CompositeProgressSink {
    sinks: Vec<Arc<dyn ProgressSink>>,
}

impl CompositeProgressSink {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn add_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl Default for CompositeProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProgressSink for CompositeProgressSink {
    async fn report(&self, event: ProgressEvent) -> Result<()> {
        for s in &self.sinks {
            let _ = s.report(event.clone()).await;
        }
        Ok(())
    }
}
